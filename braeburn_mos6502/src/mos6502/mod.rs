mod addressing_mode;
mod bus;
mod disassembler;
mod error;
mod instruction;
mod interrupt;
mod microcode;
mod opcode;
mod operations;
mod pump;
mod state;
mod status;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use pump::Pump;
use state::State;

pub use addressing_mode::AddressingMode;
pub use bus::{Bus, BusRequest, BusResponse, Control, RamBus64kb};
pub use disassembler::disassemble;
pub use error::Error;
pub use instruction::Instruction;
pub use interrupt::{IRQ_VECTOR_ADDRESS, NMI_VECTOR_ADDRESS, RESET_VECTOR_ADDRESS};
pub use opcode::Opcode;
pub use state::Registers;
pub use status::{Status, StatusFlag};

pub type Result<A> = std::result::Result<A, Error>;

pub type Address = u16;

/// `MOS6502` emulates the MOS Technology 6502 microprocessor one bus cycle
/// at a time.
///
/// The host drives it in a loop: every [`tick`](MOS6502::tick) consumes the
/// previous cycle's [`BusResponse`] and produces the next [`BusRequest`],
/// which the host services against its memory map before the next tick. The
/// order and content of those requests — including the chip's documented
/// spurious reads — is the observable contract, cycle for cycle.
///
/// Decimal mode is not implemented: like the NES's 2A03, this core expects
/// the `D` flag to stay clear through arithmetic.
pub struct MOS6502 {
    state: State,
    pump: Pump,

    /// Total ticks since power-on, including wait-state ticks.
    ticks: u64,

    /// The request most recently handed to the host, re-issued verbatim when
    /// the host answers with `ready = false`.
    last_request: BusRequest,

    /// Host hook for the conventional self-loop halt (branch-to-self or
    /// jump-to-self). Execution continues unless the host stops ticking.
    trap_handler: Option<Box<dyn FnMut(Address)>>,
}

impl MOS6502 {
    /// A CPU with an idle pump: the first tick issues a SYNC read at `pc`.
    ///
    /// Hosts that model the hardware's power-on behaviour call
    /// [`reset`](MOS6502::reset) next; test harnesses that seed `pc` and
    /// start executing directly skip it.
    pub fn new() -> MOS6502 {
        MOS6502 {
            state: State::new(),
            pump: Pump::new(),
            ticks: 0,
            last_request: BusRequest::default(),
            trap_handler: None,
        }
    }

    /// Execute one clock cycle.
    ///
    /// Fails only when the opcode byte delivered for a SYNC read has no entry
    /// in the decode table.
    pub fn tick(&mut self, response: BusResponse) -> Result<BusRequest> {
        self.ticks += 1;

        // A not-ready host holds the CPU: same request again next tick.
        if !response.ready {
            return Ok(self.last_request);
        }

        let request = self.pump.tick(&mut self.state, response)?;
        self.last_request = request;

        if let Some(pc) = self.state.trap.take() {
            if let Some(handler) = self.trap_handler.as_mut() {
                handler(pc);
            }
        }

        Ok(request)
    }

    /// Simulate the `reset` input: the next seven ticks run the documented
    /// reset sequence (two reads at `pc`, three stack accesses with writes
    /// suppressed, the `0xFFFC`/`0xFFFD` vector), and the tick after that
    /// fetches from the vector target with `I` set.
    pub fn reset(&mut self) {
        self.state.clear_scratch();
        self.pump.reset();
    }

    /// The visible register file.
    pub fn registers(&self) -> &Registers {
        &self.state.registers
    }

    /// Mutable access for hosts that seed state directly (conformance
    /// harnesses, machines that load the vector themselves).
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.state.registers
    }

    /// Monotonic cycle counter since power-on.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Cycles since the current instruction was decoded.
    pub fn cycles_since_fetch(&self) -> u8 {
        self.pump.cycles_since_fetch()
    }

    /// Install the self-loop trap hook. The hook receives the trapped
    /// instruction's address.
    pub fn set_trap_handler(&mut self, handler: impl FnMut(Address) + 'static) {
        self.trap_handler = Some(Box::new(handler));
    }

    /// Drive the level-triggered IRQ input. The line is sampled at the last
    /// cycle of each instruction and masked by the `I` flag.
    pub fn set_irq(&mut self, asserted: bool) {
        self.state.irq_line = asserted;
    }

    /// Drive the edge-triggered NMI input: a 0→1 transition latches one
    /// non-maskable interrupt, taken at the next instruction boundary.
    pub fn set_nmi(&mut self, asserted: bool) {
        if asserted && !self.state.nmi_line {
            self.state.nmi_pending = true;
        }
        self.state.nmi_line = asserted;
    }
}

impl Default for MOS6502 {
    fn default() -> MOS6502 {
        MOS6502::new()
    }
}

impl fmt::Debug for MOS6502 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MOS6502")
            .field("registers", &self.state.registers)
            .field("ticks", &self.ticks)
            .field("last_request", &self.last_request)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::testing::Machine;
    use super::*;

    /// `LDA #$42` from `PC = $0000`: SYNC read at `$0000`, operand read at
    /// `$0001`, and the next SYNC lands on `$0002` with the load complete.
    #[test]
    pub fn lda_immediate_cycle_trace() {
        let mut machine = Machine::with_program(0x0000, &[0xA9, 0x42]);

        let trace = machine.step();
        assert_eq!(
            trace,
            vec![BusRequest::fetch(0x0000), BusRequest::read(0x0001)]
        );

        assert_eq!(machine.cpu.registers().a, 0x42);
        assert!(!machine.cpu.registers().p.get(StatusFlag::Zero));
        assert!(!machine.cpu.registers().p.get(StatusFlag::Negative));
        assert_eq!(machine.cpu.cycles_since_fetch(), 2);
        assert_eq!(machine.pending_sync(), Some(BusRequest::fetch(0x0002)));
    }

    /// `LDA ($FF),Y`: the pointer's high byte comes from `$0000`, not
    /// `$0100` — zero-page wrap on the pointer read.
    #[test]
    pub fn indirect_indexed_wraps_the_pointer_read() {
        let mut machine = Machine::with_program(0x0400, &[0xB1, 0xFF]);
        machine.cpu.registers_mut().y = 0x01;
        machine.bus.memory[0x00FF] = 0x80;
        machine.bus.memory[0x0000] = 0x20;
        machine.bus.memory[0x2081] = 0x99;

        let trace = machine.step();
        let addresses: Vec<Address> = trace.iter().map(|request| request.address).collect();
        assert_eq!(addresses, vec![0x0400, 0x0401, 0x00FF, 0x0000, 0x2081]);
        assert_eq!(machine.cpu.registers().a, 0x99);
    }

    /// Crossing a page with `LDA abs,X` costs exactly one extra cycle, spent
    /// reading `old_hi:new_lo`; without a crossing there is no extra read.
    #[test]
    pub fn absolute_x_page_crossing_penalty() {
        let mut machine = Machine::with_program(0x0400, &[0xBD, 0xF8, 0x20]);
        machine.cpu.registers_mut().x = 0x10;
        machine.bus.memory[0x2108] = 0x33;

        let trace = machine.step();
        let addresses: Vec<Address> = trace.iter().map(|request| request.address).collect();
        assert_eq!(addresses, vec![0x0400, 0x0401, 0x0402, 0x2008, 0x2108]);
        assert_eq!(machine.cpu.registers().a, 0x33);

        let mut machine = Machine::with_program(0x0400, &[0xBD, 0xF8, 0x20]);
        machine.cpu.registers_mut().x = 0x01;
        machine.bus.memory[0x20F9] = 0x44;

        let trace = machine.step();
        assert_eq!(trace.len(), 4);
        assert_eq!(machine.cpu.registers().a, 0x44);
    }

    /// `JMP ($20FF)` reads its target high byte from `$2000`, not `$2100`:
    /// the indirect jump never carries into the pointer's high byte.
    #[test]
    pub fn jmp_indirect_page_wrap_bug() {
        let mut machine = Machine::with_program(0x0400, &[0x6C, 0xFF, 0x20]);
        machine.bus.memory[0x20FF] = 0x34;
        machine.bus.memory[0x2000] = 0x56;
        machine.bus.memory[0x2100] = 0x78;

        let trace = machine.step();
        let addresses: Vec<Address> = trace.iter().map(|request| request.address).collect();
        assert_eq!(addresses, vec![0x0400, 0x0401, 0x0402, 0x20FF, 0x2000]);
        assert_eq!(machine.cpu.registers().pc, 0x5634);
    }

    /// Branches cost 2 cycles untaken, 3 taken within the page, 4 across a
    /// page; the extra cycles are dummy reads at the partially-updated PC.
    #[test]
    pub fn branch_cycle_law() {
        // Not taken: Z clear.
        let mut machine = Machine::with_program(0x0400, &[0xF0, 0x10]);
        let trace = machine.step();
        assert_eq!(trace.len(), 2);
        assert_eq!(machine.pending_sync(), Some(BusRequest::fetch(0x0402)));

        // Taken, same page.
        let mut machine = Machine::with_program(0x0400, &[0xF0, 0x10]);
        machine.cpu.registers_mut().p.set(StatusFlag::Zero, true);
        let trace = machine.step();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[2], BusRequest::read(0x0412));
        assert_eq!(machine.pending_sync(), Some(BusRequest::fetch(0x0412)));

        // Taken, crossing into the next page: `BEQ +127` two bytes below the
        // boundary. The wrong-page dummy read precedes the corrected one.
        let mut machine = Machine::with_program(0x04FD, &[0xF0, 0x7F]);
        machine.cpu.registers_mut().p.set(StatusFlag::Zero, true);
        let trace = machine.step();
        assert_eq!(trace.len(), 4);
        assert_eq!(trace[2], BusRequest::read(0x047E));
        assert_eq!(trace[3], BusRequest::read(0x057E));
        assert_eq!(machine.pending_sync(), Some(BusRequest::fetch(0x057E)));
    }

    /// `$50 + $50` with carry clear: `A = $A0`, signed overflow, negative.
    #[test]
    pub fn adc_sets_overflow_on_same_sign_operands() {
        let mut machine = Machine::with_program(0x0400, &[0xA9, 0x50, 0x69, 0x50]);
        machine.run(2);

        let registers = machine.cpu.registers();
        assert_eq!(registers.a, 0xA0);
        assert!(!registers.p.get(StatusFlag::Carry));
        assert!(registers.p.get(StatusFlag::Overflow));
        assert!(registers.p.get(StatusFlag::Negative));
        assert!(!registers.p.get(StatusFlag::Zero));
    }

    /// For every `A`, `M` and incoming carry, `SBC #M` with the inverted
    /// carry undoes `ADC #M`.
    #[test]
    pub fn sbc_undoes_adc_for_all_operands() {
        let mut machine = Machine::with_program(
            0x0400,
            &[
                0x69, 0x00, // ADC #M
                0xE9, 0x00, // SBC #M
                0x4C, 0x00, 0x04, // JMP $0400
            ],
        );

        for a in 0..=255u8 {
            for m in (0..=255u8).step_by(17) {
                for carry in [false, true] {
                    machine.bus.memory[0x0401] = m;
                    machine.bus.memory[0x0403] = m;
                    {
                        let registers = machine.cpu.registers_mut();
                        registers.a = a;
                        registers.p.set(StatusFlag::Carry, carry);
                    }

                    machine.step();
                    machine
                        .cpu
                        .registers_mut()
                        .p
                        .set(StatusFlag::Carry, !carry);
                    machine.step();

                    assert_eq!(
                        machine.cpu.registers().a,
                        a,
                        "A={:#04x} M={:#04x} C={}",
                        a,
                        m,
                        carry
                    );
                    machine.step(); // JMP back for the next round
                }
            }
        }
    }

    /// `LDA #v` sets Z exactly when `v == 0` and N exactly when bit 7 is set.
    #[test]
    pub fn load_zero_and_negative_law() {
        let mut machine = Machine::with_program(0x0400, &[0xA9, 0x00, 0x4C, 0x00, 0x04]);

        for value in 0..=255u8 {
            machine.bus.memory[0x0401] = value;
            machine.step();

            let p = machine.cpu.registers().p;
            assert_eq!(p.get(StatusFlag::Zero), value == 0, "value {:#04x}", value);
            assert_eq!(
                p.get(StatusFlag::Negative),
                value & 0x80 != 0,
                "value {:#04x}",
                value
            );
            machine.step();
        }
    }

    /// TXS moves X into SP without touching a single flag; TSX and TAX are
    /// ordinary flag-setting transfers.
    #[test]
    pub fn transfer_flag_behaviour() {
        // LDX #$00 leaves Z set; TXS must not clear it.
        let mut machine = Machine::with_program(0x0400, &[0xA2, 0x00, 0x9A]);
        machine.run(2);
        assert_eq!(machine.cpu.registers().sp, 0x00);
        assert!(machine.cpu.registers().p.get(StatusFlag::Zero));

        // TAX copies A and reflects it in Z/N.
        let mut machine = Machine::with_program(0x0400, &[0xA9, 0xFF, 0xAA]);
        machine.run(2);
        assert_eq!(machine.cpu.registers().x, 0xFF);
        assert!(machine.cpu.registers().p.get(StatusFlag::Negative));
        assert!(!machine.cpu.registers().p.get(StatusFlag::Zero));
    }

    /// Pushes write exactly the right bytes in the right order and pulls
    /// bring them back, stack pointer walking down and back up.
    #[test]
    pub fn stack_push_and_pull() {
        let program = vec![
            // Stage 1: reset the stack pointer.
            0xA2, 0xFF, // LDX #$FF
            0x9A, // TXS
            // Stage 2: push 0xE0 then 0xBB.
            0xA9, 0xE0, // LDA #$E0
            0x48, // PHA
            0xA9, 0xBB, // LDA #$BB
            0x48, // PHA
            // Stage 3: pull them back in reverse order.
            0xA9, 0x00, // LDA #$00
            0x68, // PLA
            0x68, // PLA
        ];
        let mut machine = Machine::with_program(0x0400, &program);

        machine.run(4);
        assert_eq!(machine.cpu.registers().sp, 0xFE);
        assert_eq!(machine.bus.memory[0x01FF], 0xE0);

        machine.run(2);
        assert_eq!(machine.cpu.registers().sp, 0xFD);
        assert_eq!(machine.bus.memory[0x01FE], 0xBB);

        machine.run(2);
        assert_eq!(machine.cpu.registers().a, 0xBB);
        assert_eq!(machine.cpu.registers().sp, 0xFE);

        machine.run(1);
        assert_eq!(machine.cpu.registers().a, 0xE0);
        assert_eq!(machine.cpu.registers().sp, 0xFF);
    }

    /// PHA spends its three cycles on fetch, dummy read and the stack write;
    /// PLA adds the discarded read of the old top-of-stack.
    #[test]
    pub fn stack_operation_cycle_shapes() {
        let mut machine = Machine::with_program(0x0400, &[0x48, 0x68]);
        machine.cpu.registers_mut().sp = 0xFF;
        machine.cpu.registers_mut().a = 0x7E;

        let push = machine.step();
        assert_eq!(
            push,
            vec![
                BusRequest::fetch(0x0400),
                BusRequest::read(0x0401),
                BusRequest::write(0x01FF, 0x7E),
            ]
        );

        machine.cpu.registers_mut().a = 0x00;
        let pull = machine.step();
        assert_eq!(
            pull,
            vec![
                BusRequest::fetch(0x0401),
                BusRequest::read(0x0402),
                BusRequest::read(0x01FE),
                BusRequest::read(0x01FF),
            ]
        );
        assert_eq!(machine.cpu.registers().a, 0x7E);
    }

    /// PHP pushes `p` with `B` and the unused bit set; PLP drops `B` again
    /// and keeps the unused bit asserted.
    #[test]
    pub fn php_plp_break_bit_convention() {
        let mut machine = Machine::with_program(0x0400, &[0x08, 0x28]);
        machine.cpu.registers_mut().sp = 0xFF;
        machine.cpu.registers_mut().p = Status(0x20).with(StatusFlag::Carry, true);

        machine.step();
        assert_eq!(machine.bus.memory[0x01FF], 0x21 | 0x10 | 0x20);

        machine.bus.memory[0x01FF] = 0xFF;
        machine.step();
        assert_eq!(machine.cpu.registers().p.0, 0xFF & !0x10);
    }

    /// Memory read-modify-writes put the unmodified value back on the bus
    /// before the result: read, write old, write new.
    #[test]
    pub fn rmw_writes_old_value_then_new() {
        let mut machine = Machine::with_program(0x0400, &[0x06, 0x10]); // ASL $10
        machine.bus.memory[0x0010] = 0x81;

        let trace = machine.step();
        assert_eq!(
            trace,
            vec![
                BusRequest::fetch(0x0400),
                BusRequest::read(0x0401),
                BusRequest::read(0x0010),
                BusRequest::write(0x0010, 0x81),
                BusRequest::write(0x0010, 0x02),
            ]
        );
        assert_eq!(machine.bus.memory[0x0010], 0x02);
        assert!(machine.cpu.registers().p.get(StatusFlag::Carry));
    }

    /// Zero-page indexing wraps at 8 bits and emits the spurious read of the
    /// un-indexed address first.
    #[test]
    pub fn zero_page_indexed_wraps_and_reads_twice() {
        let mut machine = Machine::with_program(0x0400, &[0xB5, 0x80]); // LDA $80,X
        machine.cpu.registers_mut().x = 0xFF;
        machine.bus.memory[0x007F] = 0x5A;

        let trace = machine.step();
        let addresses: Vec<Address> = trace.iter().map(|request| request.address).collect();
        assert_eq!(addresses, vec![0x0400, 0x0401, 0x0080, 0x007F]);
        assert_eq!(machine.cpu.registers().a, 0x5A);
    }

    /// `($zp,X)` wraps both the index sum and the pointer's second byte
    /// inside page zero.
    #[test]
    pub fn indexed_indirect_wraps_in_page_zero() {
        let mut machine = Machine::with_program(0x0400, &[0xA1, 0xFE]); // LDA ($FE,X)
        machine.cpu.registers_mut().x = 0x01;
        machine.bus.memory[0x00FF] = 0x21;
        machine.bus.memory[0x0000] = 0x43;
        machine.bus.memory[0x4321] = 0xD5;

        let trace = machine.step();
        let addresses: Vec<Address> = trace.iter().map(|request| request.address).collect();
        assert_eq!(
            addresses,
            vec![0x0400, 0x0401, 0x00FE, 0x00FF, 0x0000, 0x4321]
        );
        assert_eq!(machine.cpu.registers().a, 0xD5);
    }

    /// Stores never shortcut the indexed dummy read: `STA abs,X` is five
    /// cycles whether or not the page crosses, and the write lands on the
    /// corrected address.
    #[test]
    pub fn indexed_store_always_pays_the_penalty_cycle() {
        let mut machine = Machine::with_program(0x0400, &[0x9D, 0xF8, 0x20]); // STA $20F8,X
        machine.cpu.registers_mut().x = 0x01;
        machine.cpu.registers_mut().a = 0xAB;

        let trace = machine.step();
        assert_eq!(trace.len(), 5);
        assert_eq!(trace[3], BusRequest::read(0x20F9));
        assert_eq!(trace[4], BusRequest::write(0x20F9, 0xAB));

        let mut machine = Machine::with_program(0x0400, &[0x9D, 0xF8, 0x20]);
        machine.cpu.registers_mut().x = 0x10;
        machine.cpu.registers_mut().a = 0xCD;

        let trace = machine.step();
        assert_eq!(trace.len(), 5);
        assert_eq!(trace[3], BusRequest::read(0x2008));
        assert_eq!(trace[4], BusRequest::write(0x2108, 0xCD));
    }

    #[test]
    pub fn sta_zero_page_is_three_cycles() {
        let mut machine = Machine::with_program(0x0400, &[0x85, 0x10]);
        machine.cpu.registers_mut().a = 0xBE;

        let trace = machine.step();
        assert_eq!(
            trace,
            vec![
                BusRequest::fetch(0x0400),
                BusRequest::read(0x0401),
                BusRequest::write(0x0010, 0xBE),
            ]
        );
        assert_eq!(machine.bus.memory[0x0010], 0xBE);
    }

    /// JSR pushes the address of its own last byte, high then low, and RTS
    /// adds one on the way back. Adapted from the sibling check: the stack
    /// must hold exactly `0xF0 0x07` after a JSR from `0xF005`.
    #[test]
    pub fn jsr_and_rts_roundtrip() {
        let main_program = vec![
            0xA2, 0xFF, // 0xF000: LDX #$FF
            0x9A, // 0xF002: TXS
            0xA9, 0xBB, // 0xF003: LDA #$BB
            0x20, 0x00, 0x02, // 0xF005: JSR $0200
            0xA2, 0xBE, // 0xF008: LDX #$BE
        ];
        let sub_program = vec![
            0xA9, 0xFF, // 0x0200: LDA #$FF
            0x60, // 0x0202: RTS
        ];

        let mut machine = Machine::with_program(0xF000, &main_program);
        machine.bus.memory[0x0200..0x0200 + sub_program.len()].copy_from_slice(&sub_program);

        machine.run(3);
        assert_eq!(machine.cpu.registers().a, 0xBB);
        assert_eq!(machine.cpu.registers().sp, 0xFF);

        let jsr = machine.step();
        assert_eq!(jsr.len(), 6);
        assert_eq!(machine.cpu.registers().pc, 0x0200);
        assert_eq!(machine.bus.memory[0x01FF], 0xF0);
        assert_eq!(machine.bus.memory[0x01FE], 0x07);

        machine.run(1); // LDA #$FF
        let rts = machine.step();
        assert_eq!(rts.len(), 6);
        assert_eq!(machine.cpu.registers().a, 0xFF);
        assert_eq!(machine.cpu.registers().pc, 0xF008);

        machine.run(1); // LDX #$BE
        assert_eq!(machine.cpu.registers().x, 0xBE);
    }

    /// BRK pushes the skipped return address and `p` with `B` set, vectors
    /// through `$FFFE` with `I` raised; RTI restores everything (minus `B`).
    #[test]
    pub fn brk_and_rti_roundtrip() {
        let mut machine = Machine::with_program(0x0400, &[0x00, 0xFF]); // BRK + padding
        machine.bus.memory[0x0500] = 0x40; // RTI
        machine.bus.write_u16(IRQ_VECTOR_ADDRESS, 0x0500);
        machine.cpu.registers_mut().sp = 0xFF;
        machine.cpu.registers_mut().p.set(StatusFlag::Carry, true);

        let brk = machine.step();
        assert_eq!(brk.len(), 7);
        assert_eq!(machine.cpu.registers().pc, 0x0500);
        assert!(machine.cpu.registers().p.get(StatusFlag::InterruptDisable));
        assert_eq!(machine.bus.memory[0x01FF], 0x04);
        assert_eq!(machine.bus.memory[0x01FE], 0x02);
        assert_eq!(machine.bus.memory[0x01FD], 0x21 | 0x10 | 0x20);

        let rti = machine.step();
        assert_eq!(rti.len(), 6);
        assert_eq!(machine.cpu.registers().pc, 0x0402);
        assert_eq!(machine.cpu.registers().sp, 0xFF);
        let p = machine.cpu.registers().p;
        assert!(p.get(StatusFlag::Carry));
        assert!(!p.get(StatusFlag::Break));
        assert!(p.get(StatusFlag::Unused));
    }

    /// After `reset()` the CPU walks the documented 7-cycle sequence — two
    /// reads at PC, three stack reads with SP decrementing, the vector — and
    /// its first SYNC lands on the vector target with `I` set.
    #[test]
    pub fn reset_runs_the_documented_sequence() {
        let mut machine = Machine::with_program(0x0000, &[]);
        machine.bus.write_u16(RESET_VECTOR_ADDRESS, 0x1234);
        machine.cpu.reset();

        let mut requests = Vec::new();
        for _ in 0..8 {
            requests.push(machine.tick());
        }

        let addresses: Vec<Address> = requests.iter().map(|request| request.address).collect();
        assert_eq!(
            addresses,
            vec![0x0000, 0x0000, 0x0100, 0x01FF, 0x01FE, 0xFFFC, 0xFFFD, 0x1234]
        );
        assert!(requests[..7].iter().all(|request| request.is_read()));
        assert!(requests[7].is_sync());
        assert_eq!(machine.cpu.registers().sp, 0xFD);
        assert!(machine.cpu.registers().p.get(StatusFlag::InterruptDisable));
    }

    /// IRQ is level-triggered, sampled at instruction boundaries, masked by
    /// `I`, and pushes `p` with `B` clear.
    #[test]
    pub fn irq_interrupts_at_the_instruction_boundary() {
        let mut machine = Machine::with_program(0x0400, &[0xEA, 0xEA]); // NOP NOP
        machine.bus.memory[0x0600] = 0xEA;
        machine.bus.write_u16(IRQ_VECTOR_ADDRESS, 0x0600);
        machine.cpu.registers_mut().sp = 0xFF;

        machine.cpu.set_irq(true);
        let trace = machine.step();
        // Two NOP cycles plus the seven-cycle interrupt frame.
        assert_eq!(trace.len(), 9);
        assert_eq!(machine.cpu.registers().pc, 0x0600);
        assert!(machine.cpu.registers().p.get(StatusFlag::InterruptDisable));
        // Return address is the un-executed second NOP.
        assert_eq!(machine.bus.memory[0x01FF], 0x04);
        assert_eq!(machine.bus.memory[0x01FE], 0x01);
        // Hardware interrupts push B clear, unused set.
        assert_eq!(machine.bus.memory[0x01FD] & 0x30, 0x20);

        // With `I` now set, the still-asserted line is ignored.
        let trace = machine.step();
        assert_eq!(trace.len(), 2);
    }

    /// NMI latches on the asserting edge: holding the line high does not
    /// re-enter, a fresh edge does.
    #[test]
    pub fn nmi_is_edge_triggered() {
        let mut machine = Machine::with_program(0x0400, &[0xEA, 0xEA, 0xEA]);
        machine.bus.memory[0x0700..0x0703].copy_from_slice(&[0xEA, 0xEA, 0xEA]);
        machine.bus.write_u16(NMI_VECTOR_ADDRESS, 0x0700);
        machine.cpu.registers_mut().sp = 0xFF;

        machine.cpu.set_nmi(true);
        let trace = machine.step();
        assert_eq!(trace.len(), 9);
        assert_eq!(machine.cpu.registers().pc, 0x0700);

        // Line still high: no second entry.
        let trace = machine.step();
        assert_eq!(trace.len(), 2);

        // A new edge latches again.
        machine.cpu.set_nmi(false);
        machine.cpu.set_nmi(true);
        let trace = machine.step();
        assert_eq!(trace.len(), 9);
        assert_eq!(machine.cpu.registers().pc, 0x0700);
    }

    /// Branch-to-self and jump-to-self invoke the trap hook with the
    /// trapped instruction's address; execution itself keeps going.
    #[test]
    pub fn self_loops_invoke_the_trap_hook() {
        let traps: Rc<RefCell<Vec<Address>>> = Rc::new(RefCell::new(Vec::new()));

        let mut machine = Machine::with_program(0x0400, &[0x4C, 0x00, 0x04]); // JMP $0400
        let sink = traps.clone();
        machine.cpu.set_trap_handler(move |pc| sink.borrow_mut().push(pc));
        machine.step();
        assert_eq!(traps.borrow().as_slice(), &[0x0400]);

        let mut machine = Machine::with_program(0x0400, &[0xD0, 0xFE]); // BNE -2, Z clear
        let sink = traps.clone();
        machine.cpu.set_trap_handler(move |pc| sink.borrow_mut().push(pc));
        machine.step();
        assert_eq!(traps.borrow().as_slice(), &[0x0400, 0x0400]);
    }

    /// A `ready = false` response holds the CPU: the same request is issued
    /// again and the pump does not advance.
    #[test]
    pub fn wait_states_reissue_the_same_request() {
        let mut cpu = MOS6502::new();
        cpu.registers_mut().pc = 0x0400;

        let first = cpu.tick(BusResponse::default()).unwrap();
        assert_eq!(first, BusRequest::fetch(0x0400));

        let stalled = cpu
            .tick(BusResponse {
                data: 0,
                ready: false,
            })
            .unwrap();
        assert_eq!(stalled, first);
        assert_eq!(cpu.ticks(), 2);

        // Once the host is ready again the stream continues where it left
        // off: the stalled fetch's data decodes as the opcode.
        let next = cpu.tick(BusResponse::new(0xA9)).unwrap();
        assert_eq!(next, BusRequest::read(0x0401));
    }

    /// After any documented instruction, bit 5 of `p` reads 1.
    #[test]
    pub fn unused_bit_survives_every_instruction() {
        for opcode in 0..=255u8 {
            if super::instruction::decode(opcode).is_none() {
                continue;
            }

            let mut machine = Machine::with_program(0x0400, &[opcode, 0x10, 0x02]);
            machine.cpu.registers_mut().sp = 0xFF;
            machine.step();

            assert!(
                machine.cpu.registers().p.get(StatusFlag::Unused),
                "opcode {:#04x} cleared the unused bit",
                opcode
            );
        }
    }

    /// BIT pulls N and V straight from the operand and Z from the mask.
    #[test]
    pub fn bit_sets_flags_from_the_operand() {
        let mut machine = Machine::with_program(0x0400, &[0x24, 0x10]); // BIT $10
        machine.bus.memory[0x0010] = 0xC0;
        machine.cpu.registers_mut().a = 0x3F;

        machine.step();
        let p = machine.cpu.registers().p;
        assert!(p.get(StatusFlag::Zero));
        assert!(p.get(StatusFlag::Negative));
        assert!(p.get(StatusFlag::Overflow));
    }

    /// CMP leaves the register alone and reports the 9-bit subtract through
    /// C, Z and N.
    #[test]
    pub fn compare_semantics() {
        let mut machine = Machine::with_program(0x0400, &[0xC9, 0x30]); // CMP #$30
        machine.cpu.registers_mut().a = 0x40;
        machine.step();
        let p = machine.cpu.registers().p;
        assert_eq!(machine.cpu.registers().a, 0x40);
        assert!(p.get(StatusFlag::Carry));
        assert!(!p.get(StatusFlag::Zero));
        assert!(!p.get(StatusFlag::Negative));

        let mut machine = Machine::with_program(0x0400, &[0xC9, 0x50]);
        machine.cpu.registers_mut().a = 0x40;
        machine.step();
        let p = machine.cpu.registers().p;
        assert!(!p.get(StatusFlag::Carry));
        assert!(p.get(StatusFlag::Negative));
    }

    /// Rotates shift the old carry into the vacated bit and catch the bit
    /// shifted out.
    #[test]
    pub fn rotate_through_carry() {
        let mut machine = Machine::with_program(0x0400, &[0x2A]); // ROL A
        machine.cpu.registers_mut().a = 0x80;
        machine.cpu.registers_mut().p.set(StatusFlag::Carry, true);
        machine.step();
        assert_eq!(machine.cpu.registers().a, 0x01);
        assert!(machine.cpu.registers().p.get(StatusFlag::Carry));

        let mut machine = Machine::with_program(0x0400, &[0x6A]); // ROR A
        machine.cpu.registers_mut().a = 0x01;
        machine.cpu.registers_mut().p.set(StatusFlag::Carry, true);
        machine.step();
        assert_eq!(machine.cpu.registers().a, 0x80);
        assert!(machine.cpu.registers().p.get(StatusFlag::Carry));
    }
}
