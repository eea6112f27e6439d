//! Operation microcode. Each function is one cycle of one instruction,
//! running after the addressing-mode prefix has done its work.
//!
//! Conventions, shared with the addressing steps:
//!
//! - an operation that consumed its data and has no bus traffic of its own
//!   returns [`MicrocodeResponse::complete`]; the pump issues the next opcode
//!   fetch on that same tick.
//! - implied and accumulator operations own their dummy read of the byte
//!   after the opcode.
//! - extra cycles that depend on earlier cycles (stack pulls, push data) are
//!   scheduled through the injection slot.

use super::bus::{BusRequest, BusResponse};
use super::interrupt::IRQ_VECTOR_ADDRESS;
use super::microcode::MicrocodeResponse;
use super::state::State;
use super::status::StatusFlag;

/// The dummy read implied and accumulator operations perform while they work:
/// the byte after the opcode, fetched and discarded.
fn implied_read(state: &State) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::read(state.registers.pc))
}

// =====================================================================================
// Loads and stores
// =====================================================================================

pub(crate) fn lda(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.a = response.data;
    state.set_zn(response.data);
    MicrocodeResponse::complete()
}

pub(crate) fn ldx(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.x = response.data;
    state.set_zn(response.data);
    MicrocodeResponse::complete()
}

pub(crate) fn ldy(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.y = response.data;
    state.set_zn(response.data);
    MicrocodeResponse::complete()
}

/// Store once the prefix has fully assembled the effective address; the
/// incoming byte is the indexed dummy read, discarded.
pub(crate) fn store_a(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), state.registers.a))
}

pub(crate) fn store_x(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), state.registers.x))
}

pub(crate) fn store_y(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), state.registers.y))
}

// Zero-page stores write on the cycle the address byte arrives, so latching
// and storing fuse into one step.

pub(crate) fn sta_zero_page(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    state.hi = 0x00;
    store_a(state, response)
}

pub(crate) fn stx_zero_page(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    state.hi = 0x00;
    store_x(state, response)
}

pub(crate) fn sty_zero_page(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    state.hi = 0x00;
    store_y(state, response)
}

// Absolute and (zp,X) stores receive the address high byte on their own
// cycle: take it, then write.

pub(crate) fn sta_with_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.hi = response.data;
    store_a(state, response)
}

pub(crate) fn stx_with_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.hi = response.data;
    store_x(state, response)
}

pub(crate) fn sty_with_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.hi = response.data;
    store_y(state, response)
}

// =====================================================================================
// Register transfers
// =====================================================================================

pub(crate) fn tax(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.x = state.registers.a;
    state.set_zn(state.registers.x);
    implied_read(state)
}

pub(crate) fn tay(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.y = state.registers.a;
    state.set_zn(state.registers.y);
    implied_read(state)
}

pub(crate) fn txa(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.a = state.registers.x;
    state.set_zn(state.registers.a);
    implied_read(state)
}

pub(crate) fn tya(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.a = state.registers.y;
    state.set_zn(state.registers.a);
    implied_read(state)
}

pub(crate) fn tsx(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.x = state.registers.sp;
    state.set_zn(state.registers.x);
    implied_read(state)
}

/// TXS is the one transfer that does not touch the flags.
pub(crate) fn txs(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.sp = state.registers.x;
    implied_read(state)
}

// =====================================================================================
// Stack operations
// =====================================================================================

pub(crate) fn pha(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::inject(BusRequest::read(state.registers.pc), pha_push)
}

fn pha_push(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::write(state.stack_address(), state.registers.a);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn php(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::inject(BusRequest::read(state.registers.pc), php_push)
}

fn php_push(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    // The pushed copy of `p` always carries `B` and the unused bit.
    let pushed = state
        .registers
        .p
        .with(StatusFlag::Break, true)
        .with(StatusFlag::Unused, true)
        .0;
    let request = BusRequest::write(state.stack_address(), pushed);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn pla(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::inject(BusRequest::read(state.registers.pc), pla_stack)
}

fn pla_stack(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    // Discarded read of the old top-of-stack while the pointer increments.
    let request = BusRequest::read(state.stack_address());
    state.registers.sp = state.registers.sp.wrapping_add(1);
    MicrocodeResponse::inject(request, pla_pull)
}

fn pla_pull(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::inject(BusRequest::read(state.stack_address()), pla_load)
}

fn pla_load(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.a = response.data;
    state.set_zn(response.data);
    MicrocodeResponse::complete()
}

pub(crate) fn plp(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::inject(BusRequest::read(state.registers.pc), plp_stack)
}

fn plp_stack(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::read(state.stack_address());
    state.registers.sp = state.registers.sp.wrapping_add(1);
    MicrocodeResponse::inject(request, plp_pull)
}

fn plp_pull(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::inject(BusRequest::read(state.stack_address()), plp_load)
}

fn plp_load(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.p.assign(response.data);
    MicrocodeResponse::complete()
}

// =====================================================================================
// Logical operations
// =====================================================================================

pub(crate) fn and(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.a &= response.data;
    state.set_zn(state.registers.a);
    MicrocodeResponse::complete()
}

pub(crate) fn ora(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.a |= response.data;
    state.set_zn(state.registers.a);
    MicrocodeResponse::complete()
}

pub(crate) fn eor(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.a ^= response.data;
    state.set_zn(state.registers.a);
    MicrocodeResponse::complete()
}

pub(crate) fn bit(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let value = response.data;
    state.set_flag(StatusFlag::Zero, state.registers.a & value == 0);
    state.set_flag(StatusFlag::Overflow, value & 0b0100_0000 != 0);
    state.set_flag(StatusFlag::Negative, value & 0b1000_0000 != 0);
    MicrocodeResponse::complete()
}

// =====================================================================================
// Arithmetic
// =====================================================================================

fn add_with_carry(state: &mut State, value: u8) {
    // Decimal mode is deliberately unsupported; the functional suites run
    // with `D` clear.
    debug_assert!(
        !state.has_flag(StatusFlag::DecimalMode),
        "decimal mode arithmetic is not implemented"
    );

    let a = state.registers.a;
    let carry = u8::from(state.has_flag(StatusFlag::Carry));

    let sum = u16::from(a) + u16::from(value) + u16::from(carry);
    let result = (sum & 0xFF) as u8;

    state.set_flag(StatusFlag::Carry, sum > 0xFF);
    // Signed overflow: the operands agree in sign and the result disagrees.
    let overflow = (!(a ^ value) & (a ^ result)) & 0x80 != 0;
    state.set_flag(StatusFlag::Overflow, overflow);
    state.set_zn(result);

    state.registers.a = result;
}

pub(crate) fn adc(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    add_with_carry(state, response.data);
    MicrocodeResponse::complete()
}

/// SBC is ADC of the one's complement: carry doubles as "no borrow".
pub(crate) fn sbc(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    add_with_carry(state, response.data ^ 0xFF);
    MicrocodeResponse::complete()
}

fn compare(state: &mut State, register: u8, value: u8) {
    // A 9-bit subtract: carry reports the absence of a borrow, Z and N come
    // from the low byte, the register itself is untouched.
    let difference = u16::from(register).wrapping_sub(u16::from(value));
    state.set_flag(StatusFlag::Carry, register >= value);
    state.set_zn((difference & 0xFF) as u8);
}

pub(crate) fn cmp(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let register = state.registers.a;
    compare(state, register, response.data);
    MicrocodeResponse::complete()
}

pub(crate) fn cpx(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let register = state.registers.x;
    compare(state, register, response.data);
    MicrocodeResponse::complete()
}

pub(crate) fn cpy(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let register = state.registers.y;
    compare(state, register, response.data);
    MicrocodeResponse::complete()
}

// =====================================================================================
// Shifts and rotates
// =====================================================================================

fn shift_left(state: &mut State, value: u8) -> u8 {
    let result = value << 1;
    state.set_flag(StatusFlag::Carry, value & 0b1000_0000 != 0);
    state.set_zn(result);
    result
}

fn shift_right(state: &mut State, value: u8) -> u8 {
    let result = value >> 1;
    state.set_flag(StatusFlag::Carry, value & 0b0000_0001 != 0);
    state.set_zn(result);
    result
}

fn rotate_left(state: &mut State, value: u8) -> u8 {
    let carry = u8::from(state.has_flag(StatusFlag::Carry));
    let result = (value << 1) | carry;
    state.set_flag(StatusFlag::Carry, value & 0b1000_0000 != 0);
    state.set_zn(result);
    result
}

fn rotate_right(state: &mut State, value: u8) -> u8 {
    let carry = u8::from(state.has_flag(StatusFlag::Carry)) << 7;
    let result = (value >> 1) | carry;
    state.set_flag(StatusFlag::Carry, value & 0b0000_0001 != 0);
    state.set_zn(result);
    result
}

pub(crate) fn asl_accumulator(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let value = state.registers.a;
    state.registers.a = shift_left(state, value);
    implied_read(state)
}

pub(crate) fn lsr_accumulator(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let value = state.registers.a;
    state.registers.a = shift_right(state, value);
    implied_read(state)
}

pub(crate) fn rol_accumulator(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let value = state.registers.a;
    state.registers.a = rotate_left(state, value);
    implied_read(state)
}

pub(crate) fn ror_accumulator(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let value = state.registers.a;
    state.registers.a = rotate_right(state, value);
    implied_read(state)
}

// =====================================================================================
// Read-modify-write memory operations
// =====================================================================================

/// First half of every memory RMW: latch the value that just arrived and
/// write it straight back while the ALU works. The modify step then writes
/// the new value, giving the classic old-then-new double write.
pub(crate) fn rmw_write_back(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.operand = response.data;
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), state.operand))
}

pub(crate) fn asl_memory(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let value = state.operand;
    let result = shift_left(state, value);
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), result))
}

pub(crate) fn lsr_memory(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let value = state.operand;
    let result = shift_right(state, value);
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), result))
}

pub(crate) fn rol_memory(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let value = state.operand;
    let result = rotate_left(state, value);
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), result))
}

pub(crate) fn ror_memory(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let value = state.operand;
    let result = rotate_right(state, value);
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), result))
}

pub(crate) fn inc_memory(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let result = state.operand.wrapping_add(1);
    state.set_zn(result);
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), result))
}

pub(crate) fn dec_memory(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let result = state.operand.wrapping_sub(1);
    state.set_zn(result);
    MicrocodeResponse::request(BusRequest::write(state.effective_address(), result))
}

// =====================================================================================
// Register increments and decrements
// =====================================================================================

pub(crate) fn inx(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.x = state.registers.x.wrapping_add(1);
    state.set_zn(state.registers.x);
    implied_read(state)
}

pub(crate) fn iny(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.y = state.registers.y.wrapping_add(1);
    state.set_zn(state.registers.y);
    implied_read(state)
}

pub(crate) fn dex(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.x = state.registers.x.wrapping_sub(1);
    state.set_zn(state.registers.x);
    implied_read(state)
}

pub(crate) fn dey(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.registers.y = state.registers.y.wrapping_sub(1);
    state.set_zn(state.registers.y);
    implied_read(state)
}

// =====================================================================================
// Flag operations
// =====================================================================================

pub(crate) fn clc(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::Carry, false);
    implied_read(state)
}

pub(crate) fn sec(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::Carry, true);
    implied_read(state)
}

pub(crate) fn cli(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::InterruptDisable, false);
    implied_read(state)
}

pub(crate) fn sei(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::InterruptDisable, true);
    implied_read(state)
}

pub(crate) fn clv(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::Overflow, false);
    implied_read(state)
}

pub(crate) fn cld(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::DecimalMode, false);
    implied_read(state)
}

pub(crate) fn sed(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::DecimalMode, true);
    implied_read(state)
}

// =====================================================================================
// Jumps and calls
// =====================================================================================

pub(crate) fn jmp_absolute(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let target = u16::from_le_bytes([state.lo, response.data]);

    // A three-byte jump to its own address is the conventional halt used by
    // the functional suites.
    if target == state.registers.pc.wrapping_sub(3) {
        state.trap = Some(target);
    }

    state.registers.pc = target;
    MicrocodeResponse::complete()
}

/// Fourth cycle of `JMP (ptr)`: latch the target low byte and read the high
/// byte. The pointer's low byte increments without carrying into the high
/// byte, so a pointer at `$xxFF` wraps to `$xx00` (the 6502's page-wrap bug).
pub(crate) fn jmp_indirect_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.operand = response.data;
    let pointer = u16::from_le_bytes([state.lo.wrapping_add(1), state.hi]);
    MicrocodeResponse::request(BusRequest::read(pointer))
}

pub(crate) fn jmp_indirect(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.pc = u16::from_le_bytes([state.operand, response.data]);
    MicrocodeResponse::complete()
}

/// Second cycle of JSR: latch the target low byte, then spend a cycle on the
/// internal stack read the hardware performs before pushing.
pub(crate) fn jsr(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    MicrocodeResponse::request(BusRequest::read(state.stack_address()))
}

pub(crate) fn jsr_push_pch(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    // `pc` still points at the target's high byte, so the pushed address is
    // the last byte of the JSR itself; RTS undoes this with its `+1`.
    let request = BusRequest::write(state.stack_address(), (state.registers.pc >> 8) as u8);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn jsr_push_pcl(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::write(state.stack_address(), (state.registers.pc & 0xFF) as u8);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn jsr_operand_high(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::read(state.registers.pc))
}

pub(crate) fn jsr_jump(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.pc = u16::from_le_bytes([state.lo, response.data]);
    MicrocodeResponse::complete()
}

pub(crate) fn rts(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::read(state.registers.pc))
}

pub(crate) fn rts_stack(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::read(state.stack_address());
    state.registers.sp = state.registers.sp.wrapping_add(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn rts_pull_pcl(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::read(state.stack_address());
    state.registers.sp = state.registers.sp.wrapping_add(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn rts_pull_pch(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    MicrocodeResponse::request(BusRequest::read(state.stack_address()))
}

/// Last cycle of RTS: the pulled address points at the JSR's final byte, so
/// step past it while the hardware burns a read at the not-yet-incremented
/// PC.
pub(crate) fn rts_increment(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.pc = u16::from_le_bytes([state.lo, response.data]);
    let request = BusRequest::read(state.registers.pc);
    state.registers.pc = state.registers.pc.wrapping_add(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn rti(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::read(state.registers.pc))
}

pub(crate) fn rti_stack(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::read(state.stack_address());
    state.registers.sp = state.registers.sp.wrapping_add(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn rti_pull_status(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::read(state.stack_address());
    state.registers.sp = state.registers.sp.wrapping_add(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn rti_pull_pcl(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.p.assign(response.data);
    let request = BusRequest::read(state.stack_address());
    state.registers.sp = state.registers.sp.wrapping_add(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn rti_pull_pch(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    MicrocodeResponse::request(BusRequest::read(state.stack_address()))
}

/// Unlike RTS, the address RTI pulls is used as-is.
pub(crate) fn rti_jump(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.pc = u16::from_le_bytes([state.lo, response.data]);
    MicrocodeResponse::complete()
}

// =====================================================================================
// BRK
// =====================================================================================

/// BRK consumes a padding byte: the pushed return address skips it.
pub(crate) fn brk_pad(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::read(state.registers.pc);
    state.registers.pc = state.registers.pc.wrapping_add(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn brk_push_pch(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::write(state.stack_address(), (state.registers.pc >> 8) as u8);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn brk_push_pcl(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::write(state.stack_address(), (state.registers.pc & 0xFF) as u8);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

/// The software-interrupt frame pushes `p` with `B` set; hardware interrupts
/// push it clear.
pub(crate) fn brk_push_status(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let pushed = state
        .registers
        .p
        .with(StatusFlag::Break, true)
        .with(StatusFlag::Unused, true)
        .0;
    let request = BusRequest::write(state.stack_address(), pushed);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

pub(crate) fn brk_vector_low(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::InterruptDisable, true);
    MicrocodeResponse::request(BusRequest::read(IRQ_VECTOR_ADDRESS))
}

pub(crate) fn brk_vector_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    MicrocodeResponse::request(BusRequest::read(IRQ_VECTOR_ADDRESS.wrapping_add(1)))
}

pub(crate) fn brk_jump(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.pc = u16::from_le_bytes([state.lo, response.data]);
    MicrocodeResponse::complete()
}

// =====================================================================================
// Branches
// =====================================================================================

fn branch(state: &mut State, response: BusResponse, taken: bool) -> MicrocodeResponse {
    if !taken {
        // Two cycles: the displacement read already happened, nothing to do.
        return MicrocodeResponse::complete();
    }

    let displacement = response.data;
    if displacement == 0xFE {
        // A taken branch with displacement -2 lands on its own opcode: the
        // conventional halt of the functional suites.
        state.trap = Some(state.registers.pc.wrapping_sub(2));
    }

    let pc = state.registers.pc;
    let target = pc.wrapping_add(displacement as i8 as u16);

    // The low byte updates first; the (possibly wrong-page) PC gets a dummy
    // read this cycle. A page crossing injects one more cycle to fix the
    // high byte.
    state.registers.pc = (pc & 0xFF00) | (target & 0x00FF);
    state.operand = displacement;
    let request = BusRequest::read(state.registers.pc);
    if state.registers.pc == target {
        MicrocodeResponse::request(request)
    } else {
        MicrocodeResponse::inject(request, branch_page_fixup)
    }
}

fn branch_page_fixup(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    if state.operand & 0x80 != 0 {
        state.registers.pc = state.registers.pc.wrapping_sub(0x100);
    } else {
        state.registers.pc = state.registers.pc.wrapping_add(0x100);
    }
    MicrocodeResponse::request(BusRequest::read(state.registers.pc))
}

pub(crate) fn bcs(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let taken = state.has_flag(StatusFlag::Carry);
    branch(state, response, taken)
}

pub(crate) fn bcc(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let taken = !state.has_flag(StatusFlag::Carry);
    branch(state, response, taken)
}

pub(crate) fn beq(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let taken = state.has_flag(StatusFlag::Zero);
    branch(state, response, taken)
}

pub(crate) fn bne(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let taken = !state.has_flag(StatusFlag::Zero);
    branch(state, response, taken)
}

pub(crate) fn bmi(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let taken = state.has_flag(StatusFlag::Negative);
    branch(state, response, taken)
}

pub(crate) fn bpl(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let taken = !state.has_flag(StatusFlag::Negative);
    branch(state, response, taken)
}

pub(crate) fn bvs(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let taken = state.has_flag(StatusFlag::Overflow);
    branch(state, response, taken)
}

pub(crate) fn bvc(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let taken = !state.has_flag(StatusFlag::Overflow);
    branch(state, response, taken)
}

// =====================================================================================
// System
// =====================================================================================

pub(crate) fn nop(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    implied_read(state)
}
