use std::fmt;

use super::bus::{BusRequest, BusResponse};
use super::microcode::{Microcode, MicrocodeResponse};
use super::state::State;

/// `AddressingMode` decides _where_ an operation's data comes from, and with
/// it the exact bus traffic of the instruction's first cycles.
///
/// Each mode is a short prefix of microcode steps that ends with the
/// effective address materialized in the `lo`/`hi` scratch. The prefix comes
/// in up to three flavours because the 6502 moves different traffic for
/// reads, stores and read-modify-writes of the same mode (see
/// [`AddressingMode::read_steps`] and friends).
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum AddressingMode {
    /// The target is implied by the instruction itself.
    ///
    /// Example: `INX`
    Implied,

    /// The instruction targets the accumulator.
    ///
    /// Example: `ROL A`
    Accumulator,

    /// The operand is the byte following the opcode.
    ///
    /// Example: `LDA #$AA`
    Immediate,

    /// The operand byte is an address within the first 256 bytes of memory
    /// (page zero).
    ///
    /// Example: `LDA $00`
    ZeroPage,

    /// `ZeroPage` with `X` added to the address first. The sum wraps within
    /// page zero: `$FF,X` with `X = 2` targets `$0001`, and the un-indexed
    /// address is read (and discarded) while the add happens.
    ///
    /// Example: `LDA $00,X`
    ZeroPageX,

    /// `ZeroPage` with `Y` added, same wrap rule. Only `LDX`/`STX` use it.
    ///
    /// Example: `LDX $00,Y`
    ZeroPageY,

    /// The two operand bytes form a full 16-bit address, low byte first.
    ///
    /// Example: `LDA $16A0`
    Absolute,

    /// `Absolute` with `X` added. Crossing a page boundary costs one extra
    /// cycle spent reading the not-yet-corrected address; stores and
    /// read-modify-writes always pay that cycle.
    AbsoluteX,

    /// `Absolute` with `Y` added, same page-crossing rule.
    AbsoluteY,

    /// The operand is a pointer to the real target. Only `JMP` uses it, and
    /// it inherits the hardware bug: a pointer at `$xxFF` reads its high
    /// byte from `$xx00`.
    Indirect,

    /// `($zp,X)`: the zero-page operand plus `X` (wrapped) points at the
    /// 16-bit target address, also read within page zero.
    IndexedIndirect,

    /// `($zp),Y`: the zero-page operand points at a 16-bit base address to
    /// which `Y` is added, with the `AbsoluteY` page-crossing rule.
    IndirectIndexed,

    /// A signed displacement from the next instruction, used by branches.
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    pub const fn operand_length(self) -> u16 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }

    /// Prefix for operations that read their operand: ends by issuing the
    /// effective-address read, whose data the operation consumes next cycle.
    pub(crate) const fn read_steps(self) -> &'static [Microcode] {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => NO_OPERAND,
            AddressingMode::Immediate | AddressingMode::Relative => OPERAND_ONLY,
            AddressingMode::ZeroPage => ZERO_PAGE_READ,
            AddressingMode::ZeroPageX => ZERO_PAGE_X_READ,
            AddressingMode::ZeroPageY => ZERO_PAGE_Y_READ,
            AddressingMode::Absolute => ABSOLUTE_READ,
            AddressingMode::AbsoluteX => ABSOLUTE_X_READ,
            AddressingMode::AbsoluteY => ABSOLUTE_Y_READ,
            AddressingMode::IndexedIndirect => INDEXED_INDIRECT_READ,
            AddressingMode::IndirectIndexed => INDIRECT_INDEXED_READ,
            AddressingMode::Indirect => panic!("indirect addressing is decoded as JMP steps"),
        }
    }

    /// Prefix for stores: stops as soon as the effective address is known so
    /// the operation's own cycle can be the write. Indexed absolute modes
    /// always read the (possibly wrong) indexed address first; there is no
    /// re-read, the high byte is corrected before the write.
    pub(crate) const fn store_steps(self) -> &'static [Microcode] {
        match self {
            AddressingMode::ZeroPage => OPERAND_ONLY,
            AddressingMode::ZeroPageX => ZERO_PAGE_X_STORE,
            AddressingMode::ZeroPageY => ZERO_PAGE_Y_STORE,
            AddressingMode::Absolute => ABSOLUTE_STORE,
            AddressingMode::AbsoluteX => ABSOLUTE_X_STORE,
            AddressingMode::AbsoluteY => ABSOLUTE_Y_STORE,
            AddressingMode::IndexedIndirect => INDEXED_INDIRECT_STORE,
            AddressingMode::IndirectIndexed => INDIRECT_INDEXED_STORE,
            _ => panic!("addressing mode has no store form"),
        }
    }

    /// Prefix for read-modify-write operations: like a read, but indexed
    /// absolute pays the dummy-read cycle unconditionally.
    pub(crate) const fn rmw_steps(self) -> &'static [Microcode] {
        match self {
            AddressingMode::ZeroPage => ZERO_PAGE_READ,
            AddressingMode::ZeroPageX => ZERO_PAGE_X_READ,
            AddressingMode::Absolute => ABSOLUTE_READ,
            AddressingMode::AbsoluteX => ABSOLUTE_X_RMW,
            _ => panic!("addressing mode has no read-modify-write form"),
        }
    }
}

const NO_OPERAND: &[Microcode] = &[];
const OPERAND_ONLY: &[Microcode] = &[operand_low];

const ZERO_PAGE_READ: &[Microcode] = &[operand_low, zero_page_address];
const ZERO_PAGE_X_READ: &[Microcode] = &[operand_low, zero_page_index_x, read_effective_address];
const ZERO_PAGE_Y_READ: &[Microcode] = &[operand_low, zero_page_index_y, read_effective_address];
const ABSOLUTE_READ: &[Microcode] = &[operand_low, operand_high, effective_address];
const ABSOLUTE_X_READ: &[Microcode] = &[operand_low, operand_high, effective_address_x];
const ABSOLUTE_Y_READ: &[Microcode] = &[operand_low, operand_high, effective_address_y];
const INDEXED_INDIRECT_READ: &[Microcode] = &[
    operand_low,
    indirect_pointer,
    indirect_x_index,
    indirect_high,
    effective_address,
];
const INDIRECT_INDEXED_READ: &[Microcode] = &[
    operand_low,
    indirect_pointer,
    indirect_high,
    effective_address_y,
];

const ZERO_PAGE_X_STORE: &[Microcode] = &[operand_low, zero_page_index_x];
const ZERO_PAGE_Y_STORE: &[Microcode] = &[operand_low, zero_page_index_y];
const ABSOLUTE_STORE: &[Microcode] = &[operand_low, operand_high];
const ABSOLUTE_X_STORE: &[Microcode] = &[operand_low, operand_high, effective_address_x_always];
const ABSOLUTE_Y_STORE: &[Microcode] = &[operand_low, operand_high, effective_address_y_always];
const INDEXED_INDIRECT_STORE: &[Microcode] = &[
    operand_low,
    indirect_pointer,
    indirect_x_index,
    indirect_high,
];
const INDIRECT_INDEXED_STORE: &[Microcode] = &[
    operand_low,
    indirect_pointer,
    indirect_high,
    effective_address_y_always,
];

const ABSOLUTE_X_RMW: &[Microcode] = &[
    operand_low,
    operand_high,
    effective_address_x_always,
    read_effective_address,
];

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// Microcode steps shared by the addressing-mode prefixes. Every step is one
// cycle: it consumes the previous cycle's data byte and issues this cycle's
// bus request.

/// Request the byte after the opcode and reset the address scratch.
pub(crate) fn operand_low(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.lo = 0;
    state.hi = 0;
    let request = BusRequest::read(state.registers.pc);
    state.registers.pc = state.registers.pc.wrapping_add(1);
    MicrocodeResponse::request(request)
}

/// Latch the low address byte and request the high one.
pub(crate) fn operand_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    let request = BusRequest::read(state.registers.pc);
    state.registers.pc = state.registers.pc.wrapping_add(1);
    MicrocodeResponse::request(request)
}

/// Latch the high address byte and read from the assembled address.
pub(crate) fn effective_address(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.hi = response.data;
    MicrocodeResponse::request(BusRequest::read(state.effective_address()))
}

/// Read from the already-assembled effective address. Doubles as the
/// page-crossing fixup: the step that detected the carry has corrected `hi`
/// by the time this runs.
pub(crate) fn read_effective_address(
    state: &mut State,
    _response: BusResponse,
) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::read(state.effective_address()))
}

/// Latch a zero-page address and read from it.
pub(crate) fn zero_page_address(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    state.hi = 0x00;
    MicrocodeResponse::request(BusRequest::read(state.effective_address()))
}

fn zero_page_index(state: &mut State, response: BusResponse, index: u8) -> MicrocodeResponse {
    state.lo = response.data;
    state.hi = 0x00;
    // The hardware spends this cycle reading the un-indexed address while the
    // add happens; the data is discarded. The sum wraps within page zero.
    let request = BusRequest::read(state.effective_address());
    state.lo = state.lo.wrapping_add(index);
    MicrocodeResponse::request(request)
}

pub(crate) fn zero_page_index_x(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let index = state.registers.x;
    zero_page_index(state, response, index)
}

pub(crate) fn zero_page_index_y(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let index = state.registers.y;
    zero_page_index(state, response, index)
}

fn effective_address_indexed(
    state: &mut State,
    response: BusResponse,
    index: u8,
) -> MicrocodeResponse {
    state.hi = response.data;
    let (low, crossed) = state.lo.overflowing_add(index);
    state.lo = low;

    // This cycle reads `old_hi:new_lo`. Without a carry that address is
    // already correct and the operation runs next cycle. With a carry it is
    // the wrong page: fix the high byte and inject a re-read, pushing the
    // operation out by one cycle.
    let request = BusRequest::read(state.effective_address());
    if crossed {
        state.hi = state.hi.wrapping_add(1);
        MicrocodeResponse::inject(request, read_effective_address)
    } else {
        MicrocodeResponse::request(request)
    }
}

pub(crate) fn effective_address_x(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let index = state.registers.x;
    effective_address_indexed(state, response, index)
}

pub(crate) fn effective_address_y(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    let index = state.registers.y;
    effective_address_indexed(state, response, index)
}

fn effective_address_indexed_always(
    state: &mut State,
    response: BusResponse,
    index: u8,
) -> MicrocodeResponse {
    state.hi = response.data;
    let (low, crossed) = state.lo.overflowing_add(index);
    state.lo = low;

    // Stores and read-modify-writes always burn this cycle on the
    // wrong-or-right address read; the high byte is corrected in place so the
    // following step can use the effective address directly.
    let request = BusRequest::read(state.effective_address());
    if crossed {
        state.hi = state.hi.wrapping_add(1);
    }
    MicrocodeResponse::request(request)
}

pub(crate) fn effective_address_x_always(
    state: &mut State,
    response: BusResponse,
) -> MicrocodeResponse {
    let index = state.registers.x;
    effective_address_indexed_always(state, response, index)
}

pub(crate) fn effective_address_y_always(
    state: &mut State,
    response: BusResponse,
) -> MicrocodeResponse {
    let index = state.registers.y;
    effective_address_indexed_always(state, response, index)
}

/// Latch the zero-page pointer and read from it. For `($zp,X)` this read is
/// the discarded un-indexed access; for `($zp),Y` it fetches the target's low
/// byte.
pub(crate) fn indirect_pointer(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.operand = response.data;
    MicrocodeResponse::request(BusRequest::read(state.operand as u16))
}

/// Add `X` to the pointer (page-zero wrap) and read the target's low byte.
pub(crate) fn indirect_x_index(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.operand = state.operand.wrapping_add(state.registers.x);
    MicrocodeResponse::request(BusRequest::read(state.operand as u16))
}

/// Latch the target's low byte and read its high byte from the next pointer
/// cell, wrapping within page zero.
pub(crate) fn indirect_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    MicrocodeResponse::request(BusRequest::read(state.operand.wrapping_add(1) as u16))
}
