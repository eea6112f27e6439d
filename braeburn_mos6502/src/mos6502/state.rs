use super::status::{Status, StatusFlag};
use super::Address;

/// The stack lives on page 1: `sp` is the low byte of an address in
/// `0x0100..=0x01FF`.
pub(crate) const STACK_PAGE: Address = 0x0100;

/// The visible register file: everything a conformance snapshot compares.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Registers {
    /// `pc` is the program counter. It points at the next byte to fetch; at
    /// the instant a SYNC read is issued it already points one past the
    /// opcode byte.
    pub pc: Address,

    /// `a` is the accumulator, the primary storage point for the machine and
    /// the place intermediate results usually live.
    pub a: u8,

    /// An 8-bit index register, mainly used for counters and memory offsets.
    pub x: u8,

    /// An 8-bit index register, mainly used for counters and memory offsets.
    pub y: u8,

    /// `sp` is the stack pointer, the low byte of a page-1 address. The 6502
    /// uses a _descending_ stack: pushes decrement, pulls increment.
    pub sp: u8,

    pub p: Status,
}

impl Registers {
    pub fn new() -> Registers {
        Registers {
            pc: 0,
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            p: Status::default(),
        }
    }
}

impl Default for Registers {
    fn default() -> Registers {
        Registers::new()
    }
}

/// Full CPU state as microcode sees it: the register file plus the hidden
/// scratch latched between the cycles of one instruction.
///
/// `lo`/`hi`/`operand` are only meaningful while an instruction is in flight;
/// the addressing-mode prologue clears them. They are never part of the
/// register snapshot the conformance suite inspects.
#[derive(Debug)]
pub(crate) struct State {
    pub registers: Registers,

    /// Low byte of the effective address being assembled.
    pub lo: u8,
    /// High byte of the effective address being assembled.
    pub hi: u8,
    /// Operand byte latched for the second half of read-modify-write
    /// operations, and pointer scratch for the indirect modes.
    pub operand: u8,

    /// Level of the IRQ input, sampled at the last cycle of each instruction.
    pub irq_line: bool,
    /// Level of the NMI input, kept to detect edges.
    pub nmi_line: bool,
    /// Set on an asserting edge of the NMI input, consumed when the interrupt
    /// sequence starts.
    pub nmi_pending: bool,

    /// PC recorded by self-loop detection (branch-to-self, jump-to-self),
    /// consumed by the CPU facade after the tick.
    pub trap: Option<Address>,
}

impl State {
    pub fn new() -> State {
        State {
            registers: Registers::new(),
            lo: 0,
            hi: 0,
            operand: 0,
            irq_line: false,
            nmi_line: false,
            nmi_pending: false,
            trap: None,
        }
    }

    /// The effective address assembled so far, `hi:lo`.
    pub fn effective_address(&self) -> Address {
        u16::from_le_bytes([self.lo, self.hi])
    }

    /// The page-1 address the stack pointer currently designates.
    pub fn stack_address(&self) -> Address {
        STACK_PAGE | self.registers.sp as Address
    }

    pub fn clear_scratch(&mut self) {
        self.lo = 0;
        self.hi = 0;
        self.operand = 0;
        self.trap = None;
    }

    pub fn has_flag(&self, flag: StatusFlag) -> bool {
        self.registers.p.get(flag)
    }

    pub fn set_flag(&mut self, flag: StatusFlag, value: bool) {
        self.registers.p.set(flag, value);
    }

    pub fn set_zn(&mut self, value: u8) {
        self.registers.p.set_zn(value);
    }
}
