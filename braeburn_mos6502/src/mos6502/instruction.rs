use super::addressing_mode::{self as addressing, AddressingMode};
use super::microcode::Microcode;
use super::opcode::Opcode;
use super::operations as ops;

use super::addressing_mode::AddressingMode::*;
use super::opcode::Opcode::*;

/// One decode-table slot: the opcode byte, its mnemonic and addressing-mode
/// tags, and the instruction's full microcode sequence — the addressing-mode
/// prefix concatenated with the operation's own steps at table-construction
/// time.
#[derive(Clone, Copy)]
pub struct Instruction {
    opcode: u8,
    mnemonic: Opcode,
    addressing_mode: AddressingMode,
    pub(crate) steps: [Option<Microcode>; Instruction::MAX_STEPS],
}

impl Instruction {
    /// No documented instruction needs more than seven cycles after its
    /// opcode fetch.
    pub const MAX_STEPS: usize = 7;

    /// Concatenate an addressing prefix with the operation's steps. Indexing
    /// past the array here fails const evaluation, so an oversized row is a
    /// compile error rather than a runtime surprise.
    const fn with_steps(
        opcode: u8,
        mnemonic: Opcode,
        addressing_mode: AddressingMode,
        prefix: &[Microcode],
        operation: &[Microcode],
    ) -> Instruction {
        let mut steps: [Option<Microcode>; Instruction::MAX_STEPS] =
            [None; Instruction::MAX_STEPS];

        let mut index = 0;
        let mut i = 0;
        while i < prefix.len() {
            steps[index] = Some(prefix[i]);
            index += 1;
            i += 1;
        }

        let mut j = 0;
        while j < operation.len() {
            steps[index] = Some(operation[j]);
            index += 1;
            j += 1;
        }

        Instruction {
            opcode,
            mnemonic,
            addressing_mode,
            steps,
        }
    }

    /// An operation that reads its operand: the prefix ends with the
    /// effective-address read and `operation` consumes the data.
    const fn read(
        opcode: u8,
        mnemonic: Opcode,
        addressing_mode: AddressingMode,
        operation: &[Microcode],
    ) -> Instruction {
        Instruction::with_steps(
            opcode,
            mnemonic,
            addressing_mode,
            addressing_mode.read_steps(),
            operation,
        )
    }

    /// An operation that writes its operand: the prefix stops once the
    /// effective address is known and `operation` issues the write.
    const fn store(
        opcode: u8,
        mnemonic: Opcode,
        addressing_mode: AddressingMode,
        operation: &[Microcode],
    ) -> Instruction {
        Instruction::with_steps(
            opcode,
            mnemonic,
            addressing_mode,
            addressing_mode.store_steps(),
            operation,
        )
    }

    /// A read-modify-write memory operation: read, write the old value back,
    /// then write the result of `modify`.
    const fn modify(
        opcode: u8,
        mnemonic: Opcode,
        addressing_mode: AddressingMode,
        modify: Microcode,
    ) -> Instruction {
        Instruction::with_steps(
            opcode,
            mnemonic,
            addressing_mode,
            addressing_mode.rmw_steps(),
            &[ops::rmw_write_back, modify],
        )
    }

    /// An instruction that owns its whole cycle sequence (implied and
    /// accumulator operations, stack pushes and pulls, jumps, BRK).
    const fn control(
        opcode: u8,
        mnemonic: Opcode,
        addressing_mode: AddressingMode,
        operation: &[Microcode],
    ) -> Instruction {
        Instruction::with_steps(opcode, mnemonic, addressing_mode, &[], operation)
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn mnemonic(&self) -> Opcode {
        self.mnemonic
    }

    pub fn addressing_mode(&self) -> AddressingMode {
        self.addressing_mode
    }
}

pub(crate) fn decode(opcode: u8) -> Option<&'static Instruction> {
    INSTRUCTIONS[opcode as usize].as_ref()
}

/// The 256-slot decode table, all documented opcodes. Unpopulated slots are
/// decode errors: undocumented opcodes are out of scope.
#[rustfmt::skip]
static INSTRUCTIONS: [Option<Instruction>; 256] = [
    /*0x00*/ Some(Instruction::control(0x00, BRK, Implied, &[ops::brk_pad, ops::brk_push_pch, ops::brk_push_pcl, ops::brk_push_status, ops::brk_vector_low, ops::brk_vector_high, ops::brk_jump])),
    /*0x01*/ Some(Instruction::read(0x01, ORA, IndexedIndirect, &[ops::ora])),
    /*0x02*/ None,
    /*0x03*/ None,
    /*0x04*/ None,
    /*0x05*/ Some(Instruction::read(0x05, ORA, ZeroPage, &[ops::ora])),
    /*0x06*/ Some(Instruction::modify(0x06, ASL, ZeroPage, ops::asl_memory)),
    /*0x07*/ None,
    /*0x08*/ Some(Instruction::control(0x08, PHP, Implied, &[ops::php])),
    /*0x09*/ Some(Instruction::read(0x09, ORA, Immediate, &[ops::ora])),
    /*0x0A*/ Some(Instruction::control(0x0A, ASL, Accumulator, &[ops::asl_accumulator])),
    /*0x0B*/ None,
    /*0x0C*/ None,
    /*0x0D*/ Some(Instruction::read(0x0D, ORA, Absolute, &[ops::ora])),
    /*0x0E*/ Some(Instruction::modify(0x0E, ASL, Absolute, ops::asl_memory)),
    /*0x0F*/ None,
    /*0x10*/ Some(Instruction::read(0x10, BPL, Relative, &[ops::bpl])),
    /*0x11*/ Some(Instruction::read(0x11, ORA, IndirectIndexed, &[ops::ora])),
    /*0x12*/ None,
    /*0x13*/ None,
    /*0x14*/ None,
    /*0x15*/ Some(Instruction::read(0x15, ORA, ZeroPageX, &[ops::ora])),
    /*0x16*/ Some(Instruction::modify(0x16, ASL, ZeroPageX, ops::asl_memory)),
    /*0x17*/ None,
    /*0x18*/ Some(Instruction::control(0x18, CLC, Implied, &[ops::clc])),
    /*0x19*/ Some(Instruction::read(0x19, ORA, AbsoluteY, &[ops::ora])),
    /*0x1A*/ None,
    /*0x1B*/ None,
    /*0x1C*/ None,
    /*0x1D*/ Some(Instruction::read(0x1D, ORA, AbsoluteX, &[ops::ora])),
    /*0x1E*/ Some(Instruction::modify(0x1E, ASL, AbsoluteX, ops::asl_memory)),
    /*0x1F*/ None,
    /*0x20*/ Some(Instruction::control(0x20, JSR, Absolute, &[addressing::operand_low, ops::jsr, ops::jsr_push_pch, ops::jsr_push_pcl, ops::jsr_operand_high, ops::jsr_jump])),
    /*0x21*/ Some(Instruction::read(0x21, AND, IndexedIndirect, &[ops::and])),
    /*0x22*/ None,
    /*0x23*/ None,
    /*0x24*/ Some(Instruction::read(0x24, BIT, ZeroPage, &[ops::bit])),
    /*0x25*/ Some(Instruction::read(0x25, AND, ZeroPage, &[ops::and])),
    /*0x26*/ Some(Instruction::modify(0x26, ROL, ZeroPage, ops::rol_memory)),
    /*0x27*/ None,
    /*0x28*/ Some(Instruction::control(0x28, PLP, Implied, &[ops::plp])),
    /*0x29*/ Some(Instruction::read(0x29, AND, Immediate, &[ops::and])),
    /*0x2A*/ Some(Instruction::control(0x2A, ROL, Accumulator, &[ops::rol_accumulator])),
    /*0x2B*/ None,
    /*0x2C*/ Some(Instruction::read(0x2C, BIT, Absolute, &[ops::bit])),
    /*0x2D*/ Some(Instruction::read(0x2D, AND, Absolute, &[ops::and])),
    /*0x2E*/ Some(Instruction::modify(0x2E, ROL, Absolute, ops::rol_memory)),
    /*0x2F*/ None,
    /*0x30*/ Some(Instruction::read(0x30, BMI, Relative, &[ops::bmi])),
    /*0x31*/ Some(Instruction::read(0x31, AND, IndirectIndexed, &[ops::and])),
    /*0x32*/ None,
    /*0x33*/ None,
    /*0x34*/ None,
    /*0x35*/ Some(Instruction::read(0x35, AND, ZeroPageX, &[ops::and])),
    /*0x36*/ Some(Instruction::modify(0x36, ROL, ZeroPageX, ops::rol_memory)),
    /*0x37*/ None,
    /*0x38*/ Some(Instruction::control(0x38, SEC, Implied, &[ops::sec])),
    /*0x39*/ Some(Instruction::read(0x39, AND, AbsoluteY, &[ops::and])),
    /*0x3A*/ None,
    /*0x3B*/ None,
    /*0x3C*/ None,
    /*0x3D*/ Some(Instruction::read(0x3D, AND, AbsoluteX, &[ops::and])),
    /*0x3E*/ Some(Instruction::modify(0x3E, ROL, AbsoluteX, ops::rol_memory)),
    /*0x3F*/ None,
    /*0x40*/ Some(Instruction::control(0x40, RTI, Implied, &[ops::rti, ops::rti_stack, ops::rti_pull_status, ops::rti_pull_pcl, ops::rti_pull_pch, ops::rti_jump])),
    /*0x41*/ Some(Instruction::read(0x41, EOR, IndexedIndirect, &[ops::eor])),
    /*0x42*/ None,
    /*0x43*/ None,
    /*0x44*/ None,
    /*0x45*/ Some(Instruction::read(0x45, EOR, ZeroPage, &[ops::eor])),
    /*0x46*/ Some(Instruction::modify(0x46, LSR, ZeroPage, ops::lsr_memory)),
    /*0x47*/ None,
    /*0x48*/ Some(Instruction::control(0x48, PHA, Implied, &[ops::pha])),
    /*0x49*/ Some(Instruction::read(0x49, EOR, Immediate, &[ops::eor])),
    /*0x4A*/ Some(Instruction::control(0x4A, LSR, Accumulator, &[ops::lsr_accumulator])),
    /*0x4B*/ None,
    /*0x4C*/ Some(Instruction::control(0x4C, JMP, Absolute, &[addressing::operand_low, addressing::operand_high, ops::jmp_absolute])),
    /*0x4D*/ Some(Instruction::read(0x4D, EOR, Absolute, &[ops::eor])),
    /*0x4E*/ Some(Instruction::modify(0x4E, LSR, Absolute, ops::lsr_memory)),
    /*0x4F*/ None,
    /*0x50*/ Some(Instruction::read(0x50, BVC, Relative, &[ops::bvc])),
    /*0x51*/ Some(Instruction::read(0x51, EOR, IndirectIndexed, &[ops::eor])),
    /*0x52*/ None,
    /*0x53*/ None,
    /*0x54*/ None,
    /*0x55*/ Some(Instruction::read(0x55, EOR, ZeroPageX, &[ops::eor])),
    /*0x56*/ Some(Instruction::modify(0x56, LSR, ZeroPageX, ops::lsr_memory)),
    /*0x57*/ None,
    /*0x58*/ Some(Instruction::control(0x58, CLI, Implied, &[ops::cli])),
    /*0x59*/ Some(Instruction::read(0x59, EOR, AbsoluteY, &[ops::eor])),
    /*0x5A*/ None,
    /*0x5B*/ None,
    /*0x5C*/ None,
    /*0x5D*/ Some(Instruction::read(0x5D, EOR, AbsoluteX, &[ops::eor])),
    /*0x5E*/ Some(Instruction::modify(0x5E, LSR, AbsoluteX, ops::lsr_memory)),
    /*0x5F*/ None,
    /*0x60*/ Some(Instruction::control(0x60, RTS, Implied, &[ops::rts, ops::rts_stack, ops::rts_pull_pcl, ops::rts_pull_pch, ops::rts_increment])),
    /*0x61*/ Some(Instruction::read(0x61, ADC, IndexedIndirect, &[ops::adc])),
    /*0x62*/ None,
    /*0x63*/ None,
    /*0x64*/ None,
    /*0x65*/ Some(Instruction::read(0x65, ADC, ZeroPage, &[ops::adc])),
    /*0x66*/ Some(Instruction::modify(0x66, ROR, ZeroPage, ops::ror_memory)),
    /*0x67*/ None,
    /*0x68*/ Some(Instruction::control(0x68, PLA, Implied, &[ops::pla])),
    /*0x69*/ Some(Instruction::read(0x69, ADC, Immediate, &[ops::adc])),
    /*0x6A*/ Some(Instruction::control(0x6A, ROR, Accumulator, &[ops::ror_accumulator])),
    /*0x6B*/ None,
    /*0x6C*/ Some(Instruction::control(0x6C, JMP, Indirect, &[addressing::operand_low, addressing::operand_high, addressing::effective_address, ops::jmp_indirect_high, ops::jmp_indirect])),
    /*0x6D*/ Some(Instruction::read(0x6D, ADC, Absolute, &[ops::adc])),
    /*0x6E*/ Some(Instruction::modify(0x6E, ROR, Absolute, ops::ror_memory)),
    /*0x6F*/ None,
    /*0x70*/ Some(Instruction::read(0x70, BVS, Relative, &[ops::bvs])),
    /*0x71*/ Some(Instruction::read(0x71, ADC, IndirectIndexed, &[ops::adc])),
    /*0x72*/ None,
    /*0x73*/ None,
    /*0x74*/ None,
    /*0x75*/ Some(Instruction::read(0x75, ADC, ZeroPageX, &[ops::adc])),
    /*0x76*/ Some(Instruction::modify(0x76, ROR, ZeroPageX, ops::ror_memory)),
    /*0x77*/ None,
    /*0x78*/ Some(Instruction::control(0x78, SEI, Implied, &[ops::sei])),
    /*0x79*/ Some(Instruction::read(0x79, ADC, AbsoluteY, &[ops::adc])),
    /*0x7A*/ None,
    /*0x7B*/ None,
    /*0x7C*/ None,
    /*0x7D*/ Some(Instruction::read(0x7D, ADC, AbsoluteX, &[ops::adc])),
    /*0x7E*/ Some(Instruction::modify(0x7E, ROR, AbsoluteX, ops::ror_memory)),
    /*0x7F*/ None,
    /*0x80*/ None,
    /*0x81*/ Some(Instruction::store(0x81, STA, IndexedIndirect, &[ops::sta_with_high])),
    /*0x82*/ None,
    /*0x83*/ None,
    /*0x84*/ Some(Instruction::store(0x84, STY, ZeroPage, &[ops::sty_zero_page])),
    /*0x85*/ Some(Instruction::store(0x85, STA, ZeroPage, &[ops::sta_zero_page])),
    /*0x86*/ Some(Instruction::store(0x86, STX, ZeroPage, &[ops::stx_zero_page])),
    /*0x87*/ None,
    /*0x88*/ Some(Instruction::control(0x88, DEY, Implied, &[ops::dey])),
    /*0x89*/ None,
    /*0x8A*/ Some(Instruction::control(0x8A, TXA, Implied, &[ops::txa])),
    /*0x8B*/ None,
    /*0x8C*/ Some(Instruction::store(0x8C, STY, Absolute, &[ops::sty_with_high])),
    /*0x8D*/ Some(Instruction::store(0x8D, STA, Absolute, &[ops::sta_with_high])),
    /*0x8E*/ Some(Instruction::store(0x8E, STX, Absolute, &[ops::stx_with_high])),
    /*0x8F*/ None,
    /*0x90*/ Some(Instruction::read(0x90, BCC, Relative, &[ops::bcc])),
    /*0x91*/ Some(Instruction::store(0x91, STA, IndirectIndexed, &[ops::store_a])),
    /*0x92*/ None,
    /*0x93*/ None,
    /*0x94*/ Some(Instruction::store(0x94, STY, ZeroPageX, &[ops::store_y])),
    /*0x95*/ Some(Instruction::store(0x95, STA, ZeroPageX, &[ops::store_a])),
    /*0x96*/ Some(Instruction::store(0x96, STX, ZeroPageY, &[ops::store_x])),
    /*0x97*/ None,
    /*0x98*/ Some(Instruction::control(0x98, TYA, Implied, &[ops::tya])),
    /*0x99*/ Some(Instruction::store(0x99, STA, AbsoluteY, &[ops::store_a])),
    /*0x9A*/ Some(Instruction::control(0x9A, TXS, Implied, &[ops::txs])),
    /*0x9B*/ None,
    /*0x9C*/ None,
    /*0x9D*/ Some(Instruction::store(0x9D, STA, AbsoluteX, &[ops::store_a])),
    /*0x9E*/ None,
    /*0x9F*/ None,
    /*0xA0*/ Some(Instruction::read(0xA0, LDY, Immediate, &[ops::ldy])),
    /*0xA1*/ Some(Instruction::read(0xA1, LDA, IndexedIndirect, &[ops::lda])),
    /*0xA2*/ Some(Instruction::read(0xA2, LDX, Immediate, &[ops::ldx])),
    /*0xA3*/ None,
    /*0xA4*/ Some(Instruction::read(0xA4, LDY, ZeroPage, &[ops::ldy])),
    /*0xA5*/ Some(Instruction::read(0xA5, LDA, ZeroPage, &[ops::lda])),
    /*0xA6*/ Some(Instruction::read(0xA6, LDX, ZeroPage, &[ops::ldx])),
    /*0xA7*/ None,
    /*0xA8*/ Some(Instruction::control(0xA8, TAY, Implied, &[ops::tay])),
    /*0xA9*/ Some(Instruction::read(0xA9, LDA, Immediate, &[ops::lda])),
    /*0xAA*/ Some(Instruction::control(0xAA, TAX, Implied, &[ops::tax])),
    /*0xAB*/ None,
    /*0xAC*/ Some(Instruction::read(0xAC, LDY, Absolute, &[ops::ldy])),
    /*0xAD*/ Some(Instruction::read(0xAD, LDA, Absolute, &[ops::lda])),
    /*0xAE*/ Some(Instruction::read(0xAE, LDX, Absolute, &[ops::ldx])),
    /*0xAF*/ None,
    /*0xB0*/ Some(Instruction::read(0xB0, BCS, Relative, &[ops::bcs])),
    /*0xB1*/ Some(Instruction::read(0xB1, LDA, IndirectIndexed, &[ops::lda])),
    /*0xB2*/ None,
    /*0xB3*/ None,
    /*0xB4*/ Some(Instruction::read(0xB4, LDY, ZeroPageX, &[ops::ldy])),
    /*0xB5*/ Some(Instruction::read(0xB5, LDA, ZeroPageX, &[ops::lda])),
    /*0xB6*/ Some(Instruction::read(0xB6, LDX, ZeroPageY, &[ops::ldx])),
    /*0xB7*/ None,
    /*0xB8*/ Some(Instruction::control(0xB8, CLV, Implied, &[ops::clv])),
    /*0xB9*/ Some(Instruction::read(0xB9, LDA, AbsoluteY, &[ops::lda])),
    /*0xBA*/ Some(Instruction::control(0xBA, TSX, Implied, &[ops::tsx])),
    /*0xBB*/ None,
    /*0xBC*/ Some(Instruction::read(0xBC, LDY, AbsoluteX, &[ops::ldy])),
    /*0xBD*/ Some(Instruction::read(0xBD, LDA, AbsoluteX, &[ops::lda])),
    /*0xBE*/ Some(Instruction::read(0xBE, LDX, AbsoluteY, &[ops::ldx])),
    /*0xBF*/ None,
    /*0xC0*/ Some(Instruction::read(0xC0, CPY, Immediate, &[ops::cpy])),
    /*0xC1*/ Some(Instruction::read(0xC1, CMP, IndexedIndirect, &[ops::cmp])),
    /*0xC2*/ None,
    /*0xC3*/ None,
    /*0xC4*/ Some(Instruction::read(0xC4, CPY, ZeroPage, &[ops::cpy])),
    /*0xC5*/ Some(Instruction::read(0xC5, CMP, ZeroPage, &[ops::cmp])),
    /*0xC6*/ Some(Instruction::modify(0xC6, DEC, ZeroPage, ops::dec_memory)),
    /*0xC7*/ None,
    /*0xC8*/ Some(Instruction::control(0xC8, INY, Implied, &[ops::iny])),
    /*0xC9*/ Some(Instruction::read(0xC9, CMP, Immediate, &[ops::cmp])),
    /*0xCA*/ Some(Instruction::control(0xCA, DEX, Implied, &[ops::dex])),
    /*0xCB*/ None,
    /*0xCC*/ Some(Instruction::read(0xCC, CPY, Absolute, &[ops::cpy])),
    /*0xCD*/ Some(Instruction::read(0xCD, CMP, Absolute, &[ops::cmp])),
    /*0xCE*/ Some(Instruction::modify(0xCE, DEC, Absolute, ops::dec_memory)),
    /*0xCF*/ None,
    /*0xD0*/ Some(Instruction::read(0xD0, BNE, Relative, &[ops::bne])),
    /*0xD1*/ Some(Instruction::read(0xD1, CMP, IndirectIndexed, &[ops::cmp])),
    /*0xD2*/ None,
    /*0xD3*/ None,
    /*0xD4*/ None,
    /*0xD5*/ Some(Instruction::read(0xD5, CMP, ZeroPageX, &[ops::cmp])),
    /*0xD6*/ Some(Instruction::modify(0xD6, DEC, ZeroPageX, ops::dec_memory)),
    /*0xD7*/ None,
    /*0xD8*/ Some(Instruction::control(0xD8, CLD, Implied, &[ops::cld])),
    /*0xD9*/ Some(Instruction::read(0xD9, CMP, AbsoluteY, &[ops::cmp])),
    /*0xDA*/ None,
    /*0xDB*/ None,
    /*0xDC*/ None,
    /*0xDD*/ Some(Instruction::read(0xDD, CMP, AbsoluteX, &[ops::cmp])),
    /*0xDE*/ Some(Instruction::modify(0xDE, DEC, AbsoluteX, ops::dec_memory)),
    /*0xDF*/ None,
    /*0xE0*/ Some(Instruction::read(0xE0, CPX, Immediate, &[ops::cpx])),
    /*0xE1*/ Some(Instruction::read(0xE1, SBC, IndexedIndirect, &[ops::sbc])),
    /*0xE2*/ None,
    /*0xE3*/ None,
    /*0xE4*/ Some(Instruction::read(0xE4, CPX, ZeroPage, &[ops::cpx])),
    /*0xE5*/ Some(Instruction::read(0xE5, SBC, ZeroPage, &[ops::sbc])),
    /*0xE6*/ Some(Instruction::modify(0xE6, INC, ZeroPage, ops::inc_memory)),
    /*0xE7*/ None,
    /*0xE8*/ Some(Instruction::control(0xE8, INX, Implied, &[ops::inx])),
    /*0xE9*/ Some(Instruction::read(0xE9, SBC, Immediate, &[ops::sbc])),
    /*0xEA*/ Some(Instruction::control(0xEA, NOP, Implied, &[ops::nop])),
    /*0xEB*/ None,
    /*0xEC*/ Some(Instruction::read(0xEC, CPX, Absolute, &[ops::cpx])),
    /*0xED*/ Some(Instruction::read(0xED, SBC, Absolute, &[ops::sbc])),
    /*0xEE*/ Some(Instruction::modify(0xEE, INC, Absolute, ops::inc_memory)),
    /*0xEF*/ None,
    /*0xF0*/ Some(Instruction::read(0xF0, BEQ, Relative, &[ops::beq])),
    /*0xF1*/ Some(Instruction::read(0xF1, SBC, IndirectIndexed, &[ops::sbc])),
    /*0xF2*/ None,
    /*0xF3*/ None,
    /*0xF4*/ None,
    /*0xF5*/ Some(Instruction::read(0xF5, SBC, ZeroPageX, &[ops::sbc])),
    /*0xF6*/ Some(Instruction::modify(0xF6, INC, ZeroPageX, ops::inc_memory)),
    /*0xF7*/ None,
    /*0xF8*/ Some(Instruction::control(0xF8, SED, Implied, &[ops::sed])),
    /*0xF9*/ Some(Instruction::read(0xF9, SBC, AbsoluteY, &[ops::sbc])),
    /*0xFA*/ None,
    /*0xFB*/ None,
    /*0xFC*/ None,
    /*0xFD*/ Some(Instruction::read(0xFD, SBC, AbsoluteX, &[ops::sbc])),
    /*0xFE*/ Some(Instruction::modify(0xFE, INC, AbsoluteX, ops::inc_memory)),
    /*0xFF*/ None,
];
