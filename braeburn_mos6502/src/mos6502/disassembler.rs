use super::addressing_mode::AddressingMode;
use super::instruction;

/// Render the instruction starting at `bytes[0]` as assembly text.
///
/// `pc` is the instruction's own address and is only needed to resolve
/// branch targets. Bytes beyond the instruction's actual length are ignored,
/// so callers can always pass a three-byte window.
pub fn disassemble(bytes: [u8; 3], pc: u16) -> String {
    let instruction = match instruction::decode(bytes[0]) {
        Some(instruction) => instruction,
        None => return format!(".byte ${:02X}", bytes[0]),
    };

    let mnemonic = instruction.mnemonic();
    match instruction.addressing_mode() {
        AddressingMode::Implied => mnemonic.to_string(),
        AddressingMode::Accumulator => format!("{} A", mnemonic),
        AddressingMode::Immediate => format!("{} #${:02X}", mnemonic, bytes[1]),
        AddressingMode::ZeroPage => format!("{} ${:02X}", mnemonic, bytes[1]),
        AddressingMode::ZeroPageX => format!("{} ${:02X},X", mnemonic, bytes[1]),
        AddressingMode::ZeroPageY => format!("{} ${:02X},Y", mnemonic, bytes[1]),
        AddressingMode::Absolute => format!("{} ${:02X}{:02X}", mnemonic, bytes[2], bytes[1]),
        AddressingMode::AbsoluteX => format!("{} ${:02X}{:02X},X", mnemonic, bytes[2], bytes[1]),
        AddressingMode::AbsoluteY => format!("{} ${:02X}{:02X},Y", mnemonic, bytes[2], bytes[1]),
        AddressingMode::Indirect => format!("{} (${:02X}{:02X})", mnemonic, bytes[2], bytes[1]),
        AddressingMode::IndexedIndirect => format!("{} (${:02X},X)", mnemonic, bytes[1]),
        AddressingMode::IndirectIndexed => format!("{} (${:02X}),Y", mnemonic, bytes[1]),
        AddressingMode::Relative => {
            // Branch displacements are relative to the following instruction.
            let target = pc.wrapping_add(2).wrapping_add(bytes[1] as i8 as u16);
            format!("{} ${:04X}", mnemonic, target)
        }
    }
}
