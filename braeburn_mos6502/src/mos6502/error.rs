use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The opcode byte fetched at `pc` has no entry in the decode table.
    /// Undocumented opcodes are out of scope, so hitting one means the
    /// program has jumped into data or corrupted itself.
    #[error("illegal opcode {opcode:#04x} at {pc:#06x}")]
    IllegalOpcode { opcode: u8, pc: u16 },
}
