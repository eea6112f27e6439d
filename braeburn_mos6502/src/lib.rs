pub mod mos6502;

pub use mos6502::{
    disassemble, Address, AddressingMode, Bus, BusRequest, BusResponse, Control, Error, Opcode,
    RamBus64kb, Registers, Result, Status, StatusFlag, MOS6502,
};
