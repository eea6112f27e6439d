use bitflags::bitflags;

use super::interrupt::RESET_VECTOR_ADDRESS;
use super::Address;

bitflags! {
    /// Control lines accompanying a bus transaction.
    ///
    /// `READ`/`SYNC` are driven by the CPU: every request carries exactly one
    /// transaction direction, and `SYNC` marks the opcode-fetch cycle (the
    /// address presented is the opcode's PC). The remaining bits mirror the
    /// chip's input pins and exist so hosts and trace tooling can speak one
    /// vocabulary.
    pub struct Control: u8 {
        const IRQ   = 0b0000_0001;
        const NMI   = 0b0000_0010;
        const READY = 0b0000_0100;
        const RESET = 0b0000_1000;
        const READ  = 0b0001_0000;
        const SYNC  = 0b0010_0000;
    }
}

/// One bus transaction, produced by the CPU every tick.
///
/// A request is either a read of `address` or a write of `data` to `address`,
/// never both and never neither. The host performs the transaction and feeds
/// the result back as the [`BusResponse`] of the next tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BusRequest {
    pub address: Address,
    pub data: u8,
    pub control: Control,
}

impl BusRequest {
    pub fn read(address: Address) -> BusRequest {
        BusRequest {
            address,
            data: 0,
            control: Control::READ,
        }
    }

    pub fn write(address: Address, data: u8) -> BusRequest {
        BusRequest {
            address,
            data,
            control: Control::empty(),
        }
    }

    /// An opcode fetch: a read with `SYNC` raised.
    pub fn fetch(address: Address) -> BusRequest {
        BusRequest {
            address,
            data: 0,
            control: Control::READ | Control::SYNC,
        }
    }

    pub fn is_read(&self) -> bool {
        self.control.contains(Control::READ)
    }

    pub fn is_write(&self) -> bool {
        !self.is_read()
    }

    pub fn is_sync(&self) -> bool {
        self.control.contains(Control::SYNC)
    }
}

impl Default for BusRequest {
    fn default() -> BusRequest {
        BusRequest::read(0x0000)
    }
}

/// The host's answer to the previous tick's request.
///
/// `ready = false` is a wait-state: the CPU will re-issue the same request on
/// the next tick. Hosts without a wait-state policy always answer `true`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BusResponse {
    pub data: u8,
    pub ready: bool,
}

impl BusResponse {
    pub fn new(data: u8) -> BusResponse {
        BusResponse { data, ready: true }
    }
}

impl Default for BusResponse {
    fn default() -> BusResponse {
        BusResponse {
            data: 0,
            ready: true,
        }
    }
}

pub trait Bus {
    fn write_u8(&mut self, address: Address, data: u8);

    fn read_u8(&self, address: Address) -> u8;

    /// Read a `u16` from the bus from `address`. Assumes the values are in _little endian_ order.
    fn read_u16(&self, address: Address) -> u16 {
        let lo = self.read_u8(address);
        let hi = self.read_u8(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Write a `u16` to the bus starting at `address` in _little endian_ order.
    fn write_u16(&mut self, address: Address, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_u8(address, lo);
        self.write_u8(address.wrapping_add(1), hi);
    }

    /// Perform the transaction a [`BusRequest`] asks for and produce the
    /// response the CPU expects on its next tick.
    fn respond(&mut self, request: &BusRequest) -> BusResponse {
        if request.is_read() {
            BusResponse::new(self.read_u8(request.address))
        } else {
            self.write_u8(request.address, request.data);
            BusResponse::new(request.data)
        }
    }
}

/// A flat 64 KiB RAM covering the whole address space.
///
/// This is the memory model for the Klaus functional images and for tests;
/// real hosts decode the address space into devices instead.
pub struct RamBus64kb {
    pub memory: [u8; RamBus64kb::SIZE],
}

impl RamBus64kb {
    /// With a 16-bit address bus we can address 65536 bytes in total.
    pub const SIZE: usize = 65536;

    pub fn new() -> RamBus64kb {
        RamBus64kb {
            memory: [0; RamBus64kb::SIZE],
        }
    }

    /// Place `bytes` at `start` and point the reset vector at it.
    pub fn with_program(self, start: Address, bytes: &[u8]) -> RamBus64kb {
        self.with_memory_at(start, bytes).with_reset_vector(start)
    }

    pub fn with_memory_at(mut self, start: Address, bytes: &[u8]) -> RamBus64kb {
        let start = start as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn with_reset_vector(mut self, address: Address) -> RamBus64kb {
        self.write_u16(RESET_VECTOR_ADDRESS, address);
        self
    }
}

impl Default for RamBus64kb {
    fn default() -> RamBus64kb {
        RamBus64kb::new()
    }
}

impl Bus for RamBus64kb {
    fn write_u8(&mut self, address: Address, data: u8) {
        self.memory[address as usize] = data;
    }

    fn read_u8(&self, address: Address) -> u8 {
        self.memory[address as usize]
    }
}
