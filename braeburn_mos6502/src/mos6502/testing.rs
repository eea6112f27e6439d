//! Shared test harness: a CPU wired to a flat 64 KiB RAM, driven one
//! instruction at a time with the full bus trace captured for cycle-exact
//! assertions.

use super::bus::{Bus, BusRequest, BusResponse, RamBus64kb};
use super::error::Error;
use super::MOS6502;

pub(crate) struct Machine {
    pub cpu: MOS6502,
    pub bus: RamBus64kb,
    response: BusResponse,
    pending: Option<BusRequest>,
}

impl Machine {
    /// A machine with `bytes` at `origin` and the CPU about to fetch from
    /// `origin` on its first tick.
    pub fn with_program(origin: u16, bytes: &[u8]) -> Machine {
        let bus = RamBus64kb::new().with_memory_at(origin, bytes);
        let mut cpu = MOS6502::new();
        cpu.registers_mut().pc = origin;
        Machine {
            cpu,
            bus,
            response: BusResponse::default(),
            pending: None,
        }
    }

    /// One raw tick: run the CPU and service its request against the RAM.
    pub fn tick(&mut self) -> BusRequest {
        let request = self.cpu.tick(self.response).expect("tick failed");
        self.response = self.bus.respond(&request);
        request
    }

    /// Run exactly one instruction and return its bus trace, opcode fetch
    /// first. The trailing SYNC belongs to the next instruction and is held
    /// back for the next call.
    ///
    /// If an interrupt is pending when the instruction completes, its entry
    /// sequence runs inside the same call and its cycles join the trace.
    pub fn step(&mut self) -> Vec<BusRequest> {
        let mut trace = Vec::new();

        let sync = match self.pending.take() {
            Some(request) => request,
            None => self.cpu.tick(self.response).expect("tick failed"),
        };
        assert!(sync.is_sync(), "instruction must start on a SYNC read");
        self.response = self.bus.respond(&sync);
        trace.push(sync);

        loop {
            let request = self.cpu.tick(self.response).expect("tick failed");
            if request.is_sync() {
                self.pending = Some(request);
                return trace;
            }
            self.response = self.bus.respond(&request);
            trace.push(request);
            assert!(trace.len() < 24, "instruction did not terminate");
        }
    }

    /// Run `count` instructions, discarding the traces.
    pub fn run(&mut self, count: usize) {
        for _ in 0..count {
            self.step();
        }
    }

    /// Drive one instruction that is expected to fail decoding.
    pub fn step_expecting_error(&mut self) -> Error {
        let sync = match self.pending.take() {
            Some(request) => request,
            None => self.cpu.tick(self.response).expect("tick failed"),
        };
        assert!(sync.is_sync(), "instruction must start on a SYNC read");
        self.response = self.bus.respond(&sync);

        match self.cpu.tick(self.response) {
            Ok(request) => panic!("expected a decode error, got {:?}", request),
            Err(error) => error,
        }
    }

    /// The SYNC request issued for the next instruction, if one is parked.
    pub fn pending_sync(&self) -> Option<BusRequest> {
        self.pending
    }
}
