//! The microcode pump: a one-tick-at-a-time scheduler over the decode
//! table's step lists.
//!
//! Priority each tick: pending injection, then decode (when the previous
//! tick's SYNC read has delivered the opcode byte), then the next step of the
//! current list, then an opcode fetch. A step that reports completion never
//! wastes its tick: the fetch — or an interrupt entry sequence — issues on
//! that same cycle.

use super::bus::{BusRequest, BusResponse};
use super::error::Error;
use super::instruction;
use super::interrupt;
use super::microcode::{Microcode, MicrocodeResponse};
use super::state::State;
use super::status::StatusFlag;
use super::Result;

const NO_STEPS: &[Option<Microcode>] = &[];

#[derive(Debug)]
pub(crate) struct Pump {
    /// One-slot queue ahead of the step cursor, set by the previous step.
    injected: Option<Microcode>,
    /// The current instruction's (or interrupt sequence's) remaining steps.
    steps: &'static [Option<Microcode>],
    cursor: usize,
    /// Set when a SYNC read went out: the next response carries the opcode.
    should_decode: bool,
    cycles_since_fetch: u8,
}

impl Pump {
    pub fn new() -> Pump {
        Pump {
            injected: None,
            steps: NO_STEPS,
            cursor: 0,
            should_decode: false,
            cycles_since_fetch: 0,
        }
    }

    /// Abandon whatever is in flight and arm the reset sequence.
    pub fn reset(&mut self) {
        self.injected = None;
        self.steps = &interrupt::RESET_SEQUENCE;
        self.cursor = 0;
        self.should_decode = false;
        self.cycles_since_fetch = 0;
    }

    /// Cycles since the current instruction was decoded; at the tick that
    /// emits the next SYNC this equals the instruction's cycle count.
    pub fn cycles_since_fetch(&self) -> u8 {
        self.cycles_since_fetch
    }

    /// Advance one cycle: pick the next microcode step, run it, and turn its
    /// answer into this tick's bus request.
    pub fn tick(&mut self, state: &mut State, response: BusResponse) -> Result<BusRequest> {
        let step = self.next_step(state, response)?;
        self.cycles_since_fetch = self.cycles_since_fetch.wrapping_add(1);

        match step(state, response) {
            MicrocodeResponse {
                request: Some(request),
                injection,
            } => {
                self.injected = injection;
                Ok(request)
            }
            MicrocodeResponse { request: None, .. } => {
                // Instruction complete: fetch (or enter an interrupt) on this
                // same tick so the final step never burns an empty cycle.
                let entry = self.next_instruction(state);
                match entry(state, response) {
                    MicrocodeResponse {
                        request: Some(request),
                        injection,
                    } => {
                        self.injected = injection;
                        Ok(request)
                    }
                    MicrocodeResponse { request: None, .. } => {
                        unreachable!("opcode fetch and interrupt entries always issue a request")
                    }
                }
            }
        }
    }

    fn next_step(&mut self, state: &mut State, response: BusResponse) -> Result<Microcode> {
        if let Some(injected) = self.injected.take() {
            return Ok(injected);
        }

        if self.should_decode {
            self.should_decode = false;
            self.cycles_since_fetch = 0;

            let opcode = response.data;
            let instruction = instruction::decode(opcode).ok_or(Error::IllegalOpcode {
                opcode,
                pc: state.registers.pc.wrapping_sub(1),
            })?;
            self.steps = &instruction.steps;
            self.cursor = 0;
        }

        if let Some(Some(step)) = self.steps.get(self.cursor) {
            self.cursor += 1;
            return Ok(*step);
        }

        Ok(self.next_instruction(state))
    }

    /// The boundary between instructions: the one place interrupts are
    /// sampled. NMI's latch wins over a held IRQ line, and IRQ is masked by
    /// the interrupt-disable flag.
    fn next_instruction(&mut self, state: &mut State) -> Microcode {
        if state.nmi_pending {
            state.nmi_pending = false;
            return self.enter_sequence(&interrupt::NMI_SEQUENCE);
        }

        if state.irq_line && !state.has_flag(StatusFlag::InterruptDisable) {
            return self.enter_sequence(&interrupt::IRQ_SEQUENCE);
        }

        self.steps = NO_STEPS;
        self.cursor = 0;
        self.should_decode = true;
        fetch_opcode
    }

    fn enter_sequence(&mut self, sequence: &'static [Option<Microcode>]) -> Microcode {
        self.steps = sequence;
        self.cursor = 1;
        match sequence.first() {
            Some(Some(step)) => *step,
            _ => unreachable!("interrupt sequences are never empty"),
        }
    }
}

/// The SYNC read that starts every instruction. The increment here is why
/// `pc` already points one past the opcode byte when the SYNC is on the bus.
fn fetch_opcode(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::fetch(state.registers.pc);
    state.registers.pc = state.registers.pc.wrapping_add(1);
    MicrocodeResponse::request(request)
}
