//! The per-opcode single-step suite: each case gives the full pre-state,
//! the expected post-state, and the exact bus cycles of one instruction.

use std::fs;

use anyhow::{Context, Result};
use braeburn_mos6502::{disassemble, BusResponse, Status, MOS6502};
use log::{debug, info};
use serde::Deserialize;

use crate::report::{CaseResult, Report};
use crate::Args;

#[derive(Deserialize, Debug, Clone)]
pub struct Case {
    pub name: String,
    pub initial: Snapshot,
    #[serde(rename = "final")]
    pub expected: Snapshot,
    pub cycles: Vec<Cycle>,
}

/// Registers plus sparse RAM, the shape both `initial` and `final` use.
#[derive(Deserialize, Debug, Clone)]
pub struct Snapshot {
    pub pc: u16,
    pub s: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub ram: Vec<(u16, u8)>,
}

/// One expected bus transaction: address, data, `"read"` or `"write"`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Cycle(pub u16, pub u8, pub String);

/// Address/value pairs, nothing else: reads outside the seeded set mean the
/// fixture (or the CPU) went somewhere unexpected.
#[derive(Debug, Default)]
struct SparseMemory {
    cells: Vec<(u16, u8)>,
}

impl SparseMemory {
    fn seeded(ram: &[(u16, u8)]) -> SparseMemory {
        SparseMemory {
            cells: ram.to_vec(),
        }
    }

    fn get(&self, address: u16) -> Option<u8> {
        self.cells
            .iter()
            .find(|(cell, _)| *cell == address)
            .map(|(_, value)| *value)
    }

    fn read(&self, address: u16) -> u8 {
        self.get(address).unwrap_or_else(|| {
            debug!("read of unseeded address {:#06x}, returning 0x00", address);
            0x00
        })
    }

    fn write(&mut self, address: u16, value: u8) {
        match self.cells.iter_mut().find(|(cell, _)| *cell == address) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((address, value)),
        }
    }
}

pub fn run(args: &Args) -> Result<usize> {
    let text = fs::read_to_string(&args.testfile)
        .with_context(|| format!("reading {}", args.testfile.display()))?;
    let cases: Vec<Case> = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.testfile.display()))?;
    info!(
        "{}: {} single-step cases",
        args.testfile.display(),
        cases.len()
    );

    let mut report = Report::new();
    for case in &cases {
        let result = run_case(case);
        if args.verbose {
            let state = if result.passed() { "pass" } else { "FAIL" };
            println!("{}  {}  ({})", state, case.name, describe(case));
        }
        report.record(result);
    }

    report.print_summary();
    if let Some(path) = &args.json {
        report.write_json(path)?;
    }

    Ok(report.failed)
}

/// Disassemble the instruction under test from the fixture's initial RAM.
fn describe(case: &Case) -> String {
    let memory = SparseMemory::seeded(&case.initial.ram);
    let pc = case.initial.pc;
    let bytes = [
        memory.read(pc),
        memory.read(pc.wrapping_add(1)),
        memory.read(pc.wrapping_add(2)),
    ];
    disassemble(bytes, pc)
}

/// Seed the CPU and memory, drive one full instruction (SYNC to SYNC), and
/// diff registers, the cycle trace and the sparse RAM against the fixture.
pub fn run_case(case: &Case) -> CaseResult {
    let mut reasons = Vec::new();

    let mut cpu = MOS6502::new();
    {
        let registers = cpu.registers_mut();
        registers.pc = case.initial.pc;
        registers.sp = case.initial.s;
        registers.a = case.initial.a;
        registers.x = case.initial.x;
        registers.y = case.initial.y;
        registers.p = Status(case.initial.p);
    }
    let mut memory = SparseMemory::seeded(&case.initial.ram);

    let mut trace: Vec<Cycle> = Vec::new();
    let mut response = BusResponse::default();
    let mut request = match cpu.tick(response) {
        Ok(request) => request,
        Err(error) => return failed(case, vec![format!("first tick failed: {}", error)]),
    };
    if !request.is_sync() {
        return failed(case, vec!["first tick did not issue a SYNC read".into()]);
    }

    loop {
        let data = if request.is_read() {
            memory.read(request.address)
        } else {
            memory.write(request.address, request.data);
            request.data
        };
        let kind = if request.is_read() { "read" } else { "write" };
        trace.push(Cycle(request.address, data, kind.into()));
        response = BusResponse::new(data);

        request = match cpu.tick(response) {
            Ok(request) => request,
            Err(error) => return failed(case, vec![format!("decode failed: {}", error)]),
        };
        if request.is_sync() {
            break;
        }
        if trace.len() > 16 {
            return failed(case, vec!["instruction did not terminate".into()]);
        }
    }

    // Registers.
    let registers = cpu.registers();
    let expected = &case.expected;
    if registers.pc != expected.pc {
        reasons.push(format!(
            "PC expected {:#06x} got {:#06x}",
            expected.pc, registers.pc
        ));
    }
    if registers.sp != expected.s {
        reasons.push(format!(
            "S expected {:#04x} got {:#04x}",
            expected.s, registers.sp
        ));
    }
    if registers.a != expected.a {
        reasons.push(format!(
            "A expected {:#04x} got {:#04x}",
            expected.a, registers.a
        ));
    }
    if registers.x != expected.x {
        reasons.push(format!(
            "X expected {:#04x} got {:#04x}",
            expected.x, registers.x
        ));
    }
    if registers.y != expected.y {
        reasons.push(format!(
            "Y expected {:#04x} got {:#04x}",
            expected.y, registers.y
        ));
    }
    if registers.p.0 != expected.p {
        reasons.push(format!(
            "P expected {:#04x} got {:#04x}",
            expected.p, registers.p.0
        ));
    }

    // The exact cycle stream.
    if trace.len() != case.cycles.len() {
        reasons.push(format!(
            "expected {} cycles, got {}",
            case.cycles.len(),
            trace.len()
        ));
    }
    for (index, (actual, wanted)) in trace.iter().zip(case.cycles.iter()).enumerate() {
        if actual != wanted {
            reasons.push(format!(
                "cycle {}: expected {:#06x} {:#04x} {}, got {:#06x} {:#04x} {}",
                index, wanted.0, wanted.1, wanted.2, actual.0, actual.1, actual.2
            ));
        }
    }

    // Final memory: `final.ram` overlays `initial.ram`, and anything not
    // mentioned must still hold its initial value.
    let expected_memory = {
        let mut overlay = SparseMemory::seeded(&case.initial.ram);
        for &(address, value) in &case.expected.ram {
            overlay.write(address, value);
        }
        overlay
    };
    for &(address, actual) in &memory.cells {
        match expected_memory.get(address) {
            Some(value) if value == actual => {}
            Some(value) => reasons.push(format!(
                "memory {:#06x} expected {:#04x} got {:#04x}",
                address, value, actual
            )),
            None => reasons.push(format!(
                "unexpected write of {:#04x} to {:#06x}",
                actual, address
            )),
        }
    }
    for &(address, value) in &expected_memory.cells {
        if memory.get(address).is_none() {
            reasons.push(format!(
                "memory {:#06x} expected {:#04x}, never touched",
                address, value
            ));
        }
    }

    CaseResult {
        name: case.name.clone(),
        reasons,
    }
}

fn failed(case: &Case, reasons: Vec<String>) -> CaseResult {
    CaseResult {
        name: case.name.clone(),
        reasons,
    }
}
