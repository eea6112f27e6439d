use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

/// Outcome of one fixture case. An empty `reasons` list means it passed.
#[derive(Debug)]
pub struct CaseResult {
    pub name: String,
    pub reasons: Vec<String>,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// One failing case as it appears in the `--json` report: the case name and
/// a single summary string of everything that mismatched.
#[derive(Serialize, Debug)]
pub struct Failure {
    pub name: String,
    pub reason: String,
}

/// Aggregated suite outcome, printable and serializable for `--json` as
/// `{passed, failed, failures: [{name, reason}]}`.
#[derive(Serialize, Debug, Default)]
pub struct Report {
    pub passed: usize,
    pub failed: usize,
    pub failures: Vec<Failure>,
}

/// How many failures get their detail printed before the rest are
/// summarized; fixture files carry thousands of cases per opcode.
const DETAILED_FAILURES: usize = 20;

impl Report {
    pub fn new() -> Report {
        Report::default()
    }

    pub fn record(&mut self, result: CaseResult) {
        if result.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
            self.failures.push(Failure {
                name: result.name,
                reason: result.reasons.join("; "),
            });
        }
    }

    pub fn print_summary(&self) {
        for failure in self.failures.iter().take(DETAILED_FAILURES) {
            println!("{} {}", "FAIL".red().bold(), failure.name);
            println!("    {}", failure.reason);
        }
        if self.failures.len() > DETAILED_FAILURES {
            println!(
                "... and {} more failing cases",
                self.failures.len() - DETAILED_FAILURES
            );
        }

        let verdict = if self.failed == 0 {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!(
            "{} {} passed, {} failed, {} total",
            verdict,
            self.passed,
            self.failed,
            self.passed + self.failed
        );
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing report")?;
        fs::write(path, text).with_context(|| format!("writing report to {}", path.display()))?;
        Ok(())
    }
}
