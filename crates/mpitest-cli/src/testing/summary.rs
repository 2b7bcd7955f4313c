//! Run summary - human readable recap and machine readable JSON

use crate::testing::runner::{TestResult, TestRun};
use colored::*;
use mpitest_config::TestAttributes;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Aggregate of a completed run
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub planned: usize,
    pub results: Vec<ResultEntry<'a>>,
}

/// One line of the summary
#[derive(Debug, Serialize)]
pub struct ResultEntry<'a> {
    pub name: &'a str,
    pub index: usize,
    pub passed: bool,
    pub description: Option<&'a str>,
    pub duration_ms: u64,
    pub attributes: &'a TestAttributes,
}

impl<'a> RunSummary<'a> {
    /// Summarize `runs` against the announced plan
    pub fn new(runs: &'a [TestRun], planned: usize) -> Self {
        let results: Vec<_> = runs
            .iter()
            .map(|run| ResultEntry {
                name: &run.test.name,
                index: run.index,
                passed: run.result.is_pass(),
                description: run.result.description(),
                duration_ms: u64::try_from(run.result.duration().as_millis()).unwrap_or(u64::MAX),
                attributes: &run.attributes,
            })
            .collect();
        let passed = results.iter().filter(|r| r.passed).count();

        Self {
            tests: results.len(),
            passed,
            failed: results.len() - passed,
            planned,
            results,
        }
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()
    }
}

/// Print the result line and the failures list
pub fn write_human<W: Write>(out: &mut W, runs: &[TestRun]) -> io::Result<()> {
    write_failures(out, runs)?;

    let total = runs.len();
    let passed = runs.iter().filter(|r| r.result.is_pass()).count();
    let failed = runs.iter().filter(|r| r.result.is_fail()).count();
    let total_duration: Duration = runs.iter().map(|r| r.result.duration()).sum();

    writeln!(out, "{}", "─".repeat(50))?;

    let status = if failed > 0 {
        "FAILED".red().bold()
    } else {
        "PASSED".green().bold()
    };

    writeln!(
        out,
        "Test result: {} | {} total, {} passed, {} failed",
        status,
        total.to_string().bold(),
        passed.to_string().green().bold(),
        if failed > 0 {
            failed.to_string().red().bold()
        } else {
            failed.to_string().normal()
        }
    )?;
    writeln!(out, "Time: {:.2?}", total_duration)
}

fn write_failures<W: Write>(out: &mut W, runs: &[TestRun]) -> io::Result<()> {
    let failures: Vec<_> = runs.iter().filter(|r| r.result.is_fail()).collect();
    if failures.is_empty() {
        return Ok(());
    }

    writeln!(out, "{}", "Failures:".red().bold())?;
    for run in failures {
        if let TestResult::Fail { description, .. } = &run.result {
            writeln!(
                out,
                "  {} {} {}",
                "●".red(),
                run.title().bold(),
                description.dimmed()
            )?;
        }
        writeln!(out, "    {}", run.test.file.display())?;
    }
    writeln!(out)
}
