//! TAP reporter - stream test outcomes in Test Anything Protocol format
//!
//! The reporter announces its plan when created and then moves from
//! `Initialized` to `Reporting` on the first outcome; it never goes back.
//! Emitted outcomes are counted so a plan that does not match what was
//! run is surfaced by [`TapReporter::finish`].

use crate::testing::runner::{TestResult, TestRun};
use std::io::{self, Write};
use thiserror::Error;

/// Number of trailing output lines echoed as diagnostics for a failure
const DIAGNOSTIC_TAIL: usize = 20;

/// Reporter errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write TAP output: {0}")]
    Io(#[from] io::Error),

    #[error("Planned {planned} tests but reported {emitted}")]
    PlanMismatch { planned: usize, emitted: usize },
}

/// Reporter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    /// Plan announced, nothing reported yet
    Initialized,
    /// At least one outcome reported
    Reporting,
}

/// Counts returned once the stream is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapTotals {
    pub planned: usize,
    pub emitted: usize,
    pub failed: usize,
}

/// Streaming TAP writer
pub struct TapReporter<W: Write> {
    out: W,
    state: ReporterState,
    planned: usize,
    emitted: usize,
    failed: usize,
}

impl<W: Write> TapReporter<W> {
    /// Write the TAP header and plan for `planned` tests
    pub fn new(mut out: W, planned: usize) -> Result<Self, ReportError> {
        writeln!(out, "TAP version 13")?;
        writeln!(out, "1..{}", planned)?;
        out.flush()?;
        Ok(Self {
            out,
            state: ReporterState::Initialized,
            planned,
            emitted: 0,
            failed: 0,
        })
    }

    /// Current state
    pub fn state(&self) -> ReporterState {
        self.state
    }

    /// Number of outcomes written so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Write one outcome line, plus diagnostics for failures
    pub fn report(&mut self, run: &TestRun) -> Result<(), ReportError> {
        self.state = ReporterState::Reporting;
        self.emitted += 1;
        let title = escape(&run.title());

        match &run.result {
            TestResult::Pass { .. } => {
                writeln!(self.out, "ok {} - {}", self.emitted, title)?;
            }
            TestResult::Fail {
                description,
                detail,
                ..
            } => {
                self.failed += 1;
                writeln!(
                    self.out,
                    "not ok {} - {} # {}",
                    self.emitted, title, description
                )?;
                let lines: Vec<&str> = detail.lines().collect();
                let skip = lines.len().saturating_sub(DIAGNOSTIC_TAIL);
                for line in &lines[skip..] {
                    self.diagnostic(line)?;
                }
            }
        }

        self.out.flush()?;
        Ok(())
    }

    /// Write a `#` comment line
    pub fn diagnostic(&mut self, message: &str) -> Result<(), ReportError> {
        writeln!(self.out, "# {}", message)?;
        Ok(())
    }

    /// Abort the stream; consumers treat the run as failed
    pub fn bail_out(&mut self, reason: &str) -> Result<(), ReportError> {
        let reason = reason.lines().next().unwrap_or_default();
        writeln!(self.out, "Bail out! {}", reason)?;
        self.out.flush()?;
        Ok(())
    }

    /// Close the stream and check the plan against what was reported
    pub fn finish(mut self) -> Result<TapTotals, ReportError> {
        if self.emitted != self.planned {
            self.diagnostic(&format!(
                "Looks like you planned {} tests but ran {}.",
                self.planned, self.emitted
            ))?;
            self.out.flush()?;
            return Err(ReportError::PlanMismatch {
                planned: self.planned,
                emitted: self.emitted,
            });
        }
        self.out.flush()?;
        Ok(TapTotals {
            planned: self.planned,
            emitted: self.emitted,
            failed: self.failed,
        })
    }
}

/// Escape characters with meaning in a TAP description
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('#', "\\#")
}
