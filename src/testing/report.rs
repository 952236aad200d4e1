//! Console reporting and the final verdict

use std::fmt;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use super::runner::{BrokenReason, Failure, RunOutcome};
use super::scenario::{PlannedTest, Scenario};

/// Run-scoped outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub broken: usize,
    pub failed: usize,
    pub successful: usize,
}

impl Tally {
    /// Count one outcome
    pub fn record(&mut self, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Success => self.successful += 1,
            RunOutcome::Failed(_) => self.failed += 1,
            RunOutcome::Broken(_) => self.broken += 1,
        }
    }

    /// Number of dispatched items
    pub fn total(&self) -> usize {
        self.broken + self.failed + self.successful
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_tally(self)
    }
}

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Failed,
    NoTestsExecuted,
    SuccessWithBroken,
    Passed,
}

impl Verdict {
    /// Decide the verdict; the checks are ordered and the first match wins
    pub fn from_tally(tally: &Tally) -> Self {
        if tally.failed > 0 {
            Verdict::Failed
        } else if tally.successful == 0 {
            Verdict::NoTestsExecuted
        } else if tally.broken > 0 {
            Verdict::SuccessWithBroken
        } else {
            Verdict::Passed
        }
    }

    /// Process exit code
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Passed => 0,
            Verdict::Failed => 1,
            Verdict::SuccessWithBroken => 2,
            Verdict::NoTestsExecuted => 3,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Failed => write!(f, "❌ FAILED"),
            Verdict::NoTestsExecuted => write!(f, "🔥 No tests executed!"),
            Verdict::SuccessWithBroken => write!(f, "⁉️ SUCCESS but some tests are broken"),
            Verdict::Passed => write!(f, "✅ PASSED"),
        }
    }
}

/// Machine-readable summary for `--json`
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    #[serde(flatten)]
    pub tally: Tally,
    pub verdict: Verdict,
    pub exit_code: i32,
}

impl From<Tally> for Summary {
    fn from(tally: Tally) -> Self {
        let verdict = tally.verdict();
        Self {
            tally,
            verdict,
            exit_code: verdict.exit_code(),
        }
    }
}

/// Console output for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that prints nothing
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    pub fn scenario_started(&self, scenario: &Scenario) {
        if self.quiet {
            return;
        }
        println!("{} {}", "▶".blue().bold(), scenario.description.white().bold());
        println!("{}\n", "〰".repeat(80).dimmed());
    }

    /// Show the in-place "running" line for a dispatchable item
    pub fn test_started(&self, planned: &PlannedTest) -> Option<ProgressBar> {
        if self.quiet || !matches!(planned, PlannedTest::Pair { .. }) {
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("⏱ {}…", planned));
        spinner.enable_steady_tick(Duration::from_millis(120));
        Some(spinner)
    }

    /// Replace the running line with the final result
    pub fn test_finished(
        &self,
        progress: Option<ProgressBar>,
        planned: &PlannedTest,
        outcome: &RunOutcome,
    ) {
        if let Some(spinner) = progress {
            spinner.finish_and_clear();
        }
        if self.quiet {
            return;
        }

        for line in outcome_lines(planned, outcome) {
            println!("{}", line);
        }
    }

    pub fn summary(&self, tally: &Tally) {
        if self.quiet {
            return;
        }

        let verdict = tally.verdict();
        println!("\n\nSummary:");
        println!("  Broken     : {}", tally.broken);
        println!("  Failed     : {}", tally.failed);
        println!("  Successful : {}\n", tally.successful);
        println!("Conclusion:");

        let line = verdict.to_string();
        let line = match verdict {
            Verdict::Passed => line.green().bold(),
            Verdict::SuccessWithBroken => line.yellow().bold(),
            Verdict::Failed | Verdict::NoTestsExecuted => line.red().bold(),
        };
        println!("  {}", line);
    }
}

/// Render the result line(s) for one outcome
pub fn outcome_lines(planned: &PlannedTest, outcome: &RunOutcome) -> Vec<String> {
    match outcome {
        RunOutcome::Success => vec![format!("  {} {}", "✔".green(), planned)],
        RunOutcome::Broken(reason) => vec![format!("  ⁉️ {}", broken_message(reason).yellow())],
        RunOutcome::Failed(None) => vec![
            format!("  {} {}", "🚨".red(), planned),
            "    Returned false".to_string(),
        ],
        RunOutcome::Failed(Some(failure)) => {
            let mut lines = vec![format!("  {} {}", "🚨".red(), planned)];
            lines.extend(failure_lines(failure));
            lines
        }
    }
}

fn broken_message(reason: &BrokenReason) -> String {
    match reason {
        BrokenReason::UnitNotFound(unit) => format!("Test unit {} not found.", unit),
        BrokenReason::EntryPointNotFound { unit, entry_point } => {
            format!("Entry point {} not found in test unit {}.", entry_point, unit)
        }
        BrokenReason::Malformed(raw) => format!("Malformed test reference {}.", raw),
    }
}

fn failure_lines(failure: &Failure) -> Vec<String> {
    let mut lines = vec![format!("    {} – {}", failure.code, failure.message)];
    if let Some(location) = &failure.location {
        lines.push(format!("    {}", location.dimmed()));
    }
    if !failure.trace.is_empty() {
        lines.push(String::new());
        lines.extend(failure.trace.iter().map(|l| format!("    {}", l.dimmed())));
    }
    lines
}
