//! Console Reporter
//!
//! Renders suite events as the plain-text report:
//!
//! ```text
//! For a Shared Representation with Two-Step Mechanisms,
//!  set n=10000, d=10, k=3, c_1=1.0999,
//!  and test r=50:
//!
//! Equation 2.1': True
//! ...
//! Equation 2.6': True
//!
//! Passed
//! ```

use crate::core::equations::EquationId;
use crate::events::{CheckEvent, CheckObserver};
use std::io::Write;
use tracing::warn;

/// Notice printed before a slow equation starts
///
/// Only the one-step 2.3'' sum is announced; the report names it `(Shared)`.
fn progress_notice(equation: EquationId, slow: bool) -> Option<String> {
    (slow && equation.primes == 2).then(|| {
        format!("* Calculations of Equation {} (Shared) take a while... *", equation)
    })
}

/// Observer that writes the textual report to `W`
///
/// Progress notices for slow equations go to stderr so that the report
/// stays clean when stdout is redirected.
pub struct ConsoleReporter<W: Write + Send> {
    out: W,
    progress: bool,
}

impl ConsoleReporter<std::io::Stdout> {
    /// Report to stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    /// Report to `out`, without progress notices
    pub fn new(out: W) -> Self {
        Self {
            out,
            progress: false,
        }
    }

    /// Enable or disable progress notices on stderr
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn render(&mut self, event: &CheckEvent) -> std::io::Result<()> {
        match event {
            CheckEvent::SuiteStarted { variant, header } => {
                writeln!(self.out, "{}", variant.title())?;
                writeln!(self.out, "{}\n", header)?;
            }
            CheckEvent::EquationStarted { equation, slow } => {
                if let Some(notice) = progress_notice(*equation, *slow).filter(|_| self.progress) {
                    eprintln!("{}", notice);
                }
            }
            CheckEvent::EquationEvaluated { result, note, .. } => {
                let label = match note {
                    Some(note) => format!("{} ({})", result.equation, note),
                    None => result.equation.to_string(),
                };
                let shown = if result.passed { "True" } else { "False" };
                writeln!(self.out, "Equation {}: {}", label, shown)?;
            }
            CheckEvent::SuiteFinished { verdict, .. } => {
                writeln!(self.out, "\n{}\n", verdict)?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write + Send> CheckObserver for ConsoleReporter<W> {
    fn on_event(&mut self, event: &CheckEvent) {
        if let Err(e) = self.render(event) {
            warn!(error = %e, event = event.kind(), "Console report write failed");
        }
    }
}
