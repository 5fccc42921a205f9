//! Scheduler callback that reports the decision on stdout

use knl_provision::{HookEvent, Outcome};
use std::io::Write;

/// Writes the decision as one JSON line, for the scheduler-side wrapper to relay as
/// `accept(code)` or `reject(message, code)`.
pub struct StdoutEvent<W: Write> {
    out: W,
}

impl StdoutEvent<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> StdoutEvent<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, outcome: &Outcome) {
        let line = serde_json::to_string(outcome).unwrap_or_else(|e| {
            format!(
                r#"{{"action":"rejected","message":"failed to encode outcome: {}"}}"#,
                e
            )
        });
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            log::error!("Failed to write provisioning decision: {}", e);
        }
    }
}

impl<W: Write> HookEvent for StdoutEvent<W> {
    fn accept(&mut self, code: i32) {
        self.emit(&Outcome::Accepted { code });
    }

    fn reject(&mut self, message: &str, code: Option<i32>) {
        self.emit(&Outcome::Rejected {
            message: message.to_string(),
            code,
        });
    }
}
