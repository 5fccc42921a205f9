//! Provisioning decision and delivery to the scheduler

use serde::Serialize;

/// Scheduler side of a provisioning event.
///
/// Implementations forward the decision to whatever drives the hook (the scheduler's
/// hook API, a wrapper script, a test recorder).
pub trait HookEvent {
    /// Admit the provisioning request
    fn accept(&mut self, code: i32);

    /// Refuse the provisioning request
    fn reject(&mut self, message: &str, code: Option<i32>);
}

/// Final decision of one provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Outcome {
    Accepted {
        code: i32,
    },
    Rejected {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<i32>,
    },
}

impl Outcome {
    pub fn accepted() -> Self {
        Outcome::Accepted { code: 0 }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    /// Hand the decision to the scheduler. Consumes the outcome so it is delivered once.
    pub fn deliver<E: HookEvent + ?Sized>(self, event: &mut E) {
        match self {
            Outcome::Accepted { code } => event.accept(code),
            Outcome::Rejected { message, code } => event.reject(&message, code),
        }
    }
}
