//! REPL driver state: current view, prompt, idle timeout, EOF command, and
//! echo flag. The driver holds configuration only — [`crate::engine::Engine`]
//! owns the actual read-match-dispatch loop, since stepping it requires the
//! registry and lexicon the driver itself has no business owning.
//!
//! Grounded on spec's REPL Driver contract: terminal attribute handling,
//! SIGTERM, and the readline integration itself are explicitly the host's
//! responsibility, realized here as a trait the host implements rather than
//! a concrete terminal dependency.

use crate::matcher::MatchOutcome;

/// Supplies the next line of input. The host wires this to its own
/// readline/rustyline integration — never implemented by this crate.
pub trait LineSource {
    fn next_line(&mut self) -> Option<String>;
}

/// What one REPL turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplOutcome {
    Dispatched(MatchOutcome),
    Idle,
    Eof,
}

/// REPL-facing configuration, mutated through `Engine`'s own mutators.
#[derive(Debug, Clone)]
pub struct ReplDriver {
    view: u32,
    prompt: String,
    idle_timeout_secs: u64,
    eof_command: Option<String>,
    echo: bool,
}

impl ReplDriver {
    pub fn new(view: u32, idle_timeout_secs: u64) -> Self {
        ReplDriver {
            view,
            prompt: "> ".to_string(),
            idle_timeout_secs,
            eof_command: None,
            echo: true,
        }
    }

    pub fn view(&self) -> u32 {
        self.view
    }

    pub fn set_view(&mut self, view: u32) {
        self.view = view;
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn idle_timeout_secs(&self) -> u64 {
        self.idle_timeout_secs
    }

    pub fn set_idle_timeout(&mut self, secs: u64) {
        self.idle_timeout_secs = secs;
    }

    pub fn eof_command(&self) -> Option<&str> {
        self.eof_command.as_deref()
    }

    pub fn set_eof_command(&mut self, command: Option<String>) {
        self.eof_command = command;
    }

    pub fn echo(&self) -> bool {
        self.echo
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }
}
