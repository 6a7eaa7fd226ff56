//! The {query -> selection} contract shared by the full-screen selector and
//! the plain-prompt fallback, plus the capability probe that picks one.

use std::io::{self, IsTerminal};

use crate::flags::FlagSet;
use crate::inventory::HostEntry;
use crate::prompt::LinePrompt;
use crate::select_box::SelectBox;

/// What one round of selection produced: the query to resolve and the flags
/// active for this attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    pub flags: FlagSet,
    pub query: String,
}

pub trait Selector {
    /// Run one selection round. `None` means the user cancelled.
    fn select(&mut self) -> anyhow::Result<Option<SelectionRequest>>;
}

/// Probe the terminal and pick a strategy: the full-screen selector when both
/// ends are interactive, a plain numbered prompt otherwise.
pub fn for_environment(data: Vec<HostEntry>) -> Box<dyn Selector> {
    if io::stdout().is_terminal() && io::stdin().is_terminal() {
        Box::new(SelectBox::new(data))
    } else {
        Box::new(LinePrompt::new(data))
    }
}
