//! Minimal line-based selector for non-interactive terminals. Implements the
//! same contract as the full-screen selector.

use std::io::{self, BufRead, Write};

use crate::flags;
use crate::flags::FlagSet;
use crate::inventory::HostEntry;
use crate::selector::{SelectionRequest, Selector};

pub struct LinePrompt {
    data: Vec<HostEntry>,
}

impl LinePrompt {
    pub fn new(data: Vec<HostEntry>) -> Self {
        Self { data }
    }
}

impl Selector for LinePrompt {
    fn select(&mut self) -> anyhow::Result<Option<SelectionRequest>> {
        let mut out = io::stdout().lock();
        writeln!(out, "Available hosts:")?;
        for (i, entry) in self.data.iter().enumerate() {
            writeln!(out, "  {:2}) {}", i + 1, entry.hostname)?;
        }
        write!(out, "Select number or host: ")?;
        out.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            return Ok(None);
        }
        let choice = parse_choice(line.trim(), &self.data);
        if choice.is_none() {
            writeln!(out, "Invalid selection.")?;
        }
        Result::Ok(choice)
    }
}

/// A number picks an entry by position; anything else is a query, with the
/// usual inline flags allowed.
fn parse_choice(line: &str, data: &[HostEntry]) -> Option<SelectionRequest> {
    if line.is_empty() {
        return None;
    }
    if let Ok(index) = line.parse::<usize>() {
        if index >= 1 && index <= data.len() {
            return Some(SelectionRequest {
                flags: FlagSet::default(),
                query: data[index - 1].hostname.clone(),
            });
        }
        return None;
    }
    let (flags, query) = flags::parse(line);
    if query.is_empty() {
        None
    } else {
        Some(SelectionRequest {
            flags,
            query: query.to_string(),
        })
    }
}
