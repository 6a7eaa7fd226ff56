//! Query-to-entry resolution. The rules run in a fixed order; the literal
//! fallback always succeeds, so ambiguity is the only failure.

use crate::error::AmbiguousMatch;
use crate::inventory::HostEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The query named an inventory entry.
    Match(HostEntry),
    /// Nothing matched; the query is dialed as a raw address.
    Literal(HostEntry),
}

impl Resolution {
    pub fn entry(&self) -> &HostEntry {
        match self {
            Resolution::Match(entry) | Resolution::Literal(entry) => entry,
        }
    }
}

pub fn resolve(query: &str, inventory: &[HostEntry]) -> Result<Resolution, AmbiguousMatch> {
    // 1. exact hostname; duplicates in the inventory are reported, not guessed at
    let exact: Vec<&HostEntry> = inventory
        .iter()
        .filter(|e| e.hostname == query)
        .collect();
    match exact.len() {
        1 => return Ok(Resolution::Match(exact[0].clone())),
        0 => {}
        _ => return Err(ambiguous(query, &exact)),
    }

    // 2. unique hostname prefix
    if !query.is_empty() {
        let prefixed: Vec<&HostEntry> = inventory
            .iter()
            .filter(|e| e.hostname.starts_with(query))
            .collect();
        match prefixed.len() {
            1 => return Ok(Resolution::Match(prefixed[0].clone())),
            0 => {}
            _ => return Err(ambiguous(query, &prefixed)),
        }
    }

    // 3. exact address
    if let Some(entry) = inventory.iter().find(|e| e.host == query) {
        return Ok(Resolution::Match(entry.clone()));
    }

    // 4. literal fallback, never an error
    Ok(Resolution::Literal(HostEntry::literal(query)))
}

fn ambiguous(query: &str, candidates: &[&HostEntry]) -> AmbiguousMatch {
    AmbiguousMatch {
        query: query.to_string(),
        candidates: candidates.iter().map(|e| e.hostname.clone()).collect(),
    }
}
