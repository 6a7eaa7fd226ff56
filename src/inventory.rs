//! Inventory loading. The file shape is sniffed from the first non-empty
//! line; five historical schemas are recognized.

use std::sync::OnceLock;
use std::{fs, path::Path};

use regex::Regex;

use crate::error::InventoryLoadError;
use crate::settings::truthy;

pub const DEFAULT_PORT: u16 = 22;

/// One inventory row. Built once at load time, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub hostname: String,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub jumphost: Option<String>,
    pub jumpuser: Option<String>,
    pub notes: String,
    pub legacy: bool,
}

impl HostEntry {
    fn named(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            host: hostname.to_string(),
            port: DEFAULT_PORT,
            user: None,
            jumphost: None,
            jumpuser: None,
            notes: String::new(),
            legacy: false,
        }
    }

    /// Pseudo-entry for input that matched nothing: the query is dialed as a
    /// raw address.
    pub fn literal(query: &str) -> Self {
        Self::named(query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Full,
    Labeled,
    Shorthand,
    Positional,
    Headerless,
}

type Predicate = fn(&str, &[String]) -> bool;

// Evaluated strictly in this order; a header could incidentally satisfy a
// looser pattern further down.
const DETECTORS: &[(Predicate, Schema)] = &[
    (is_full_header, Schema::Full),
    (is_labeled_header, Schema::Labeled),
    (is_shorthand_header, Schema::Shorthand),
    (is_bare_identifier, Schema::Headerless),
    (always, Schema::Positional),
];

fn is_full_header(_line: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| t == "hostname")
}

fn is_labeled_header(_line: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| t == "name") && tokens.iter().any(|t| t == "ip address")
}

fn is_shorthand_header(_line: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| t == "host") && tokens.iter().any(|t| t == "addr")
}

fn is_bare_identifier(line: &str, _tokens: &[String]) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());
    pattern.is_match(line)
}

fn always(_line: &str, _tokens: &[String]) -> bool {
    true
}

pub fn detect_schema(first_line: &str) -> Schema {
    let tokens = header_tokens(first_line);
    DETECTORS
        .iter()
        .find(|(predicate, _)| predicate(first_line.trim(), &tokens))
        .map(|(_, schema)| *schema)
        .expect("detector list ends with a catch-all")
}

fn header_tokens(line: &str) -> Vec<String> {
    line.split(',')
        .map(|t| t.trim().to_ascii_lowercase())
        .collect()
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<HostEntry>, InventoryLoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| InventoryLoadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&text))
}

/// Parse inventory text, preserving file order. Malformed fields in a row
/// fall back to column defaults; the row is still included.
pub fn parse(text: &str) -> Vec<HostEntry> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(first) = lines.next() else {
        return Vec::new();
    };

    match detect_schema(first) {
        Schema::Headerless => std::iter::once(first)
            .chain(lines)
            .map(HostEntry::named)
            .collect(),
        Schema::Full => lines.filter_map(parse_full_row).collect(),
        Schema::Labeled => {
            let index = labeled_index(first);
            lines.filter_map(|l| parse_labeled_row(l, &index)).collect()
        }
        Schema::Shorthand => {
            let (name_col, host_col) = shorthand_columns(first);
            lines
                .filter_map(|l| parse_shorthand_row(l, name_col, host_col))
                .collect()
        }
        Schema::Positional => lines.filter_map(parse_positional_row).collect(),
    }
}

fn cell(cols: &[&str], index: usize) -> Option<String> {
    cols.get(index)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn parse_port(value: Option<String>) -> u16 {
    value
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Fixed columns: hostname,host,port,user,jumphost,jumpuser,notes[,legacy].
fn parse_full_row(line: &str) -> Option<HostEntry> {
    let cols: Vec<&str> = line.split(',').collect();
    let hostname = cell(&cols, 0)?;
    let mut entry = HostEntry::named(&hostname);
    if let Some(host) = cell(&cols, 1) {
        entry.host = host;
    }
    entry.port = parse_port(cell(&cols, 2));
    entry.user = cell(&cols, 3);
    entry.jumphost = cell(&cols, 4);
    entry.jumpuser = cell(&cols, 5);
    entry.notes = cell(&cols, 6).unwrap_or_default();
    entry.legacy = cell(&cols, 7).map(|v| truthy(&v)).unwrap_or(false);
    Some(entry)
}

/// Column name -> position, for export files whose column order varies.
#[derive(Debug, Default)]
struct LabeledIndex {
    hostname: Option<usize>,
    host: Option<usize>,
    port: Option<usize>,
    user: Option<usize>,
    jumphost: Option<usize>,
    jumpuser: Option<usize>,
    notes: Option<usize>,
    legacy: Option<usize>,
}

fn labeled_index(header: &str) -> LabeledIndex {
    let mut index = LabeledIndex::default();
    for (i, token) in header_tokens(header).iter().enumerate() {
        match token.as_str() {
            "name" => index.hostname = Some(i),
            "ip address" => index.host = Some(i),
            "port" => index.port = Some(i),
            "user" => index.user = Some(i),
            "jumphost" => index.jumphost = Some(i),
            "jumpuser" => index.jumpuser = Some(i),
            "notes" => index.notes = Some(i),
            "legacy" => index.legacy = Some(i),
            // unrecognized columns are ignored without error
            _ => {}
        }
    }
    index
}

fn parse_labeled_row(line: &str, index: &LabeledIndex) -> Option<HostEntry> {
    let cols: Vec<&str> = line.split(',').collect();
    let hostname = cell(&cols, index.hostname?)?;
    let mut entry = HostEntry::named(&hostname);
    if let Some(host) = index.host.and_then(|i| cell(&cols, i)) {
        entry.host = host;
    }
    entry.port = parse_port(index.port.and_then(|i| cell(&cols, i)));
    entry.user = index.user.and_then(|i| cell(&cols, i));
    entry.jumphost = index.jumphost.and_then(|i| cell(&cols, i));
    entry.jumpuser = index.jumpuser.and_then(|i| cell(&cols, i));
    entry.notes = index.notes.and_then(|i| cell(&cols, i)).unwrap_or_default();
    entry.legacy = index
        .legacy
        .and_then(|i| cell(&cols, i))
        .map(|v| truthy(&v))
        .unwrap_or(false);
    Some(entry)
}

/// Of the two matching columns, the first in file order carries the
/// hostname and the second the address.
fn shorthand_columns(header: &str) -> (usize, usize) {
    let matching: Vec<usize> = header_tokens(header)
        .iter()
        .enumerate()
        .filter(|(_, t)| *t == "host" || *t == "addr")
        .map(|(i, _)| i)
        .collect();
    (matching[0], matching.get(1).copied().unwrap_or(matching[0]))
}

fn parse_shorthand_row(line: &str, name_col: usize, host_col: usize) -> Option<HostEntry> {
    let cols: Vec<&str> = line.split(',').collect();
    let hostname = cell(&cols, name_col)?;
    let mut entry = HostEntry::named(&hostname);
    if let Some(host) = cell(&cols, host_col) {
        entry.host = host;
    }
    Some(entry)
}

fn parse_positional_row(line: &str) -> Option<HostEntry> {
    let cols: Vec<&str> = line.split(',').collect();
    let hostname = cell(&cols, 0)?;
    let mut entry = HostEntry::named(&hostname);
    if let Some(host) = cell(&cols, 1) {
        entry.host = host;
    }
    Some(entry)
}
