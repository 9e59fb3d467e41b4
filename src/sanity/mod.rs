//! Cache sanity checking
//!
//! Inspects a snapshot of live entries for redundant decodes of the same
//! raw field data. Findings are advisory: nothing here ever blocks a fill.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, EntryKind};
use crate::segment::SegmentKey;

/// Category of suspicious duplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsanityKind {
    /// One segment+field decoded under more than one value kind
    ValueMismatch,
    /// One segment+field+kind decoded by more than one parser
    ParserMismatch,
}

impl InsanityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsanityKind::ValueMismatch => "VALUEMISMATCH",
            InsanityKind::ParserMismatch => "PARSERMISMATCH",
        }
    }
}

impl fmt::Display for InsanityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of entries that look like redundant work
#[derive(Debug, Clone)]
pub struct Insanity {
    pub kind: InsanityKind,
    pub message: String,
    pub entries: Vec<CacheEntry>,
}

impl Insanity {
    /// Whether any entry in this finding holds `value`
    pub fn involves(&self, value: &crate::cache::CachedValue) -> bool {
        self.entries.iter().any(|e| e.value().same_instance(value))
    }
}

impl fmt::Display for Insanity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.kind, self.message)?;
        for entry in &self.entries {
            writeln!(f, "\t{}", entry)?;
        }
        Ok(())
    }
}

/// One heuristic over a snapshot of entries
pub trait SanityCheck: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, entries: &[CacheEntry]) -> Vec<Insanity>;

    fn description(&self) -> &str {
        "No description provided"
    }
}

fn distinct_instances(entries: &[&CacheEntry]) -> usize {
    entries
        .iter()
        .map(|e| e.value().instance_id())
        .collect::<HashSet<_>>()
        .len()
}

/// Same segment and field cached under several incompatible kinds
pub struct ValueMismatchCheck;

impl SanityCheck for ValueMismatchCheck {
    fn name(&self) -> &str {
        "ValueMismatch"
    }

    fn description(&self) -> &str {
        "A segment's field should be decoded under one value kind"
    }

    fn check(&self, entries: &[CacheEntry]) -> Vec<Insanity> {
        let mut groups: BTreeMap<(SegmentKey, &str), Vec<&CacheEntry>> = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.kind() != EntryKind::DocsWithField) {
            groups
                .entry((entry.segment(), entry.field()))
                .or_default()
                .push(entry);
        }

        groups
            .into_iter()
            .filter_map(|((segment, field), group)| {
                let kinds: HashSet<EntryKind> = group.iter().map(|e| e.kind()).collect();
                if kinds.len() < 2 || distinct_instances(&group) < 2 {
                    return None;
                }
                Some(Insanity {
                    kind: InsanityKind::ValueMismatch,
                    message: format!(
                        "Multiple distinct value kinds found for: '{}'=>'{}'",
                        segment, field
                    ),
                    entries: group.into_iter().cloned().collect(),
                })
            })
            .collect()
    }
}

/// Same segment, field and kind cached by several parsers
pub struct ParserMismatchCheck;

impl SanityCheck for ParserMismatchCheck {
    fn name(&self) -> &str {
        "ParserMismatch"
    }

    fn description(&self) -> &str {
        "A segment's field should be decoded by one parser per kind"
    }

    fn check(&self, entries: &[CacheEntry]) -> Vec<Insanity> {
        let mut groups: BTreeMap<(SegmentKey, &str, EntryKind), Vec<&CacheEntry>> =
            BTreeMap::new();
        for entry in entries.iter().filter(|e| e.kind() != EntryKind::DocsWithField) {
            groups
                .entry((entry.segment(), entry.field(), entry.kind()))
                .or_default()
                .push(entry);
        }

        groups
            .into_iter()
            .filter_map(|((segment, field, kind), group)| {
                if distinct_instances(&group) < 2 {
                    return None;
                }
                Some(Insanity {
                    kind: InsanityKind::ParserMismatch,
                    message: format!(
                        "Multiple distinct {} values found for: '{}'=>'{}'",
                        kind, segment, field
                    ),
                    entries: group.into_iter().cloned().collect(),
                })
            })
            .collect()
    }
}

pub fn default_checks() -> Vec<Box<dyn SanityCheck>> {
    vec![Box::new(ValueMismatchCheck), Box::new(ParserMismatchCheck)]
}

/// Run every check and collect the findings
pub fn check_all(entries: &[CacheEntry], checks: &[Box<dyn SanityCheck>]) -> Vec<Insanity> {
    checks.iter().flat_map(|check| check.check(entries)).collect()
}

/// Run the default checks
pub fn check_sanity(entries: &[CacheEntry]) -> Vec<Insanity> {
    check_all(entries, &default_checks())
}
