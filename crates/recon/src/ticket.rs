//! Ticket number extraction from free text.
//!
//! Rules are evaluated in order and the first rule that yields a number wins:
//! explicit markers (`TP1234`, `#1234`) outrank a bare number, and a bare
//! number needs at least four digits so percentages and counts are ignored.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::CanonicalRecord;

/// Ordered (rule name, pattern) pairs. Group 1 captures the digits.
const RULE_PATTERNS: [(&str, &str); 3] = [
    ("tp_marker", r"TP([0-9]+)"),
    ("hash_marker", r"#([0-9]+)"),
    ("bare_number", r"(?-u:\b)([0-9]{4,})(?-u:\b)"),
];

#[derive(Debug)]
pub struct TicketRule {
    pub name: &'static str,
    pattern: Regex,
}

impl TicketRule {
    /// Number captured by this rule's first match, if any.
    ///
    /// A run of digits too long for `u64` counts as no match.
    pub fn apply(&self, text: &str) -> Option<u64> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// The rule chain, compiled once.
pub fn rules() -> &'static [TicketRule] {
    static RULES: OnceLock<Vec<TicketRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        RULE_PATTERNS
            .iter()
            .map(|&(name, pattern)| TicketRule {
                name,
                pattern: Regex::new(pattern).unwrap(),
            })
            .collect()
    })
}

/// First rule that matches, with the number it produced.
pub fn extract_with_rule(text: &str) -> Option<(&'static str, u64)> {
    rules()
        .iter()
        .find_map(|rule| rule.apply(text).map(|n| (rule.name, n)))
}

pub fn extract(text: &str) -> Option<u64> {
    extract_with_rule(text).map(|(_, n)| n)
}

/// Look for a ticket number in description, then tags, then project.
///
/// A field whose text yields `0` is skipped like a field with no match.
pub fn resolve_for_record(record: &CanonicalRecord) -> Option<u64> {
    [&record.description, &record.tags, &record.project]
        .into_iter()
        .flatten()
        .filter_map(|text| extract(text))
        .find(|n| *n != 0)
}
