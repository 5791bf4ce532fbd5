//! Single rule line parsing and normalization.

use ahash::AHashSet;
use std::collections::BTreeSet;
use std::fmt;

use crate::policy::PolicyResolution;
use crate::RuleKind;

/// A converted rule: `KIND,MATCH,POLICY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleLine {
    kind: RuleKind,
    value: String,
    policy: String,
}

impl RuleLine {
    /// Create a rule from already normalized fields.
    pub fn new(kind: RuleKind, value: impl Into<String>, policy: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            policy: policy.into(),
        }
    }

    /// Get the match kind.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Get the match value (domain or CIDR literal).
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the rendered policy field.
    pub fn policy(&self) -> &str {
        &self.policy
    }
}

impl fmt::Display for RuleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.kind, self.value, self.policy)
    }
}

/// Result of parsing one raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Blank line or comment
    Skip,
    /// Fewer than two fields, or an empty match value
    Malformed,
    /// A normalized rule, with the declared policy if it was not recognized
    Rule {
        rule: RuleLine,
        unknown_policy: Option<String>,
    },
}

/// Parse one Clash rule line under a section tag.
///
/// # Examples
/// ```
/// use qxrule::converter::{parse_line, ParsedLine};
///
/// match parse_line("DOMAIN,example.com,NO-RESOLVE", "MYTAG") {
///     ParsedLine::Rule { rule, .. } => {
///         assert_eq!(rule.to_string(), "HOST,example.com,MYTAG,no-resolve")
///     }
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn parse_line(line: &str, tag: &str) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return ParsedLine::Skip;
    }

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 2 {
        return ParsedLine::Malformed;
    }

    let value = parts[1].trim();
    if value.is_empty() {
        return ParsedLine::Malformed;
    }

    let kind = RuleKind::parse(parts[0]);
    let declared = match parts.get(2) {
        Some(policy) => policy.trim().to_uppercase(),
        None => tag.to_string(),
    };

    let resolution = PolicyResolution::resolve(&declared, tag);
    let rule = RuleLine::new(kind, value, resolution.render(tag));

    ParsedLine::Rule {
        rule,
        unknown_policy: resolution.unknown_name().map(str::to_string),
    }
}

/// Deduplicating collector for the rules of one source.
#[derive(Debug)]
pub struct RuleCollector {
    tag: String,
    rules: AHashSet<RuleLine>,
    unknown_policies: BTreeSet<String>,
    malformed: usize,
}

impl RuleCollector {
    /// Create an empty collector for a section tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            rules: AHashSet::new(),
            unknown_policies: BTreeSet::new(),
            malformed: 0,
        }
    }

    /// Feed one raw line.
    pub fn push_line(&mut self, line: &str) {
        match parse_line(line, &self.tag) {
            ParsedLine::Skip => {}
            ParsedLine::Malformed => {
                log::debug!("Ignoring malformed rule line under {}: {:?}", self.tag, line);
                self.malformed += 1;
            }
            ParsedLine::Rule {
                rule,
                unknown_policy,
            } => {
                if let Some(name) = unknown_policy {
                    self.unknown_policies.insert(name);
                }
                self.rules.insert(rule);
            }
        }
    }

    /// Number of distinct rules collected so far.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no rule has been collected.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of malformed lines seen.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Unrecognized policy names, sorted and deduplicated.
    pub fn unknown_policies(&self) -> impl Iterator<Item = &str> {
        self.unknown_policies.iter().map(String::as_str)
    }

    /// Consume the collector and return the distinct rules (unordered).
    pub fn into_rules(self) -> AHashSet<RuleLine> {
        self.rules
    }
}
