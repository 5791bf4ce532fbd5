//! Rule kind definitions.

use std::fmt;

/// Kinds that carry a network prefix as their match value.
const ADDRESS_RANGE_KINDS: [&str; 3] = ["IP-CIDR", "IP-CIDR6", "IP6-CIDR"];

/// RuleKind is the match-kind field of a converted rule.
///
/// Only the domain kinds have a Quantumult X spelling that differs from the
/// Clash one. Every other kind is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Exact host match (Clash `DOMAIN`)
    Host,
    /// Host suffix match (Clash `DOMAIN-SUFFIX`)
    HostSuffix,
    /// Host keyword match (Clash `DOMAIN-KEYWORD`)
    HostKeyword,
    /// Any other kind, kept verbatim
    Other(String),
}

impl RuleKind {
    /// Parse a Clash match-kind (case-insensitive, surrounding space ignored).
    pub fn parse(s: &str) -> Self {
        let kind = s.trim().to_uppercase();
        match kind.as_str() {
            "DOMAIN" => RuleKind::Host,
            "DOMAIN-SUFFIX" => RuleKind::HostSuffix,
            "DOMAIN-KEYWORD" => RuleKind::HostKeyword,
            _ => RuleKind::Other(kind),
        }
    }

    /// Get the Quantumult X spelling.
    pub fn as_str(&self) -> &str {
        match self {
            RuleKind::Host => "HOST",
            RuleKind::HostSuffix => "HOST-SUFFIX",
            RuleKind::HostKeyword => "HOST-KEYWORD",
            RuleKind::Other(kind) => kind.as_str(),
        }
    }

    /// Whether the match value of this kind is a network prefix.
    pub fn is_address_range(&self) -> bool {
        match self {
            RuleKind::Other(kind) => ADDRESS_RANGE_KINDS.contains(&kind.as_str()),
            _ => false,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
