//! Canonical ordering of converted rules.

use ipnet::IpNet;
use std::net::IpAddr;

use super::RuleLine;
use crate::{Error, Result};

/// Ordering of the match value within one kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKey {
    /// Network address, then prefix length
    Network(IpAddr, u8),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    kind: String,
    value: MatchKey,
    rendered: String,
}

impl SortKey {
    fn of(rule: &RuleLine) -> Result<Self> {
        let value = if rule.kind().is_address_range() {
            let net = parse_network(rule.value())?;
            MatchKey::Network(net.network(), net.prefix_len())
        } else {
            MatchKey::Text(rule.value().to_string())
        };

        Ok(Self {
            kind: rule.kind().as_str().to_string(),
            value,
            rendered: rule.to_string(),
        })
    }
}

/// Parse a network literal, accepting non-zero host bits and bare addresses.
///
/// `10.0.0.5/24` yields `10.0.0.0/24`; `1.2.3.4` yields `1.2.3.4/32`.
pub fn parse_network(literal: &str) -> Result<IpNet> {
    let literal = literal.trim();

    if let Ok(net) = literal.parse::<IpNet>() {
        return Ok(net.trunc());
    }

    if let Ok(addr) = literal.parse::<IpAddr>() {
        return Ok(IpNet::from(addr));
    }

    Err(Error::InvalidCidrPattern(literal.to_string()))
}

/// Sort rules into the canonical file order.
///
/// Rules are ordered by kind, then by match value (numerically for
/// address-range kinds, as text otherwise), then by the whole rendered line.
/// The result does not depend on input order.
pub fn sort_rules<I>(rules: I) -> Result<Vec<RuleLine>>
where
    I: IntoIterator<Item = RuleLine>,
{
    let mut keyed = rules
        .into_iter()
        .map(|rule| SortKey::of(&rule).map(|key| (key, rule)))
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(keyed.into_iter().map(|(_, rule)| rule).collect())
}
