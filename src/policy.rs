//! Policy names and their normalization against a section tag.

use ahash::AHashSet;
use once_cell::sync::Lazy;
use std::fmt;

/// Sentinel policy meaning "match without resolving the hostname".
pub const NO_RESOLVE: &str = "NO-RESOLVE";

/// Service-specific policy names that collapse into the section tag.
static THIRD_PARTY_POLICIES: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "TIKTOK",
        "YOUTUBE",
        // Apple
        "APPLETV",
        // ChatGPT
        "OPENAI",
        // Microsoft
        "TEAMS",
        // Google
        "CHROMECAST",
        "GOOGLEDRIVE",
        "GOOGLESEARCH",
        "GOOGLEVOICE",
        // Foreign media
        "DISNEY",
        "INSTAGRAM",
        "NETFLIX",
        "TWITCH",
        // Ads and tracking
        "ADVERTISING",
        "ADVERTISINGLITE",
        "ADVERTISINGMITV",
        "HIJACKING",
        "PRIVATETRACKER",
    ]
    .into_iter()
    .collect()
});

/// A policy with absolute meaning that is never replaced by a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForcePolicy {
    /// Route directly without proxy
    Direct,
    /// Reject the connection
    Reject,
}

impl ForcePolicy {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForcePolicy::Direct => "DIRECT",
            ForcePolicy::Reject => "REJECT",
        }
    }
}

impl fmt::Display for ForcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ForcePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DIRECT" => Ok(ForcePolicy::Direct),
            "REJECT" => Ok(ForcePolicy::Reject),
            _ => Err(()),
        }
    }
}

/// Outcome of resolving a declared policy against a section tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyResolution {
    /// Declared policy is the tag itself
    Tag,
    /// `NO-RESOLVE`: the tag with a `no-resolve` modifier
    NoResolve,
    /// DIRECT / REJECT, kept verbatim
    Force(ForcePolicy),
    /// Known service policy, collapsed into the tag
    ThirdParty,
    /// Unrecognized name, collapsed into the tag and reported
    Unknown(String),
}

impl PolicyResolution {
    /// Resolve an already uppercased declared policy.
    ///
    /// The checks run in fixed priority: tag, no-resolve, force, third-party.
    pub fn resolve(declared: &str, tag: &str) -> Self {
        if declared == tag {
            PolicyResolution::Tag
        } else if declared == NO_RESOLVE {
            PolicyResolution::NoResolve
        } else if let Ok(force) = declared.parse::<ForcePolicy>() {
            PolicyResolution::Force(force)
        } else if THIRD_PARTY_POLICIES.contains(declared) {
            PolicyResolution::ThirdParty
        } else {
            PolicyResolution::Unknown(declared.to_string())
        }
    }

    /// Render the policy field of an output rule.
    pub fn render(&self, tag: &str) -> String {
        match self {
            PolicyResolution::NoResolve => format!("{},{}", tag, NO_RESOLVE.to_lowercase()),
            PolicyResolution::Force(force) => force.as_str().to_string(),
            PolicyResolution::Tag | PolicyResolution::ThirdParty | PolicyResolution::Unknown(_) => {
                tag.to_string()
            }
        }
    }

    /// The unrecognized name, if any.
    pub fn unknown_name(&self) -> Option<&str> {
        match self {
            PolicyResolution::Unknown(name) => Some(name.as_str()),
            _ => None,
        }
    }
}
