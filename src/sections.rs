//! Section file reader.
//!
//! The section file is INI-style. Each `[TAG]` header names a policy tag and
//! each `name = url` pair below it maps a local rule file to the remote list
//! it mirrors:
//!
//! ```text
//! [MEDIA]
//! level = 3
//! Netflix.list = https://example.com/Netflix.list
//! ```
//!
//! Section names and keys are kept verbatim and in declaration order.

use indexmap::IndexMap;
use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Metadata key that is never a source.
const LEVEL_KEY: &str = "level";

/// One configured section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    tag: String,
    level: Option<String>,
    sources: Vec<(String, String)>,
}

impl Section {
    /// Build a section from its raw key/value pairs.
    ///
    /// A `level` key (any case) is kept as metadata, not as a source.
    pub fn from_entries(tag: impl Into<String>, entries: IndexMap<String, String>) -> Self {
        let mut level = None;
        let mut sources = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if key.eq_ignore_ascii_case(LEVEL_KEY) {
                level = Some(value);
            } else {
                sources.push((key, value));
            }
        }
        Self {
            tag: tag.into(),
            level,
            sources,
        }
    }

    /// The policy tag (the section name).
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The `level` metadata value, if present.
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    /// `(local name, remote URL)` pairs in declaration order.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse section file content.
///
/// Accepts `key = value` and `key: value`, full-line `#` and `;` comments.
/// A repeated section merges into the first one; a repeated key keeps its
/// first position and takes the last value.
pub fn parse_sections(content: &str) -> Result<Vec<Section>> {
    let mut raw: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
    let mut current: Option<String> = None;

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_string();
            if name.is_empty() {
                return Err(Error::Config(format!("line {}: empty section name", idx + 1)));
            }
            raw.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let section = current.as_ref().ok_or_else(|| {
            Error::Config(format!("line {}: entry outside of any section", idx + 1))
        })?;

        let pos = line.find(|c: char| c == '=' || c == ':').ok_or_else(|| {
            Error::Config(format!("line {}: expected `key = value`", idx + 1))
        })?;
        let key = line[..pos].trim();
        let value = line[pos + 1..].trim();
        if key.is_empty() {
            return Err(Error::Config(format!("line {}: empty key", idx + 1)));
        }

        if let Some(entries) = raw.get_mut(section) {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    Ok(raw
        .into_iter()
        .map(|(tag, entries)| Section::from_entries(tag, entries))
        .collect())
}

/// Load and parse the section file.
pub fn load_sections(path: impl AsRef<Path>) -> Result<Vec<Section>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingConfig(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_sections(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_order_and_case() {
        let content = r#"
# ACL4SSR mirror
[Netflix]
Level = 2
NetflixIP.list = https://example.com/NetflixIP.list
Netflix.list: https://example.com/Netflix.list

[REJECT]
; ads
BanAD.list = https://example.com/BanAD.list
"#;
        let sections = parse_sections(content).unwrap();
        assert_eq!(sections.len(), 2);

        let netflix = &sections[0];
        assert_eq!(netflix.tag(), "Netflix");
        assert_eq!(netflix.level(), Some("2"));
        let sources: Vec<(&str, &str)> = netflix.sources().collect();
        assert_eq!(
            sources,
            vec![
                ("NetflixIP.list", "https://example.com/NetflixIP.list"),
                ("Netflix.list", "https://example.com/Netflix.list"),
            ]
        );

        assert_eq!(sections[1].tag(), "REJECT");
        assert_eq!(sections[1].level(), None);
        assert_eq!(sections[1].sources().count(), 1);
    }

    #[test]
    fn test_repeated_section_and_key() {
        let content = "[A]\nx = 1\ny = 2\n[B]\nz = 3\n[A]\nx = 9\nw = 4\n";
        let sections = parse_sections(content).unwrap();
        assert_eq!(sections.len(), 2);
        let a: Vec<(&str, &str)> = sections[0].sources().collect();
        assert_eq!(a, vec![("x", "9"), ("y", "2"), ("w", "4")]);
    }

    #[test]
    fn test_url_value_keeps_colons() {
        let sections = parse_sections("[T]\nk = https://a.b:8443/x.list\n").unwrap();
        let sources: Vec<(&str, &str)> = sections[0].sources().collect();
        assert_eq!(sources, vec![("k", "https://a.b:8443/x.list")]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_sections("k = v\n"), Err(Error::Config(_))));
        assert!(matches!(
            parse_sections("[T]\njust-a-word\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(parse_sections("[ ]\n"), Err(Error::Config(_))));
        assert!(matches!(parse_sections("[T]\n= v\n"), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_sections("/nonexistent/ClashRule.conf"),
            Err(Error::MissingConfig(_))
        ));
    }
}
