//! Quantumult X `filter_remote` manifest.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::Result;

/// One remote filter subscription line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Mirror URL of the converted rule file
    pub url: String,
    /// Section tag, also used as the forced policy
    pub tag: String,
    /// Refresh interval in seconds
    pub update_interval: u64,
}

impl ManifestEntry {
    /// Build the entry for an output identifier under a mirror prefix.
    pub fn new(mirror_prefix: &str, identifier: &str, tag: &str, update_interval: u64) -> Self {
        Self {
            url: format!("{}/{}", mirror_prefix.trim_end_matches('/'), identifier),
            tag: tag.to_string(),
            update_interval,
        }
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, tag={}, force-policy={}, update-interval={}, opt-parser=true, enabled=true",
            self.url, self.tag, self.tag, self.update_interval
        )
    }
}

/// Write the manifest, one entry per line.
pub fn write_manifest(path: impl AsRef<Path>, entries: &[ManifestEntry]) -> Result<()> {
    let lines: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
    fs::write(path, lines.join("\n"))?;
    Ok(())
}
