//! Converter configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Mirror prefix under which converted files are published.
pub const DEFAULT_MIRROR_PREFIX: &str =
    "https://mirror.ghproxy.com/https://raw.githubusercontent.com/Regan-He/ACL4SSR/main";

/// Directory (relative to the root) holding all converter files.
pub const DEFAULT_OUTPUT_DIR: &str = "QuantumultX";

/// Refresh interval advertised in the manifest, in seconds.
pub const DEFAULT_UPDATE_INTERVAL: u64 = 86400;

/// Paths and constants used by a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Working root; every other path is relative to it
    pub root: PathBuf,
    /// Output directory, also the prefix of every output identifier
    pub output_dir: String,
    /// Section file name inside the output directory
    pub rule_file: String,
    /// Ledger file name inside the output directory
    pub ledger_file: String,
    /// Manifest file name inside the output directory
    pub manifest_file: String,
    /// Scratch directory name inside the output directory
    pub scratch_dir: String,
    /// Mirror URL prefix for manifest entries
    pub mirror_prefix: String,
    /// Manifest refresh interval in seconds
    pub update_interval: u64,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            rule_file: "ClashRule.conf".to_string(),
            ledger_file: "ClashRule-lock.json".to_string(),
            manifest_file: "filter_remote.conf".to_string(),
            scratch_dir: "tmp".to_string(),
            mirror_prefix: DEFAULT_MIRROR_PREFIX.to_string(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ConvertConfig {
    /// Create the default configuration rooted at the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different working root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Use a different mirror prefix.
    pub fn with_mirror_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mirror_prefix = prefix.into();
        self
    }

    /// Use a different HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Identifier of the output file for a local source name.
    ///
    /// This relative, `/`-separated string keys the ledger and appears in
    /// manifest URLs.
    pub fn output_identifier(&self, name: &str) -> String {
        if self.output_dir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.output_dir, name)
        }
    }

    /// Filesystem path of an output identifier.
    pub fn output_path(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }

    fn in_output_dir(&self, name: &str) -> PathBuf {
        self.root.join(&self.output_dir).join(name)
    }

    /// Path of the section file.
    pub fn rule_file_path(&self) -> PathBuf {
        self.in_output_dir(&self.rule_file)
    }

    /// Path of the ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.in_output_dir(&self.ledger_file)
    }

    /// Path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.in_output_dir(&self.manifest_file)
    }

    /// Path of the scratch directory.
    pub fn scratch_path(&self) -> PathBuf {
        self.in_output_dir(&self.scratch_dir)
    }
}
