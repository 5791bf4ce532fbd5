//! Clash rule list snapshots: plain `.list` text or rule-provider YAML.

use serde::Deserialize;

use super::RuleCollector;
use crate::Result;

/// Rule provider payload structure.
#[derive(Debug, Deserialize)]
struct ProviderPayload {
    #[serde(default)]
    payload: Vec<String>,
}

/// Check whether a snapshot is a Clash rule-provider document.
pub fn is_provider_payload(text: &str) -> bool {
    text.lines().any(|line| line.trim_end().starts_with("payload:"))
}

/// Feed every rule of a snapshot into a collector.
///
/// Provider documents are decoded and their `payload` entries parsed one by
/// one; anything else is read line by line.
pub fn collect_snapshot(collector: &mut RuleCollector, text: &str) -> Result<()> {
    if is_provider_payload(text) {
        let provider: ProviderPayload = serde_yaml::from_str(text)?;
        for entry in &provider.payload {
            collector.push_line(entry);
        }
    } else {
        for line in text.lines() {
            collector.push_line(line);
        }
    }
    Ok(())
}
