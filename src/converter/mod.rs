//! Clash to Quantumult X rule conversion.

mod clash;
mod rule_line;
mod section;
mod sort;

pub use clash::{collect_snapshot, is_provider_payload};
pub use rule_line::{parse_line, ParsedLine, RuleCollector, RuleLine};
pub use section::{RunReport, SectionConverter};
pub use sort::{parse_network, sort_rules};
