//! qxrule - mirror Clash rule lists into Quantumult X filter files.
//!
//! Each configured section names a policy tag and a set of remote Clash rule
//! lists. Every list is fetched, compared against a checksum ledger, and when
//! it changed, converted line by line into the Quantumult X dialect,
//! deduplicated, sorted and written out. A `filter_remote` manifest pointing
//! at the mirrored files is regenerated at the end of the run.
//!
//! # Features
//!
//! - **Dialect translation**: `DOMAIN*` kinds become `HOST*` kinds, other
//!   kinds pass through
//! - **Policy normalization**: service policies collapse into the section
//!   tag, `DIRECT`/`REJECT` are kept, `NO-RESOLVE` becomes `TAG,no-resolve`
//! - **Canonical order**: address ranges sort numerically, so output files
//!   are byte-identical across runs
//! - **Change detection**: SHA-256 ledger keyed by output file
//! - **All-or-nothing commit**: a failed source blocks the manifest and
//!   ledger update for the whole run
//!
//! # Quick Start
//!
//! ```ignore
//! use qxrule::{ConvertConfig, HttpFetcher, SectionConverter};
//!
//! let config = ConvertConfig::default();
//! let fetcher = HttpFetcher::new(config.timeout)?;
//! let mut converter = SectionConverter::init(config, fetcher)?;
//! let report = converter.run()?;
//! ```
//!
//! # Rule Translation
//!
//! ```
//! use qxrule::converter::{parse_line, ParsedLine};
//!
//! if let ParsedLine::Rule { rule, .. } = parse_line("DOMAIN,example.com,REJECT", "MYTAG") {
//!     assert_eq!(rule.to_string(), "HOST,example.com,REJECT");
//! }
//! ```

mod error;
mod rule_type;

pub mod config;
pub mod converter;
pub mod fetch;
pub mod interrupt;
pub mod ledger;
pub mod manifest;
pub mod policy;
pub mod scratch;
pub mod sections;

// Re-export core types
pub use error::{Error, Result};
pub use rule_type::RuleKind;

pub use config::ConvertConfig;
pub use converter::{RuleLine, RunReport, SectionConverter};
pub use fetch::{HttpFetcher, RuleFetcher};
pub use interrupt::Interrupt;
pub use ledger::ChecksumLedger;
pub use manifest::ManifestEntry;
pub use policy::{ForcePolicy, PolicyResolution};
pub use sections::Section;
