//! Section conversion: fetch, change check, normalize, sort, write.

use std::fs;

use super::{collect_snapshot, sort_rules, RuleCollector};
use crate::config::ConvertConfig;
use crate::fetch::RuleFetcher;
use crate::interrupt::Interrupt;
use crate::ledger::ChecksumLedger;
use crate::manifest::{write_manifest, ManifestEntry};
use crate::scratch::ScratchDir;
use crate::sections::{load_sections, Section};
use crate::Result;

/// Aggregated outcome of a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Sources whose snapshot differed from the ledger
    pub changed: usize,
    /// Sources whose snapshot matched the ledger
    pub unchanged: usize,
    /// Sources skipped because of an error
    pub failed: usize,
    /// Set when any source failed; blocks the final commit
    pub error_found: bool,
    /// Manifest regenerated from the current sections
    pub manifest: Vec<ManifestEntry>,
    /// Set when the run stopped early on request; blocks the final commit
    pub interrupted: bool,
    /// Whether manifest and ledger were written
    pub committed: bool,
}

impl RunReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manifest and ledger are written only if something changed, nothing
    /// failed and the run was not interrupted.
    pub fn should_commit(&self) -> bool {
        self.changed > 0 && !self.error_found && !self.interrupted
    }
}

/// Result of converting a single source.
enum SourceStatus {
    Unchanged,
    Rewritten,
}

/// Converts every configured section into Quantumult X rule files.
///
/// # Example
///
/// ```ignore
/// use qxrule::{ConvertConfig, HttpFetcher, SectionConverter};
///
/// let config = ConvertConfig::default();
/// let fetcher = HttpFetcher::new(config.timeout)?;
/// let mut converter = SectionConverter::init(config, fetcher)?;
/// let report = converter.run()?;
/// println!("{} sources changed", report.changed);
/// ```
pub struct SectionConverter<F> {
    config: ConvertConfig,
    fetcher: F,
    sections: Vec<Section>,
    ledger: ChecksumLedger,
    scratch: ScratchDir,
    interrupt: Interrupt,
}

impl<F: RuleFetcher> SectionConverter<F> {
    /// Prepare a run: load the section file and the ledger, then create the
    /// scratch directory.
    ///
    /// Any error here aborts the run before network activity and leaves the
    /// filesystem untouched.
    pub fn init(config: ConvertConfig, fetcher: F) -> Result<Self> {
        let sections = load_sections(config.rule_file_path())?;
        let ledger = ChecksumLedger::load(config.ledger_path())?;
        let scratch = ScratchDir::create(config.scratch_path())?;

        log::debug!(
            "Loaded {} sections and {} ledger entries",
            sections.len(),
            ledger.len()
        );

        Ok(Self {
            config,
            fetcher,
            sections,
            ledger,
            scratch,
            interrupt: Interrupt::new(),
        })
    }

    /// Share an interrupt with a signal handler.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Get the loaded sections.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Get the in-memory ledger.
    pub fn ledger(&self) -> &ChecksumLedger {
        &self.ledger
    }

    /// Convert all sections, then commit manifest and ledger if allowed.
    pub fn run(&mut self) -> Result<RunReport> {
        let mut report = RunReport::new();
        let sections = std::mem::take(&mut self.sections);

        for section in &sections {
            let entries = self.process_section(section, &mut report);
            report.manifest.extend(entries);
            if report.interrupted {
                break;
            }
        }

        self.sections = sections;
        report.committed = self.commit(&report)?;
        Ok(report)
    }

    /// Convert every source of one section.
    ///
    /// Returns a manifest entry per source, whether or not it changed. Stops
    /// before the next source once an interrupt is requested.
    pub fn process_section(
        &mut self,
        section: &Section,
        report: &mut RunReport,
    ) -> Vec<ManifestEntry> {
        let tag = section.tag();
        let mut entries = Vec::new();

        for (name, url) in section.sources() {
            if self.interrupt.is_requested() {
                log::warn!("Interrupted before {}: {}", tag, url);
                report.interrupted = true;
                break;
            }
            let identifier = self.config.output_identifier(name);

            match self.convert_source(tag, url, &identifier) {
                Ok(SourceStatus::Unchanged) => {
                    log::info!("Skip processing {}: {}", tag, url);
                    report.unchanged += 1;
                }
                Ok(SourceStatus::Rewritten) => {
                    report.changed += 1;
                }
                Err(e) => {
                    log::warn!("Failed to convert remote rule {}: {}: {}", tag, url, e);
                    report.failed += 1;
                    report.error_found = true;
                }
            }

            entries.push(ManifestEntry::new(
                &self.config.mirror_prefix,
                &identifier,
                tag,
                self.config.update_interval,
            ));
        }

        entries
    }

    fn convert_source(&mut self, tag: &str, url: &str, identifier: &str) -> Result<SourceStatus> {
        let snapshot = self.fetcher.fetch(url)?;
        self.scratch.store(&snapshot)?;

        if !self.ledger.changed(&snapshot, identifier) {
            return Ok(SourceStatus::Unchanged);
        }
        log::info!("Start processing {}: {}", tag, url);

        let text = String::from_utf8_lossy(&snapshot);
        let mut collector = RuleCollector::new(tag);
        collect_snapshot(&mut collector, &text)?;
        if collector.is_empty() {
            log::warn!("No rules found in {}: {}", tag, url);
        } else {
            log::debug!("Collected {} rules from {}: {}", collector.len(), tag, url);
        }

        let unknown: Vec<&str> = collector.unknown_policies().collect();
        if !unknown.is_empty() {
            log::warn!(
                "Found unknown policy names {:?} from {}: {}",
                unknown,
                tag,
                url
            );
        }
        if collector.malformed() > 0 {
            log::debug!(
                "Ignored {} malformed lines from {}: {}",
                collector.malformed(),
                tag,
                url
            );
        }

        let rules = sort_rules(collector.into_rules())?;

        let mut body = String::new();
        for rule in &rules {
            body.push_str(&rule.to_string());
            body.push('\n');
        }

        let path = self.config.output_path(identifier);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let _guard = self.interrupt.write_guard();
            fs::write(&path, body)?;
        }
        log::debug!("Wrote {} rules to {:?}", rules.len(), path);

        Ok(SourceStatus::Rewritten)
    }

    fn commit(&self, report: &RunReport) -> Result<bool> {
        let manifest_path = self.config.manifest_path();

        if report.changed == 0 {
            log::info!("No need to update {}", manifest_path.display());
            return Ok(false);
        }
        if report.interrupted {
            log::warn!("Interrupted, no need to update {}", manifest_path.display());
            return Ok(false);
        }
        if report.error_found {
            log::warn!(
                "Error found when getting remote rules, no need to update {}",
                manifest_path.display()
            );
            return Ok(false);
        }
        debug_assert!(report.should_commit());

        let _guard = self.interrupt.write_guard();
        if self.interrupt.is_requested() {
            log::warn!("Interrupted, no need to update {}", manifest_path.display());
            return Ok(false);
        }
        log::info!("{} rules need to be updated", report.changed);
        write_manifest(&manifest_path, &report.manifest)?;
        self.ledger.save(self.config.ledger_path())?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::Path;

    /// Serves canned bodies; unknown URLs fail like a 404.
    #[derive(Default)]
    struct MapFetcher {
        bodies: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl MapFetcher {
        fn with(self, url: &str, body: &str) -> Self {
            self.bodies
                .borrow_mut()
                .insert(url.to_string(), body.as_bytes().to_vec());
            self
        }
    }

    impl RuleFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.bodies
                .borrow()
                .get(url)
                .cloned()
                .ok_or_else(|| Error::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn setup(root: &Path, sections: &str) -> ConvertConfig {
        let config = ConvertConfig::new()
            .with_root(root)
            .with_mirror_prefix("https://mirror.test");
        fs::create_dir_all(root.join(&config.output_dir)).unwrap();
        fs::write(config.rule_file_path(), sections).unwrap();
        config
    }

    #[test]
    fn test_report_gate() {
        let mut report = RunReport::new();
        assert!(!report.should_commit());
        report.changed = 1;
        assert!(report.should_commit());
        report.error_found = true;
        assert!(!report.should_commit());
        report.error_found = false;
        report.interrupted = true;
        assert!(!report.should_commit());
    }

    #[test]
    fn test_init_requires_section_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConvertConfig::new().with_root(dir.path());
        let result = SectionConverter::init(config.clone(), MapFetcher::default());
        assert!(matches!(result, Err(Error::MissingConfig(_))));
        assert!(!config.scratch_path().exists());
        assert!(!dir.path().join(&config.output_dir).exists());
    }

    #[test]
    fn test_init_rejects_corrupt_ledger_before_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConvertConfig::new().with_root(dir.path());
        fs::write(config.rule_file_path(), "[T]
a.list = https://src/a
").unwrap();
        fs::write(config.ledger_path(), "{not json").unwrap();

        let result = SectionConverter::init(config.clone(), MapFetcher::default());
        assert!(matches!(result, Err(Error::Json(_))));
        assert!(!dir.path().join(&config.output_dir).exists());
    }

    #[test]
    fn test_process_section_skips_level() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(
            dir.path(),
            "[MEDIA]\nLEVEL = 1\nm.list = https://src/m\n",
        );
        let fetcher = MapFetcher::default().with("https://src/m", "DOMAIN,m.com,NETFLIX\n");
        let mut converter = SectionConverter::init(config.clone(), fetcher).unwrap();

        let section = converter.sections()[0].clone();
        let mut report = RunReport::new();
        let entries = converter.process_section(&section, &mut report);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://mirror.test/QuantumultX/m.list");
        assert_eq!(report.changed, 1);
        assert!(converter.ledger().get("QuantumultX/m.list").is_some());

        let written = fs::read_to_string(dir.path().join("QuantumultX/m.list")).unwrap();
        assert_eq!(written, "HOST,m.com,MEDIA\n");
    }

    #[test]
    fn test_scratch_holds_last_snapshot_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "[T]\na.list = https://src/a\n");
        let fetcher = MapFetcher::default().with("https://src/a", "DOMAIN,a.com\n");
        let mut converter = SectionConverter::init(config.clone(), fetcher).unwrap();
        converter.run().unwrap();

        let snapshot = config.scratch_path().join("process_conf.list");
        assert_eq!(fs::read_to_string(&snapshot).unwrap(), "DOMAIN,a.com\n");

        drop(converter);
        assert!(!config.scratch_path().exists());
    }

    #[test]
    fn test_source_without_rules_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "[T]\ne.list = https://src/e\n");
        let fetcher = MapFetcher::default().with("https://src/e", "# NAME: empty\n\n");
        let mut converter = SectionConverter::init(config.clone(), fetcher).unwrap();
        let report = converter.run().unwrap();

        assert_eq!(report.changed, 1);
        assert!(report.committed);
        assert_eq!(
            fs::read_to_string(dir.path().join("QuantumultX/e.list")).unwrap(),
            ""
        );
    }

    #[test]
    fn test_invalid_cidr_fails_only_that_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(
            dir.path(),
            "[T]\nbad.list = https://src/bad\ngood.list = https://src/good\n",
        );
        fs::write(dir.path().join("QuantumultX/bad.list"), "OLD\n").unwrap();
        let fetcher = MapFetcher::default()
            .with("https://src/bad", "IP-CIDR,300.0.0.0/8\n")
            .with("https://src/good", "DOMAIN,g.com\n");
        let mut converter = SectionConverter::init(config.clone(), fetcher).unwrap();
        let report = converter.run().unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.changed, 1);
        assert!(report.error_found);
        assert!(!report.committed);
        assert_eq!(report.manifest.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("QuantumultX/bad.list")).unwrap(),
            "OLD\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("QuantumultX/good.list")).unwrap(),
            "HOST,g.com,T\n"
        );
        assert!(!config.manifest_path().exists());
        assert!(!config.ledger_path().exists());
    }

    /// Requests an interrupt as soon as the first URL is fetched.
    struct InterruptingFetcher {
        inner: MapFetcher,
        interrupt: Interrupt,
        fetched: RefCell<Vec<String>>,
    }

    impl RuleFetcher for InterruptingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.fetched.borrow_mut().push(url.to_string());
            self.interrupt.request();
            self.inner.fetch(url)
        }
    }

    #[test]
    fn test_interrupt_before_run_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "[T]
a.list = https://src/a
");
        let interrupt = Interrupt::new();
        let fetcher = InterruptingFetcher {
            inner: MapFetcher::default().with("https://src/a", "DOMAIN,a.com\n"),
            interrupt: Interrupt::new(),
            fetched: RefCell::new(Vec::new()),
        };
        let mut converter = SectionConverter::init(config.clone(), fetcher)
            .unwrap()
            .with_interrupt(interrupt.clone());
        assert!(config.scratch_path().exists());

        interrupt.request();
        let report = converter.run().unwrap();

        assert!(report.interrupted);
        assert!(!report.committed);
        assert_eq!(report.changed, 0);
        assert!(converter.fetcher.fetched.borrow().is_empty());
        assert!(!dir.path().join("QuantumultX/a.list").exists());

        drop(converter);
        assert!(!config.scratch_path().exists());
        assert!(!config.manifest_path().exists());
        assert!(!config.ledger_path().exists());
    }

    #[test]
    fn test_interrupt_stops_between_sources() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(
            dir.path(),
            "[A]
a.list = https://src/a
b.list = https://src/b
[B]
c.list = https://src/c
",
        );
        let interrupt = Interrupt::new();
        let fetcher = InterruptingFetcher {
            inner: MapFetcher::default()
                .with("https://src/a", "DOMAIN,a.com\n")
                .with("https://src/b", "DOMAIN,b.com\n")
                .with("https://src/c", "DOMAIN,c.com\n"),
            interrupt: interrupt.clone(),
            fetched: RefCell::new(Vec::new()),
        };
        let mut converter = SectionConverter::init(config.clone(), fetcher)
            .unwrap()
            .with_interrupt(interrupt);
        let report = converter.run().unwrap();

        // The source in flight finishes; nothing after it starts
        assert_eq!(*converter.fetcher.fetched.borrow(), vec!["https://src/a"]);
        assert!(report.interrupted);
        assert_eq!(report.changed, 1);
        assert!(!report.committed);
        assert_eq!(
            fs::read_to_string(dir.path().join("QuantumultX/a.list")).unwrap(),
            "HOST,a.com,A\n"
        );
        assert!(!dir.path().join("QuantumultX/b.list").exists());
        assert!(!config.manifest_path().exists());
        assert!(!config.ledger_path().exists());

        drop(converter);
        assert!(!config.scratch_path().exists());
    }

    #[test]
    fn test_interrupt_during_last_source_blocks_commit() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "[T]\na.list = https://src/a\n");
        let interrupt = Interrupt::new();
        let fetcher = InterruptingFetcher {
            inner: MapFetcher::default().with("https://src/a", "DOMAIN,a.com\n"),
            interrupt: interrupt.clone(),
            fetched: RefCell::new(Vec::new()),
        };
        let mut converter = SectionConverter::init(config.clone(), fetcher)
            .unwrap()
            .with_interrupt(interrupt);
        let report = converter.run().unwrap();

        assert_eq!(report.changed, 1);
        assert!(!report.committed);
        assert!(!config.manifest_path().exists());
        assert!(!config.ledger_path().exists());
    }
}
