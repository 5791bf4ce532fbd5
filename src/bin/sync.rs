//! qxrule-sync: mirror the configured Clash rule lists into Quantumult X files.

use clap::Parser;
use qxrule::{ConvertConfig, HttpFetcher, Interrupt, SectionConverter};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "qxrule-sync")]
#[command(version)]
#[command(about = "Convert remote Clash rule lists into Quantumult X filter files", long_about = None)]
struct Cli {
    /// Working directory containing the QuantumultX folder
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Mirror URL prefix written into the manifest
    #[arg(long)]
    mirror: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ConvertConfig::new()
        .with_root(&cli.root)
        .with_timeout(Duration::from_secs(cli.timeout));
    if let Some(ref mirror) = cli.mirror {
        config = config.with_mirror_prefix(mirror.as_str());
    }

    let fetcher = HttpFetcher::new(config.timeout)?;
    let scratch_path = config.scratch_path();
    let mut converter = match SectionConverter::init(config, fetcher) {
        Ok(converter) => converter,
        Err(e) => return Err(format!("conversion invalid: {}", e).into()),
    };

    // A blocking fetch can stall for the whole timeout, so the handler cleans
    // up and exits itself once no output file is being written.
    let interrupt = Interrupt::new();
    let handler = interrupt.clone();
    ctrlc::set_handler(move || {
        handler.request();
        let _guard = handler.write_guard();
        log::warn!("Interrupted, removing {:?}", scratch_path);
        if let Err(e) = std::fs::remove_dir_all(&scratch_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove scratch directory {:?}: {}", scratch_path, e);
            }
        }
        std::process::exit(0);
    })?;
    converter = converter.with_interrupt(interrupt);

    let report = converter.run()?;
    log::info!(
        "Done: {} changed, {} unchanged, {} failed, manifest {}",
        report.changed,
        report.unchanged,
        report.failed,
        if report.committed { "updated" } else { "untouched" }
    );

    // Dropping the converter removes the scratch directory.
    Ok(())
}
