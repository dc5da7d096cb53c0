use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::fmt::Formatter;
use tracing_subscriber::{reload, EnvFilter};

use flix_catalog::archive::{ArchiveSource, DirectoryArchive, ExportArchive};
use flix_catalog::catalog::{document, identity};
use flix_catalog::config::{ArchiveKind, Config};
use flix_catalog::pipeline::CatalogPipeline;
use flix_catalog::title;

#[derive(Parser)]
#[command(name = "flix-catalog")]
#[command(version, about = "Builds a browsable media catalog from a message archive of video files")]
struct Cli {
    /// Configuration file (defaults to the standard search path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Export,
    Directory,
}

impl From<SourceArg> for ArchiveKind {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Export => ArchiveKind::Export,
            SourceArg::Directory => ArchiveKind::Directory,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the archive and write the catalog document
    Scan {
        /// Export file or directory to scan
        #[arg(long)]
        archive: Option<PathBuf>,
        /// Archive reader
        #[arg(long, value_enum)]
        source: Option<SourceArg>,
        /// Catalog document to write
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Prior document to carry overrides from
        #[arg(long)]
        prior: Option<PathBuf>,
        /// Category qualifying entry identifiers
        #[arg(long)]
        category: Option<String>,
        /// Skip metadata lookups
        #[arg(long)]
        no_lookup: bool,
    },
    /// Show how filenames are parsed
    Extract {
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// Serve the catalog document over HTTP
    #[cfg(feature = "api")]
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        /// Catalog document to serve
        #[arg(long)]
        document: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging comes up before the config so load warnings are not lost;
    // the configured level is applied once the file has been read
    let log_filter = init_logging(cli.verbose);
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    log_filter.apply_level(&config.output.log_level);
    debug!("{}", config.summary());

    match cli.command {
        Commands::Scan {
            archive,
            source,
            output,
            prior,
            category,
            no_lookup,
        } => {
            let mut config = config;
            if let Some(archive) = archive {
                config.archive.path = archive;
            }
            if let Some(source) = source {
                config.archive.source = source.into();
            }
            if let Some(output) = output {
                config.output.path = output;
            }
            if prior.is_some() {
                config.output.prior = prior;
            }
            if category.is_some() {
                config.archive.category = category;
            }
            if no_lookup {
                config.lookup.enabled = false;
            }
            run_scan(config).await
        }
        Commands::Extract { filenames } => {
            let category = config.archive.category.as_deref();
            for filename in filenames {
                let parsed = title::extract(&filename);
                let report = serde_json::json!({
                    "filename": filename,
                    "id": identity::assign_with_category(&parsed.normalized_title, category),
                    "parsed": parsed,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        #[cfg(feature = "api")]
        Commands::Serve { port, document } => {
            let mut server = flix_catalog::api::ApiServer::from_config(&config);
            if let Some(port) = port {
                server = server.with_port(port);
            }
            if let Some(document) = document {
                server = server.with_document(document);
            }
            server.start().await
        }
    }
}

/// Handle for swapping in the configured log level after startup
struct LogFilter {
    handle: reload::Handle<EnvFilter, Formatter>,
    /// `--verbose` or `RUST_LOG` chose the filter; the config level does not apply
    pinned: bool,
}

impl LogFilter {
    fn apply_level(&self, level: &str) {
        if self.pinned {
            return;
        }
        if let Err(e) = self.handle.reload(level_filter(level)) {
            warn!("Cannot apply log level '{}': {}", level, e);
        }
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("flix_catalog={},warn", level))
}

fn init_logging(verbose: bool) -> LogFilter {
    let (filter, pinned) = if verbose {
        (EnvFilter::new("flix_catalog=debug,warn"), true)
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, true),
            Err(_) => (level_filter("info"), false),
        }
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_filter_reloading();
    let handle = builder.reload_handle();
    builder.init();

    LogFilter { handle, pinned }
}

async fn run_scan(config: Config) -> Result<()> {
    config.validate()?;
    info!("🚀 Flix Catalog starting...");
    info!("{}", config.summary());

    let mut archive: Box<dyn ArchiveSource> = match config.archive.source {
        ArchiveKind::Export => Box::new(
            ExportArchive::open(&config.archive.path, config.archive.channel_id)
                .await
                .context("Cannot open archive")?,
        ),
        ArchiveKind::Directory => {
            Box::new(DirectoryArchive::open(&config.archive.path).context("Cannot open archive")?)
        }
    };

    let mut pipeline = CatalogPipeline::from_config(&config).await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let report = pipeline.run_until(archive.as_mut(), shutdown).await;

    document::write_document(&config.output.path, &report.entries).await?;
    info!("{}", report.summary());

    if report.stats.interrupted {
        warn!("⚠️ Catalog written from a partial scan");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_filter(initial: EnvFilter, pinned: bool) -> (LogFilter, reload::Layer<EnvFilter, Formatter>) {
        let (layer, handle) = reload::Layer::new(initial);
        (LogFilter { handle, pinned }, layer)
    }

    fn current(filter: &LogFilter) -> String {
        filter.handle.with_current(|f| f.to_string()).unwrap()
    }

    #[test]
    fn test_config_level_replaces_startup_default() {
        let (filter, _layer) = log_filter(level_filter("info"), false);
        filter.apply_level("debug");
        assert!(current(&filter).contains("flix_catalog=debug"));
    }

    #[test]
    fn test_verbose_filter_is_kept() {
        let (filter, _layer) = log_filter(EnvFilter::new("flix_catalog=debug,warn"), true);
        filter.apply_level("error");
        assert!(current(&filter).contains("flix_catalog=debug"));
        assert!(!current(&filter).contains("flix_catalog=error"));
    }
}
