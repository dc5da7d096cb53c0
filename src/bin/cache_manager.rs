use anyhow::Result;
use clap::{Parser, Subcommand};
use flix_catalog::config::Config;
use flix_catalog::metadata::LookupCacheManager;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cache-manager")]
#[command(about = "Metadata lookup cache management utility")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cache directory (defaults to the configured one)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Cache TTL in hours (defaults to the configured one)
    #[arg(long)]
    ttl_hours: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all cached titles
    List,
    /// Get cache statistics
    Stats,
    /// Invalidate the cached metadata for a title
    Invalidate {
        /// Normalized title, e.g. "Your Name"
        title: String,
    },
    /// Clear all cache entries
    Clear,
    /// Clean up expired cache entries
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    let cache_dir = cli.cache_dir.unwrap_or(config.cache.dir);
    let ttl_hours = cli.ttl_hours.unwrap_or(config.cache.ttl_hours);

    let cache_manager = LookupCacheManager::new(cache_dir, ttl_hours);
    cache_manager.initialize().await?;

    match cli.command {
        Commands::List => {
            let titles = cache_manager.list().await?;

            if titles.is_empty() {
                info!("📭 No cached titles found");
                return Ok(());
            }

            info!("📚 Found {} cached titles:", titles.len());

            for entry in titles {
                let status = if entry.is_valid { "✅ Valid" } else { "❌ Expired" };
                let poster = if entry.has_poster { "poster" } else { "no poster" };
                info!("  {} - {}, {} hours old, {}", entry.title, poster, entry.age_hours, status);
                info!("    Key: {}", entry.cache_key);
            }
        }

        Commands::Stats => {
            let stats = cache_manager.stats().await?;
            info!("📊 Cache Statistics ({}):", cache_manager.cache_dir().display());
            info!("  Total files: {}", stats.total_files);
            info!("  Valid files: {}", stats.valid_files);
            info!("  Expired files: {}", stats.expired_files);
        }

        Commands::Invalidate { title } => {
            if cache_manager.invalidate(&title).await? {
                info!("✅ Successfully invalidated cache for: {}", title);
            } else {
                warn!("⚠️ No cache found for: {}", title);
            }
        }

        Commands::Clear => {
            let count = cache_manager.clear_all().await?;
            info!("🧹 Cleared {} cache files", count);
        }

        Commands::Cleanup => {
            let count = cache_manager.cleanup_expired().await?;
            info!("🗑️ Cleaned up {} expired cache files", count);
        }
    }

    Ok(())
}
