use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use bragi_config::{ConfigLoad, ConfigLoader, LoaderConfigSource};
use bragi_core::{
    ByteSize, FetchOutcome, ImageLoader,
    memory::{FixedMemoryProbe, MemoryProbe, SystemMemoryProbe},
    text::{Playlists, art_cache_key, clean_unicode},
    transport::HttpTransport,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser)]
#[command(name = "bragictl", about = "Bragi album-art loader tools")]
struct Cli {
    /// Load this .env file instead of searching for one
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch an image through the single-slot loader
    Fetch {
        url: Url,
        /// Cache key; empty means no identity (always fetches)
        #[arg(long, default_value = "")]
        key: String,
        /// Write the committed bytes here
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emulate a device heap with this many free bytes
        #[arg(long)]
        free_memory: Option<u64>,
        /// Load the same URL and key this many times
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Derive the album-art cache key for a track
    ArtKey {
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: Option<String>,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Parse a playlist option string into names
    Playlists { options: String },
    /// Print the effective loader configuration and where it came from
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Fetch {
            url,
            key,
            out,
            free_memory,
            repeat,
        } => {
            let load = load_config(cli.env_file)?;
            let probe: Arc<dyn MemoryProbe> = match free_memory {
                Some(bytes) => {
                    Arc::new(FixedMemoryProbe(ByteSize::from_bytes(bytes)))
                }
                None => Arc::new(SystemMemoryProbe),
            };
            let transport = HttpTransport::new()
                .context("failed to build HTTP client")?;
            let loader = ImageLoader::builder(Arc::new(transport))
                .memory_probe(probe)
                .config(load.config)
                .build();

            for attempt in 1..=repeat.max(1) {
                let outcome = loader
                    .fetch(url.as_str(), &key)
                    .await
                    .with_context(|| format!("failed to load {url}"))?;
                tracing::info!(attempt, key = %key, ?outcome, "fetch finished");
                match outcome {
                    FetchOutcome::CacheHit => {
                        println!("#{attempt}: cache hit");
                    }
                    FetchOutcome::Committed { bytes, declared }
                        if bytes < declared =>
                    {
                        println!(
                            "#{attempt}: committed {bytes} of {declared} declared bytes (partial)"
                        );
                    }
                    FetchOutcome::Committed { bytes, .. } => {
                        println!("#{attempt}: committed {bytes} bytes");
                    }
                }
            }

            if let Some(out) = out {
                let data = loader.current_data().await.to_vec();
                std::fs::write(&out, &data).with_context(|| {
                    format!("failed to write {}", out.display())
                })?;
                println!("wrote {} to {}", ByteSize::from_usize(data.len()), out.display());
            }

            let stats = loader.stats();
            println!(
                "opens={} hits={} received={}",
                stats.transport_opens,
                stats.cache_hits,
                ByteSize::from_bytes(stats.bytes_received)
            );
        }
        Command::ArtKey {
            artist,
            album,
            title,
        } => {
            let album = album.as_deref().map(clean_unicode);
            println!(
                "{}",
                art_cache_key(
                    &clean_unicode(&artist),
                    album.as_deref(),
                    &clean_unicode(&title),
                )
            );
        }
        Command::Playlists { options } => {
            let playlists = Playlists::parse(&options);
            for (index, name) in playlists.names().iter().enumerate() {
                println!("{index}\t{}", clean_unicode(name));
            }
        }
        Command::Config => {
            let load = load_config(cli.env_file)?;
            print_config(&load);
        }
    }

    Ok(())
}

fn load_config(env_file: Option<PathBuf>) -> Result<ConfigLoad> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = env_file {
        loader = loader.with_env_file(path);
    }
    let load = loader
        .load()
        .context("failed to load loader configuration")?;

    tracing::info!(
        source = ?load.source,
        env_file = load.env_file_loaded,
        overrides = load.env_overrides.len(),
        "loader configuration resolved"
    );

    Ok(load)
}

fn print_config(load: &ConfigLoad) {
    let source = match &load.source {
        LoaderConfigSource::Default => "defaults".to_string(),
        LoaderConfigSource::EnvPath(path) => {
            format!("{} (BRAGI_LOADER_CONFIG_PATH)", path.display())
        }
        LoaderConfigSource::EnvInline => "BRAGI_LOADER_CONFIG_JSON".to_string(),
        LoaderConfigSource::File(path) => path.display().to_string(),
    };

    println!("source           = {source}");
    println!("max_image_bytes  = {}", load.config.max_image_bytes);
    println!("headroom_factor  = {}", load.config.headroom_factor);
    println!("timeout          = {:?}", load.config.timeout);
    println!("truncation       = {:?}", load.config.truncation);
    if !load.env_overrides.is_empty() {
        println!("env overrides    = {}", load.env_overrides.join(", "));
    }
    for warning in &load.warnings.items {
        match &warning.hint {
            Some(hint) => println!("warning: {} ({hint})", warning.message),
            None => println!("warning: {}", warning.message),
        }
    }
}
