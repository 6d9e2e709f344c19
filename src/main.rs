use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, bail};
use tokio::time::timeout_at;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use artloader::domain::ports::ArtworkSource;
use artloader::infrastructure::artwork::{
    DirectoryArtworkSource, DiskArtworkStore, HttpArtworkSource, ServerCredentials,
};
use artloader::infrastructure::config::{AppConfig, CliArgs, StorageManager};
use artloader::infrastructure::image::{CompletionReceiver, ImageLoader, PlaceholderAssets};
use artloader::presentation::{ConsumerTarget, ImageView};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const IDLE_POLL: Duration = Duration::from_millis(100);

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

async fn create_source(config: &AppConfig) -> Result<Arc<dyn ArtworkSource>> {
    let source = &config.source;
    if let Some(dir) = &source.directory {
        info!(dir = %dir.display(), "Reading artwork from directory");
        return Ok(Arc::new(DirectoryArtworkSource::new(dir.clone())));
    }
    let Some(server_url) = &source.server_url else {
        bail!("no artwork source configured; pass --source-dir or --server-url");
    };

    let store = DiskArtworkStore::open(source.effective_cache_dir(), source.disk_cache_bytes)
        .await
        .wrap_err("failed to open artwork store")?;
    let credentials = ServerCredentials {
        username: source.username.clone(),
        password: source.password.clone(),
        client_name: source.client_name.clone(),
    };
    info!(server = %server_url, "Fetching artwork from server");
    Ok(Arc::new(HttpArtworkSource::new(
        server_url,
        credentials,
        source.timeout(),
        Some(Arc::new(store)),
    )?))
}

/// Applies deliveries until every view shows real artwork or the loader
/// has nothing left to do.
async fn settle(
    loader: &ImageLoader,
    receiver: &mut CompletionReceiver,
    views: &[(String, Arc<ImageView>)],
    deadline: tokio::time::Instant,
) -> bool {
    let resolved = || {
        views.iter().all(|(_, view)| {
            view.image()
                .is_some_and(|image| !loader.placeholders().is_placeholder(&image))
        })
    };
    loop {
        if resolved() {
            return true;
        }

        let stats = loader.stats();
        if loader.pending_count() == 0 && stats.accepted == stats.completed + stats.failed {
            receiver.drain();
            return resolved();
        }

        match timeout_at(deadline, tokio::time::timeout(IDLE_POLL, receiver.apply_next())).await {
            Err(_) => {
                warn!("Timed out waiting for artwork");
                return false;
            }
            Ok(Ok(None)) => return false,
            Ok(Ok(Some(_)) | Err(_)) => {}
        }
    }
}

async fn finish_transitions(views: &[(String, Arc<ImageView>)]) {
    while views.iter().any(|(_, view)| view.tick(Instant::now())) {
        tokio::time::sleep(FRAME_INTERVAL).await;
    }
}

fn file_name_for(content_id: &str) -> String {
    let stem: String = content_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.png")
}

fn write_artwork(out: &Path, views: &[(String, Arc<ImageView>)]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out)?;
    let mut written = Vec::with_capacity(views.len());
    for (content_id, view) in views {
        let Some(image) = view.image() else {
            continue;
        };
        let path = out.join(file_name_for(content_id));
        image
            .save(&path)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = artloader::VERSION, "Starting {}", artloader::NAME);

    let source = create_source(&config).await?;
    let (loader, mut receiver) = ImageLoader::start(
        config.loader.clone(),
        source,
        config.display,
        PlaceholderAssets::builtin(),
    )?;

    let views: Vec<(String, Arc<ImageView>)> = args
        .ids
        .iter()
        .map(|id| (id.clone(), Arc::new(ImageView::new())))
        .collect();
    for (content_id, view) in &views {
        let target = ConsumerTarget::from(view.clone());
        loader.load_image(&target, Some(content_id), args.large, args.crossfade);
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.timeout);
    let resolved = settle(&loader, &mut receiver, &views, deadline).await;
    finish_transitions(&views).await;

    let written = write_artwork(&args.out, &views)?;
    for path in &written {
        println!("{}", path.display());
    }

    info!(
        resolved,
        written = written.len(),
        loader = %loader.stats(),
        cache = %loader.cache_stats(),
        "Artwork run complete"
    );

    loader.shutdown().await;
    Ok(())
}
