//! inline-media - command line front end
//!
//! Drives the conversion and reconciliation pipelines against a local
//! collection directory.

mod cli;

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inline_media::host::TerminalHost;
use inline_media::media::{FfmpegTranscoder, Transcoder};
use inline_media::services::clipboard;
use inline_media::{AppConfig, HostServices, InlineMedia, LocalCollection, MediaSource};

use crate::cli::{CliOptions, Command, USAGE};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let options = match CliOptions::from_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let mut config = AppConfig::from_env()?;
    if let Some(path) = options.collection_override {
        config.collection_path = path;
    }
    let media_config = config.media_config()?;
    tracing::info!(collection = %config.collection_path.display(), "Configuration loaded");

    // The main thread plays the UI thread; background work runs here.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let collection = Arc::new(LocalCollection::open(&config.collection_path)?);
    let transcoder = FfmpegTranscoder::locate(config.ffmpeg_path.as_deref())
        .map(|t| Arc::new(t) as Arc<dyn Transcoder>);

    let assume_yes = matches!(options.command, Command::Check { assume_yes: true });
    let host = Rc::new(TerminalHost::new(assume_yes));
    let mut app = InlineMedia::load(host, media_config, HostServices {
        media: collection.clone(),
        notes: collection.clone(),
        transcoder,
        runtime: runtime.handle().clone(),
    })?;

    match options.command {
        Command::Convert { kind, sources } => {
            let sources = sources.iter().map(|arg| source_from_arg(arg)).collect();
            app.convert(kind, sources, |batch| {
                for media in &batch.wins {
                    println!("{}", media.html);
                }
                if !batch.fails.is_empty() {
                    eprintln!("Failed to insert {}.", batch.fails.join(", "));
                }
            });
        }
        Command::Check { .. } => app.check_media(),
    }

    app.dispatcher().run_until_idle();
    tracing::info!("Done");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "inline_media=info".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// A command line argument is a URL when it looks like one, otherwise a path.
fn source_from_arg(arg: &str) -> MediaSource {
    if clipboard::is_media_url(arg) {
        MediaSource::from_url(arg)
    } else {
        MediaSource::from_path(PathBuf::from(arg))
    }
}
