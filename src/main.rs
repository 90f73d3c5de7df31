use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use reel_relay::cli::{Cli, Commands};
use reel_relay::core::{config, init_logger, log_startup_configuration, RelayConfig};
use reel_relay::download::file::prepare_download_dir;
use reel_relay::download::redirect::{RedirectResolver, UrlResolver};
use reel_relay::download::size_gate;
use reel_relay::download::ytdlp::{self, YtDlpExtractor};
use reel_relay::download::{DownloadDispatcher, HttpSession, RelayPipeline, UrlMatcher};
use reel_relay::telegram::{create_bot, schema, HandlerDeps, TelegramGateway};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Fetch { text, keep }) => run_cli_fetch(&text, keep).await,
        Some(Commands::YtdlpVersion) => {
            ytdlp::print_ytdlp_version(&config::YTDL_BIN)?;
            Ok(())
        }
    }
}

/// Reads the configuration and makes sure the download folder exists.
fn load_config() -> Result<RelayConfig> {
    let mut relay_config = RelayConfig::from_env();
    relay_config.download_dir = prepare_download_dir(&relay_config.download_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to prepare download folder {}: {}",
            relay_config.download_dir.display(),
            e
        )
    })?;
    log_startup_configuration(&relay_config);
    Ok(relay_config)
}

async fn run_bot() -> Result<()> {
    let relay_config = load_config()?;
    let bot = create_bot()?;

    let session = Arc::new(HttpSession::new(relay_config.redirect_timeout));
    let shutdown = CancellationToken::new();
    let dispatcher = Arc::new(DownloadDispatcher::new(
        Arc::new(YtDlpExtractor::new(relay_config.ytdl_bin.clone())),
        &relay_config,
        shutdown.clone(),
    ));
    let pipeline = Arc::new(RelayPipeline::new(
        UrlMatcher::default(),
        Arc::new(RedirectResolver::new(Arc::clone(&session))),
        dispatcher,
        Arc::new(TelegramGateway::new(bot.clone())),
        relay_config.max_file_size,
    ));

    let tasks = TaskTracker::new();
    let handler = schema(HandlerDeps::new(pipeline, tasks.clone()));

    log::info!("Starting bot polling...");
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;
    log::info!("Bot polling stopped.");

    // Jobs still waiting for a worker slot are dropped; running ones finish.
    shutdown.cancel();
    tasks.close();
    if tokio::time::timeout(config::shutdown::drain_timeout(), tasks.wait())
        .await
        .is_err()
    {
        log::warn!("{} relay task(s) still running at shutdown", tasks.len());
    }

    session.shutdown().await;
    Ok(())
}

/// Runs match → resolve → download → size check for `text` and prints the result.
async fn run_cli_fetch(text: &str, keep: bool) -> Result<()> {
    let relay_config = load_config()?;

    let Some(matched) = UrlMatcher::default().find(text) else {
        println!("No supported link found");
        return Ok(());
    };
    println!("Matched {} URL: {}", matched.platform, matched.url);

    let session = Arc::new(HttpSession::new(relay_config.redirect_timeout));
    let url = RedirectResolver::new(Arc::clone(&session)).resolve(&matched).await;
    session.shutdown().await;
    println!("Using URL for download: {}", url);

    let dispatcher = DownloadDispatcher::new(
        Arc::new(YtDlpExtractor::new(relay_config.ytdl_bin.clone())),
        &relay_config,
        CancellationToken::new(),
    );
    let file = dispatcher.dispatch(dispatcher.build_job(&url)).await?;

    let file = match size_gate::enforce(file, relay_config.max_file_size) {
        Ok(file) => file,
        Err(oversize) => {
            println!("{}", oversize.user_message());
            return Ok(());
        }
    };

    println!("Downloaded {} ({} bytes)", file.path().display(), file.size_bytes());
    if keep {
        file.keep();
    } else {
        file.remove()?;
        println!("Deleted local file");
    }
    Ok(())
}
