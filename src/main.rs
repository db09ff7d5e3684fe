use log::{info, warn};
use ratiowatch::api::mexc::StreamConnection;
use ratiowatch::config::Config;
use ratiowatch::core::{AlertEngine, PricePipeline, SharedThresholds, ThresholdControlSurface};
use ratiowatch::error::RatioWatchError;
use ratiowatch::logging;
use ratiowatch::notify::queue::QueuedSink;
use ratiowatch::notify::telegram::{TelegramBot, TelegramCommands};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Upper bound on flushing queued alerts at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), RatioWatchError> {
    logging::init();

    info!("Starting ratiowatch...");

    let config = Config::from_env()?;
    let band = config.load_thresholds()?;
    info!(
        "Watching {} / {} on {} with band [{}, {}]",
        config.stream.symbols.a, config.stream.symbols.b, config.stream.url, band.min, band.max
    );

    let thresholds = SharedThresholds::new(band);
    let bot = Arc::new(TelegramBot::new(config.telegram.clone())?);
    let (alerts, delivery_handle) = QueuedSink::spawn(bot.clone());

    let mut pipeline = PricePipeline::new(AlertEngine::new(thresholds.clone(), Arc::new(alerts)));
    let connection = StreamConnection::new(config.stream.clone());
    let cancel = CancellationToken::new();

    // Frame-processing task: sole owner of the price buffers
    let stream_handle = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            connection.run(&mut pipeline, cancel).await;
            info!("Matched {} pairs this session", pipeline.engine().log().len());
        }
    });

    // Command task: sole writer of the threshold band
    let control_handle = tokio::spawn({
        let cancel = cancel.clone();
        let surface = ThresholdControlSurface::new(thresholds);
        let mut commands = TelegramCommands::new(bot);
        async move {
            surface.run(&mut commands, cancel).await;
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal (Ctrl+C)");
    cancel.cancel();

    let (stream_result, control_result) = tokio::join!(stream_handle, control_handle);
    if let Err(e) = stream_result {
        warn!("Stream task failed: {}", e);
    }
    if let Err(e) = control_result {
        warn!("Control task failed: {}", e);
    }

    if tokio::time::timeout(DRAIN_TIMEOUT, delivery_handle).await.is_err() {
        warn!("Gave up waiting for pending alerts");
    }

    info!("Shutdown complete");
    Ok(())
}
