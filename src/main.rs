use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

use intentbot::chatbot::{ChatbotEngine, GeminiClient, IncomingMessage, OpenWeatherClient, Services, TelegramClient};
use intentbot::config::Config;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => fail_startup(&format!("Failed to load configuration: {e}")),
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("intentbot")
        .filename_suffix("log")
        .build(&log_dir)
    {
        Ok(appender) => appender,
        Err(e) => fail_startup(&format!("Failed to open log file in {}: {e}", log_dir.display())),
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Bot is starting...");
    info!("Logging to {}", log_dir.display());

    let bot = Bot::new(&config.telegram_token);

    let engine = match build_engine(&config, &bot) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!("Failed to build HTTP clients: {e}");
            std::process::exit(1);
        }
    };
    info!("Handling up to {} messages at once", config.max_concurrent_requests);

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
}

/// Subscriber for errors raised before the log directory is known.
fn startup_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt().with_writer(writer).with_ansi(false).with_target(false).finish()
}

fn fail_startup(message: &str) -> ! {
    tracing::subscriber::with_default(startup_subscriber(std::io::stderr), || error!("{message}"));
    std::process::exit(1);
}

fn build_engine(config: &Config, bot: &Bot) -> intentbot::error::Result<ChatbotEngine> {
    let gemini = Arc::new(GeminiClient::new(
        config.google_api_key.clone(),
        config.gemini_api_base.clone(),
        config.gemini_chat_model.clone(),
    )?);
    let weather = OpenWeatherClient::new(config.weather_api_key.clone(), config.weather_api_url.clone())?;

    let services = Services {
        transport: Arc::new(TelegramClient::new(bot.clone())),
        weather: Arc::new(weather),
        chat_model: gemini.clone(),
        image_model: gemini,
    };

    Ok(ChatbotEngine::new(services, config.max_concurrent_requests))
}

async fn handle_message(msg: Message, engine: Arc<ChatbotEngine>) -> ResponseResult<()> {
    match IncomingMessage::from_telegram(&msg) {
        Some(incoming) => engine.handle_message(incoming).await,
        None => debug!("Ignoring non-text message {} in chat {}", msg.id, msg.chat.id),
    }
    Ok(())
}
