//! Tallybot binary: wires the adapters to the engine and runs the console
//! transport for a single local user.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tallybot::adapters::{
    ConsoleTransport, OcrSpaceConfig, OcrSpaceRecognizer, SheetWebhookConfig, SheetWebhookStore,
};
use tallybot::application::Engine;
use tallybot::config::AppConfig;
use tallybot::domain::catalog::Catalog;
use tallybot::domain::foundation::UserId;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone())),
        )
        .init();

    let ocr_config = OcrSpaceConfig::new(config.ocr.api_key.clone().unwrap_or_default())
        .with_endpoint(config.ocr.endpoint.clone())
        .with_language(config.ocr.language.clone())
        .with_timeout(config.ocr.timeout());
    let recognizer = Arc::new(OcrSpaceRecognizer::new(ocr_config));

    let sheet_config = SheetWebhookConfig::new(config.sheet.webhook_url.clone())
        .with_timeout(config.sheet.timeout());
    let store = Arc::new(SheetWebhookStore::new(sheet_config));

    let catalog = Arc::new(Catalog::default_catalog().clone());
    let engine = Arc::new(Engine::new(catalog, recognizer, store));

    info!("tallybot started");

    let user_id = UserId::new("console")?;
    let transport = ConsoleTransport::new(engine, user_id, "Console User");
    transport.run().await?;

    Ok(())
}
