//! Translation preview binary - exercises the store against the real service
//!
//! Usage:
//!   cargo run --bin translate-preview                   # Resolve demo strings in the persisted language
//!   cargo run --bin translate-preview -- --language hi  # Switch language first
//!   cargo run --bin translate-preview -- --clear        # Drop cached translations first
//!
//! Required environment variables:
//! - LANGSTORE_BACKEND_URL
//!
//! Optional:
//! - LANGSTORE_API_KEY
//! - LANGSTORE_DATA_DIR (defaults to ./data)
//! - LANGSTORE_DEFAULT_LANGUAGE (defaults to en)
//! - LANGSTORE_REQUEST_TIMEOUT_SECS (defaults to 10)

use anyhow::Result;
use tracing::info;

use language_store::{
    bootstrap, BatchItem, BatchWarmer, Language, StoreConfig, TranslationBinding,
};

/// The strings the booking flow renders first; a realistic warm-up set.
fn demo_items() -> Vec<BatchItem> {
    vec![
        BatchItem::new("home.greeting", "Need a hand?"),
        BatchItem::new("signup.title", "Create your account"),
        BatchItem::new("services.towing", "Towing"),
        BatchItem::new("services.battery", "Battery jump-start"),
        BatchItem::new("services.flat_tyre", "Flat tyre repair"),
        BatchItem::new("workshops.nearby", "Workshops near you"),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("language_store=info".parse()?),
        )
        .init();

    // Load environment from .env file
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    let clear = args.iter().any(|arg| arg == "--clear");
    let language_arg = args
        .windows(2)
        .find(|pair| pair[0] == "--language")
        .map(|pair| pair[1].clone());

    info!("Loading configuration...");
    let config = StoreConfig::from_env()?;
    let store = bootstrap::init_http(&config).await?;

    if clear {
        info!("Clearing cached translations");
        store.clear_translations().await;
    }

    if let Some(code) = language_arg {
        store.set_language(Language::from_code(&code)?).await;
    }

    let language = store.current_language();
    println!();
    println!("╔══════════════════════════════════════════════╗");
    println!("║           TRANSLATION STORE PREVIEW          ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║ Language:    {:<32} ║", format!("{} ({})", language, language.native_name()));
    println!("║ Cached keys: {:<32} ║", store.cache_len());
    println!("║ Snapshot:    {:<32} ║", config.data_dir.display());
    println!("╚══════════════════════════════════════════════╝");
    println!();

    // Warm the demo set in one batch, then resolve each string the way a
    // screen would
    let items = demo_items();
    let warmer = BatchWarmer::new(store.clone(), items.clone());
    warmer.sync().await;

    println!("--- Resolved strings ---");
    for item in &items {
        let resolved = store.translate(&item.key, &item.text, None).await;
        println!("  {:<22} {}", item.key, resolved);
    }
    println!();

    // One binding, resolved the way a single call site would
    let binding = TranslationBinding::new(store.clone(), "booking.confirm", "Confirm booking");
    binding.resolve().await;
    println!("--- Single binding ---");
    println!("  {:<22} {}", binding.key(), binding.text());
    println!();

    if let Some(error) = store.last_error() {
        println!("⚠️  Last backend error: {}", error);
        println!();
    }

    let report = store.metrics().report();
    println!("--- Store metrics ---");
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!();

    Ok(())
}
