use std::sync::Arc;

use clinicsched_core::{models::weekday::weekday_label, time_codec};
use clinicsched_engine::ScheduleEngine;
use clinicsched_gateway::{GatewayConfig, HttpGateway};
use color_eyre::eyre::Result;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Fetching clinic schedule from {}", config.base_url);
    let gateway = HttpGateway::new(config)?;
    let engine = ScheduleEngine::new(Arc::new(gateway));

    let load = engine.load_all();
    tokio::pin!(load);
    tokio::select! {
        result = &mut load => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling requests");
            engine.cancel_in_flight().await;
            if let Err(err) = load.await {
                warn!("Load stopped: {}", err);
            }
            return Ok(());
        }
    }

    println!("Operating hours");
    for entry in engine.operating_hours().entries().await {
        let hours = if entry.enabled {
            format!(
                "{} - {}",
                time_codec::to_display(entry.window.start),
                time_codec::to_display(entry.window.end)
            )
        } else {
            "closed".to_string()
        };
        println!("  {:<4}{}", weekday_label(entry.day), hours);
    }

    println!("Slot types");
    for slot_type in engine.slot_types().slot_types().await {
        let days = if slot_type.category.uses_days() {
            format!(" on {}", slot_type.days)
        } else {
            String::new()
        };
        println!(
            "  {} ({} - {}) {}{}{}",
            slot_type.label,
            time_codec::to_display(slot_type.window.start),
            time_codec::to_display(slot_type.window.end),
            slot_type.price,
            days,
            if slot_type.allow_booking { "" } else { " [booking off]" }
        );
    }

    Ok(())
}
