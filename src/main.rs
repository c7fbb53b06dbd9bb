use bitrix24_client::{Batch, Bitrix24Client, Config};
use serde_json::Value;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: bitrix24-client [METHOD [JSON_PARAMS]] | batch JSON_CALLS [halt]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            tracing::error!("Please set:");
            tracing::error!("  - BITRIX24_HOSTNAME to your portal host");
            tracing::error!("  - BITRIX24_AUTH_CODE (and BITRIX24_USER_ID) for an inbound webhook");
            std::process::exit(1);
        }
    };

    // Applications need a browser round trip to obtain tokens first
    if config.auth_code.is_none() {
        anyhow::bail!("the script client only supports inbound webhooks; set BITRIX24_AUTH_CODE");
    }

    let client = Bitrix24Client::from_config(&config)?;

    let response = match args.first().map(String::as_str) {
        Some("batch") => {
            let calls: Value = match args.get(1) {
                Some(raw) => serde_json::from_str(raw)?,
                None => anyhow::bail!(USAGE),
            };
            let halt = args.get(2).map(|h| h == "halt").unwrap_or(false);
            let batch = Batch::from_value(&calls)?;
            tracing::info!("Sending batch of {} calls to {}", batch.len(), config.hostname);
            client.call_batch(&batch, halt).await?
        }
        method => {
            let method = method.unwrap_or("profile");
            let params: Value = match args.get(1) {
                Some(raw) => serde_json::from_str(raw)?,
                None => Value::Object(Default::default()),
            };
            tracing::info!("Calling {} on {}", method, config.hostname);
            client.call(method, &params).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
