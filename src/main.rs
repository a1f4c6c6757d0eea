//! QR gateway
//!
//! A QR rendering service behind a request gatekeeper.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http (axum + tower layers)
//!                 │
//!                 ▼
//!            security::Gatekeeper
//!              rate limit → bearer auth → signature → plan
//!                 │
//!                 ▼
//!            render::RenderPipeline (blocking pool)
//!              encode → rasterize → [cube projection] → PNG
//!                 │
//!                 ▼
//!            output_dir ──▶ GET /files/{name}
//! ```

use std::path::PathBuf;

use clap::Parser;

use qr_gateway::config::load_config;
use qr_gateway::lifecycle::startup;

#[derive(Parser, Debug)]
#[command(name = "qr-gateway", version, about = "Gated QR code rendering service")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "QR_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    startup::run(config).await
}
