//! Command-line client for the QR gateway.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use qr_gateway::render::RenderRequest;
use qr_gateway::security::signature::{sign, unix_now, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use qr_gateway::security::plan::PLAN_HEADER;

#[derive(Parser)]
#[command(name = "qr-cli")]
#[command(about = "Client for the QR gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5001", env = "QR_GATEWAY_URL")]
    url: String,

    /// Bearer token.
    #[arg(short, long, env = "QR_API_TOKEN")]
    token: Option<String>,

    /// Signing secret; requests are signed when set.
    #[arg(short, long, env = "QR_SIGNING_SECRET")]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List variants and their plan requirements
    Styles,
    /// Render a QR variant
    Generate {
        /// standard, micro, compact, custom, holographic or cube3d
        #[arg(default_value = "standard")]
        variant: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        plan: Option<String>,
        #[arg(long)]
        drawer: Option<String>,
        #[arg(long)]
        fill: Option<String>,
        #[arg(long)]
        back: Option<String>,
        #[arg(long)]
        face_size: Option<i64>,
    },
    /// Download a generated artifact
    Fetch {
        file: String,
        /// Output path, defaults to the file name.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Styles => {
            let res = client.get(format!("{base}/api/v1/styles")).send().await?;
            print_response(res).await?;
        }
        Commands::Generate {
            variant,
            slug,
            target,
            plan,
            drawer,
            fill,
            back,
            face_size,
        } => {
            let request = RenderRequest {
                slug,
                target,
                module_drawer: drawer,
                fill_color: fill,
                back_color: back,
                face_size,
                ..Default::default()
            };
            let body = serde_json::to_vec(&request)?;

            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            if let Some(token) = &cli.token {
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
            }
            if let Some(plan) = &plan {
                headers.insert(PLAN_HEADER, HeaderValue::from_str(plan)?);
            }
            if let Some(secret) = &cli.secret {
                let ts = unix_now().to_string();
                let signature = sign(secret.as_bytes(), &ts, &body);
                headers.insert(TIMESTAMP_HEADER, HeaderValue::from_str(&ts)?);
                headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(&signature)?);
            }

            let res = client
                .post(format!("{base}/api/v1/qr/{variant}"))
                .headers(headers)
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Fetch { file, output } => {
            let res = client.get(format!("{base}/files/{file}")).send().await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }
            let path = output.unwrap_or_else(|| PathBuf::from(&file));
            let bytes = res.bytes().await?;
            tokio::fs::write(&path, &bytes).await?;
            println!("Saved {} bytes to {}", bytes.len(), path.display());
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => {
            let pretty = serde_json::to_string_pretty(&json)?;
            if status.is_success() {
                println!("{pretty}");
            } else {
                eprintln!("Error: gateway returned status {status}");
                eprintln!("{pretty}");
            }
        }
        Err(_) => eprintln!("Error: gateway returned status {status}: {text}"),
    }
    Ok(())
}
