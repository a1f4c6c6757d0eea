//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use qr_gateway::config::GatewayConfig;
use qr_gateway::security::signature::sign;

pub const TOKEN: &str = "integration-token";
pub const SECRET: &str = "integration-secret";

/// Config with fixed secrets and artifacts written under `output_dir`.
pub fn test_config(output_dir: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.api_token = Some(TOKEN.to_string());
    config.signing.secret = Some(SECRET.to_string());
    config.render.output_dir = output_dir.to_string_lossy().into_owned();
    config
}

/// Builder for a render request.
pub struct RenderCall {
    path: String,
    client: String,
    token: Option<String>,
    plan: Option<String>,
    signed_at: Option<i64>,
    signature: Option<String>,
    timestamp: Option<String>,
    body: String,
}

impl RenderCall {
    pub fn variant(variant: &str) -> Self {
        Self::path(&format!("/api/v1/qr/{variant}"))
    }

    pub fn path(path: &str) -> Self {
        Self {
            path: path.to_string(),
            client: "198.51.100.1".to_string(),
            token: Some(TOKEN.to_string()),
            plan: None,
            signed_at: None,
            signature: None,
            timestamp: None,
            body: String::new(),
        }
    }

    pub fn client(mut self, client: &str) -> Self {
        self.client = client.to_string();
        self
    }

    pub fn token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }

    pub fn plan(mut self, plan: &str) -> Self {
        self.plan = Some(plan.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// Sign the body with the test secret at epoch second `ts`.
    pub fn signed_at(mut self, ts: i64) -> Self {
        self.signed_at = Some(ts);
        self
    }

    /// Send raw signature headers as given.
    pub fn raw_signature(mut self, signature: &str, timestamp: &str) -> Self {
        self.signature = Some(signature.to_string());
        self.timestamp = Some(timestamp.to_string());
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(&self.path)
            .header("content-type", "application/json")
            .header("x-forwarded-for", &self.client);
        if let Some(token) = &self.token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        if let Some(plan) = &self.plan {
            builder = builder.header("x-user-plan", plan);
        }
        if let Some(ts) = self.signed_at {
            let ts = ts.to_string();
            let signature = sign(SECRET.as_bytes(), &ts, self.body.as_bytes());
            builder = builder
                .header("x-timestamp", ts)
                .header("x-signature", signature);
        }
        if let (Some(sig), Some(ts)) = (&self.signature, &self.timestamp) {
            builder = builder.header("x-signature", sig).header("x-timestamp", ts);
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

/// Drive one request through the router and decode the JSON body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

/// Runtime on the calling thread, so thread-local recorders and subscribers
/// see everything the router does.
pub fn current_thread() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// In-memory sink for WARN and above.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn subscriber(self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(move || self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
