//! Route handlers.

use std::io;

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::ApiError;
use crate::http::request::{header_str, request_id, ClientIdentity};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::render::{RenderJob, RenderRequest, RenderResult, Variant};
use crate::security::auth::bearer_token;
use crate::security::gate::GateRequest;
use crate::security::plan::{PlanTier, PLAN_HEADER};
use crate::security::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// `POST /api/v1/qr/{variant}`
pub async fn render(
    State(state): State<AppState>,
    ClientIdentity(client): ClientIdentity,
    Path(variant): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gated_render(&state, &client, uri.path(), &variant, &headers, &body).await
}

/// `POST /generate`, the standard variant under its historical path.
pub async fn generate(
    State(state): State<AppState>,
    ClientIdentity(client): ClientIdentity,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gated_render(
        &state,
        &client,
        uri.path(),
        Variant::Standard.as_str(),
        &headers,
        &body,
    )
    .await
}

async fn gated_render(
    state: &AppState,
    client: &str,
    path: &str,
    variant_name: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let variant_label = variant_name.to_ascii_lowercase();
    // Path segments are caller-controlled; only known names become metric labels.
    let metric_label = variant_label
        .parse::<Variant>()
        .map_or("unknown", Variant::as_str);
    let gate_request = GateRequest {
        identity: client,
        token: bearer_token(headers),
        signature: header_str(headers, SIGNATURE_HEADER),
        timestamp: header_str(headers, TIMESTAMP_HEADER),
        body,
        variant: &variant_label,
        plan: header_str(headers, PLAN_HEADER),
    };

    let admission = match state.gatekeeper.admit(&gate_request) {
        Ok(admission) => admission,
        Err(denial) => {
            tracing::warn!(
                request_id = %request_id(headers),
                client = %client,
                path = %path,
                stage = %denial.stage,
                code = denial.error.code(),
                "Request denied"
            );
            metrics::record_denial(denial.stage.as_str(), denial.error.code());
            metrics::record_request(metric_label, "denied");
            return denial.error.into_response();
        }
    };

    match render_admitted(state, &variant_label, body).await {
        Ok((job, result)) => {
            tracing::info!(
                request_id = %request_id(headers),
                client = %client,
                variant = %result.variant,
                slug = %job.slug,
                file = %result.file,
                target = job.target.as_deref().unwrap_or("-"),
                plan = %admission.plan,
                "QR generated"
            );
            metrics::record_request(result.variant.as_str(), "success");

            let mut payload = json!({
                "status": "success",
                "file": result.file,
                "type": result.variant,
                "url": format!("/files/{}", result.file),
            });
            if let Some(faces) = &result.faces {
                payload["faces"] = json!(faces);
            }

            let mut response = Json(payload).into_response();
            let h = response.headers_mut();
            h.insert("x-ratelimit-limit", HeaderValue::from(admission.rate.limit));
            h.insert(
                "x-ratelimit-remaining",
                HeaderValue::from(admission.rate.remaining()),
            );
            response
        }
        Err(error) => {
            tracing::warn!(
                request_id = %request_id(headers),
                client = %client,
                path = %path,
                code = error.code(),
                error = %error,
                "Render rejected"
            );
            metrics::record_request(metric_label, "error");
            error.into_response()
        }
    }
}

async fn render_admitted(
    state: &AppState,
    variant_name: &str,
    body: &[u8],
) -> Result<(RenderJob, RenderResult), ApiError> {
    let variant = variant_name
        .parse::<Variant>()
        .map_err(|e| ApiError::NotFound(e.to_string()))?;
    let request = parse_body(body)?;
    let job = RenderJob::from_request(variant, &request)?;
    let result = state.pipeline.render_blocking(job.clone()).await?;
    Ok((job, result))
}

/// An empty or whitespace-only body means "all defaults".
fn parse_body(body: &[u8]) -> Result<RenderRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RenderRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

/// `GET /api/v1/styles`
pub async fn styles(State(state): State<AppState>) -> Json<serde_json::Value> {
    let plans = state.gatekeeper.plans();
    let available: Vec<_> = Variant::ALL
        .iter()
        .map(|v| {
            json!({
                "id": v.as_str(),
                "description": v.description(),
                "required_plan": plans.required_for(v.as_str()),
                "file_prefix": v.file_prefix(),
            })
        })
        .collect();
    let order: Vec<_> = PlanTier::ORDER.iter().map(|t| t.as_str()).collect();

    Json(json!({
        "status": "success",
        "available_styles": available,
        "plan_order": order,
    }))
}

/// `GET /files/{filename}`
pub async fn files(
    State(state): State<AppState>,
    ClientIdentity(client): ClientIdentity,
    Path(filename): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    read_artifact(&state, &filename).await.inspect_err(|error| {
        tracing::warn!(
            request_id = %request_id(&headers),
            client = %client,
            path = %uri.path(),
            code = error.code(),
            error = %error,
            "File request denied"
        );
    })
}

async fn read_artifact(state: &AppState, filename: &str) -> Result<Response, ApiError> {
    let name = sanitize_filename(filename)?;
    let path = state.pipeline.output_dir().join(name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))],
            bytes,
        )
            .into_response()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ApiError::NotFound(format!("No artifact named '{name}'")))
        }
        Err(e) => Err(ApiError::Internal(format!("reading {}: {e}", path.display()))),
    }
}

/// Strip to the basename and require `[A-Za-z0-9_-]+\.png`.
pub fn sanitize_filename(raw: &str) -> Result<&str, ApiError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let valid = base
        .strip_suffix(".png")
        .is_some_and(|stem| {
            !stem.is_empty()
                && stem
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        });
    if valid {
        Ok(base)
    } else {
        Err(ApiError::BadRequest("Invalid file name".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_reduced_to_safe_basenames() {
        assert_eq!(sanitize_filename("qr_hello-1.png").unwrap(), "qr_hello-1.png");
        assert_eq!(sanitize_filename("../../qr_x.png").unwrap(), "qr_x.png");
        assert_eq!(sanitize_filename("..\\qr_x.png").unwrap(), "qr_x.png");
        for bad in ["..", "qr.jpg", ".png", "a b.png", "qr.png/", "x.PNG", "a.b.png"] {
            assert!(
                matches!(sanitize_filename(bad), Err(ApiError::BadRequest(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn empty_body_means_defaults() {
        let req = parse_body(b"  \n").unwrap();
        assert!(req.slug.is_none());
        assert!(matches!(parse_body(b"{not json"), Err(ApiError::BadRequest(_))));
    }
}
