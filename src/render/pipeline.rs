//! Render pipeline: encode, rasterize, optionally project, write PNG.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::{ImageFormat, RgbaImage};
use qrcode::types::QrError;
use thiserror::Error;

use crate::config::RenderConfig;
use crate::error::ApiError;
use crate::observability::metrics;
use crate::render::cube::{self, FaceReport};
use crate::render::matrix::{EncodeProfile, ModuleGrid};
use crate::render::raster::rasterize;
use crate::render::style::RenderJob;
use crate::render::variant::Variant;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("encoding failed: {0}")]
    Encode(#[from] QrError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("output I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("render task aborted: {0}")]
    Task(String),
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// A written artifact.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub file: String,
    pub variant: Variant,
    /// Payload encoded into the symbol.
    pub encoded: String,
    /// Per-face outcomes, cube only.
    pub faces: Option<Vec<FaceReport>>,
}

pub struct RenderPipeline {
    base_domain: String,
    output_dir: PathBuf,
}

impl RenderPipeline {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            base_domain: config.base_domain.trim_end_matches('/').to_string(),
            output_dir: PathBuf::from(&config.output_dir),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Redirect URL carried by the symbol for `slug`.
    pub fn redirect_url(&self, slug: &str) -> String {
        format!("{}/q/{}", self.base_domain, slug)
    }

    /// Render on the blocking pool.
    pub async fn render_blocking(self: &Arc<Self>, job: RenderJob) -> Result<RenderResult, RenderError> {
        let pipeline = Arc::clone(self);
        tokio::task::spawn_blocking(move || pipeline.render(&job))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }

    pub fn render(&self, job: &RenderJob) -> Result<RenderResult, RenderError> {
        let start = Instant::now();
        let encoded = self.redirect_url(&job.slug);
        let grid = ModuleGrid::encode(&encoded, EncodeProfile::for_variant(job.variant))?;
        let symbol = rasterize(&grid, &job.style);

        let (image, faces) = match job.variant {
            Variant::Cube3d => {
                let cube = cube::compose(&symbol, job.style.face_size);
                (cube.image, Some(cube.faces))
            }
            _ => (symbol, None),
        };

        let file = job.file_name();
        self.write_atomic(&file, &image)?;
        metrics::record_render(job.variant.as_str(), start);

        Ok(RenderResult {
            file,
            variant: job.variant,
            encoded,
            faces,
        })
    }

    /// Write through a temp file then rename so readers never see a partial PNG.
    fn write_atomic(&self, file: &str, image: &RgbaImage) -> Result<(), RenderError> {
        fs::create_dir_all(&self.output_dir)?;
        let final_path = self.output_dir.join(file);
        let tmp_path = self
            .output_dir
            .join(format!(".{}.{}.tmp", file, uuid::Uuid::new_v4().simple()));

        if let Err(e) = image.save_with_format(&tmp_path, ImageFormat::Png) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::style::RenderRequest;

    fn pipeline(dir: &Path) -> RenderPipeline {
        RenderPipeline::new(&RenderConfig {
            base_domain: "http://localhost:8888/".to_string(),
            output_dir: dir.to_string_lossy().into_owned(),
        })
    }

    fn job(variant: Variant, slug: &str) -> RenderJob {
        let req = RenderRequest {
            slug: Some(slug.to_string()),
            ..Default::default()
        };
        RenderJob::from_request(variant, &req).unwrap()
    }

    #[test]
    fn standard_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let result = pipeline(dir.path()).render(&job(Variant::Standard, "hello-1")).unwrap();
        assert_eq!(result.file, "qr_hello-1.png");
        assert_eq!(result.encoded, "http://localhost:8888/q/hello-1");
        assert!(result.faces.is_none());

        let img = image::open(dir.path().join("qr_hello-1.png")).unwrap();
        assert_eq!(img.width(), img.height());
    }

    #[test]
    fn rerender_overwrites_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        p.render(&job(Variant::Micro, "dup")).unwrap();
        p.render(&job(Variant::Micro, "dup")).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["qr_micro_dup.png".to_string()]);
    }

    #[test]
    fn cube_reports_faces_and_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let req = RenderRequest {
            slug: Some("box".to_string()),
            face_size: Some(100),
            ..Default::default()
        };
        let job = RenderJob::from_request(Variant::Cube3d, &req).unwrap();
        let result = pipeline(dir.path()).render(&job).unwrap();
        assert_eq!(result.file, "qr_cube_box.png");
        let faces = result.faces.unwrap();
        assert_eq!(faces.len(), 3);
        assert!(faces.iter().all(|f| f.rendered));

        let img = image::open(dir.path().join("qr_cube_box.png")).unwrap();
        assert_eq!((img.width(), img.height()), (220, 250));
    }

    #[tokio::test]
    async fn blocking_render_runs_off_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let p = Arc::new(pipeline(dir.path()));
        let result = p.render_blocking(job(Variant::Holographic, "h")).await.unwrap();
        assert_eq!(result.file, "qr_holo_h.png");
        assert!(dir.path().join("qr_holo_h.png").exists());
    }
}
