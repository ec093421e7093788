//! Export: remote document service first, local text artifact as the fallback.

mod service;
mod text;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::Template;
use crate::error::{DocError, DocResult};

#[cfg(test)]
pub use service::MockDocumentService;
pub use service::{DocumentService, ExportRequest, NoRemoteService};
pub use text::render_text;

pub const TEXT_MEDIA_TYPE: &str = "text/plain; charset=utf-8";
pub const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub media_type: String,
    pub content: Vec<u8>,
    /// Produced by the local fallback rather than the document service.
    pub degraded: bool,
}

impl ExportArtifact {
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// `Lettera Militare` at t -> `Lettera_Militare_<millis>.<extension>`.
pub fn artifact_file_name(template_name: &str, at: DateTime<Utc>, extension: &str) -> String {
    let stem = template_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{stem}_{}.{extension}", at.timestamp_millis())
}

/// Runs one export at a time; a second request while one is pending is rejected.
pub struct Exporter {
    service: Arc<dyn DocumentService>,
    delay: Duration,
    wrap_width: usize,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("delay", &self.delay)
            .field("wrap_width", &self.wrap_width)
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(Arc::new(NoRemoteService))
    }
}

impl Exporter {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self {
            service,
            delay: Duration::from_millis(1000),
            wrap_width: 80,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_wrap_width(mut self, wrap_width: usize) -> Self {
        self.wrap_width = wrap_width;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn export(&self, template: &Template, data: &Value) -> DocResult<ExportArtifact> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        self.export_one(template, data).await
    }

    /// Export every template against the same data, in order. Either all artifacts are
    /// returned or the first error is; the busy guard is held for the whole batch.
    pub async fn export_package(
        &self,
        templates: &[Template],
        data: &Value,
    ) -> DocResult<Vec<ExportArtifact>> {
        if templates.is_empty() {
            return Err(DocError::EmptyPackage);
        }
        let _guard = InFlight::acquire(&self.in_flight)?;
        let mut artifacts = Vec::with_capacity(templates.len());
        for template in templates {
            artifacts.push(self.export_one(template, data).await?);
        }
        info!(documents = artifacts.len(), "exported document package");
        Ok(artifacts)
    }

    async fn export_one(&self, template: &Template, data: &Value) -> DocResult<ExportArtifact> {
        let request = ExportRequest {
            template: template.clone(),
            data: data.clone(),
            requested_at: Utc::now(),
        };

        if self.service.is_ready().await {
            match self.service.generate(&request).await {
                Ok(artifact) => {
                    info!(template = %template.name, file = %artifact.file_name, "exported via document service");
                    return Ok(artifact);
                }
                Err(error) => {
                    warn!(template = %template.name, error = %error, "document service failed, falling back to text export");
                }
            }
        } else {
            info!(template = %template.name, "document service unavailable, using text export");
        }

        tokio::time::sleep(self.delay).await;
        let content = render_text(template, data, request.requested_at, self.wrap_width);
        let artifact = ExportArtifact {
            file_name: artifact_file_name(&template.name, request.requested_at, "txt"),
            media_type: TEXT_MEDIA_TYPE.to_string(),
            content: content.into_bytes(),
            degraded: true,
        };
        info!(template = %template.name, file = %artifact.file_name, "exported text document");
        Ok(artifact)
    }

    /// Pretty-printed data as a JSON artifact.
    pub fn export_json(&self, template: &Template, data: &Value) -> DocResult<ExportArtifact> {
        let content = serde_json::to_vec_pretty(data)?;
        Ok(ExportArtifact {
            file_name: artifact_file_name(&template.name, Utc::now(), "json"),
            media_type: JSON_MEDIA_TYPE.to_string(),
            content,
            degraded: false,
        })
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> DocResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| DocError::ExportBusy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
