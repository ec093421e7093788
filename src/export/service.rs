use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::Template;

use super::ExportArtifact;

/// Everything a remote renderer needs to produce a document: the template with its
/// schema, and the bound data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRequest {
    pub template: Template,
    pub data: Value,
    pub requested_at: DateTime<Utc>,
}

/// Remote document generation backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Whether the backend is reachable right now.
    async fn is_ready(&self) -> bool;

    async fn generate(&self, request: &ExportRequest) -> Result<ExportArtifact>;
}

/// Offline default: never ready, so exports always use the local text fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteService;

#[async_trait]
impl DocumentService for NoRemoteService {
    async fn is_ready(&self) -> bool {
        false
    }

    async fn generate(&self, request: &ExportRequest) -> Result<ExportArtifact> {
        Err(anyhow!(
            "no document service configured for `{}`",
            request.template.name
        ))
    }
}
