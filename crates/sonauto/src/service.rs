//! The remote generation seam the orchestrator is written against.

use async_trait::async_trait;

use crate::api::{SonautoApi, SonautoApiError};
use crate::messages::{GenerationPayload, GenerationStatusResponse, SubmitResponse};

/// Operations the orchestrator needs from a remote generation engine.
///
/// Implemented by [`SonautoApi`] for production; tests provide scripted
/// implementations.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn submit(
        &self,
        api_key: &str,
        payload: &GenerationPayload,
    ) -> Result<SubmitResponse, SonautoApiError>;

    async fn status(
        &self,
        api_key: &str,
        task_id: &str,
    ) -> Result<GenerationStatusResponse, SonautoApiError>;

    async fn download(&self, url: &str) -> Result<Vec<u8>, SonautoApiError>;
}

#[async_trait]
impl GenerationService for SonautoApi {
    async fn submit(
        &self,
        api_key: &str,
        payload: &GenerationPayload,
    ) -> Result<SubmitResponse, SonautoApiError> {
        self.submit_generation(api_key, payload).await
    }

    async fn status(
        &self,
        api_key: &str,
        task_id: &str,
    ) -> Result<GenerationStatusResponse, SonautoApiError> {
        self.get_generation(api_key, task_id).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, SonautoApiError> {
        self.download_media(url).await
    }
}
