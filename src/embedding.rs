//! Presigned embedding URLs.

use reqwest::Method;

use crate::client::Client;
use crate::errors::{HexError, Result};
use crate::models::{EmbeddingRequest, EmbeddingResponse, MAX_EMBED_EXPIRY_MS};

impl Client {
    /// Create a short-lived URL that embeds a project's app.
    ///
    /// # Errors
    ///
    /// [`HexError::InvalidInput`] if `expires_in` exceeds
    /// [`MAX_EMBED_EXPIRY_MS`]; nothing is sent in that case.
    pub async fn create_presigned_url(
        &self,
        project_id: &str,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse> {
        if let Some(ms) = request.expires_in {
            if ms > MAX_EMBED_EXPIRY_MS {
                return Err(HexError::InvalidInput(format!(
                    "expires_in must be at most {MAX_EMBED_EXPIRY_MS} ms, got {ms}"
                )));
            }
        }

        self.request(
            Method::POST,
            &format!("/v1/embedding/createPresignedUrl/{project_id}"),
            &[],
            Some(request),
        )
        .await
    }
}
