use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Client, ClientError, ClientResult};

/// Making requests to the catalog API.
impl Client {
    /// Make an authenticated GET request to `endpoint` (relative to the base URL)
    /// and deserialize the body as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the catalog answers with an error
    /// object, or the response is not valid.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        parameters: &[(&str, String)],
    ) -> ClientResult<T> {
        let (status, bytes) = self.request_raw(endpoint, parameters).await?;
        Self::parse_response::<T>(status, &bytes)
    }

    pub(crate) async fn request_raw(
        &self,
        endpoint: &str,
        parameters: &[(&str, String)],
    ) -> ClientResult<(u16, Vec<u8>)> {
        let request = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(parameters);

        let response = request.send().await?;
        let status = response.status().as_u16();
        Ok((status, response.bytes().await?.into()))
    }

    pub(crate) fn parse_response<T: DeserializeOwned>(
        status: u16,
        bytes: &[u8],
    ) -> ClientResult<T> {
        if !(200..300).contains(&status) {
            // Error bodies are best-effort; some proxies return plain text.
            let message = serde_json::from_slice::<ErrorResponse>(bytes)
                .ok()
                .and_then(|r| r.error.message);
            return Err(ClientError::CatalogError { status, message });
        }

        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// The error envelope returned by the catalog.
struct ErrorResponse {
    error: ResponseError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// An error that occurred when making a request.
struct ResponseError {
    /// The HTTP status code.
    status: u16,
    /// The error message.
    message: Option<String>,
}
