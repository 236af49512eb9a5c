#[derive(Debug)]
/// An error that can occur when interacting with the client.
pub enum ClientError {
    /// An error that occurred when making a request.
    ReqwestError(reqwest::Error),
    /// An error that occurred when deserializing a response.
    DeserializationError(serde_json::Error),
    /// The catalog returned an error.
    CatalogError {
        /// The HTTP status code.
        status: u16,
        /// The error message.
        message: Option<String>,
    },
}
impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::ReqwestError(e) => write!(f, "Reqwest error: {e}"),
            ClientError::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
            ClientError::CatalogError { status, message } => {
                write!(f, "Catalog error: {status}")?;
                if let Some(message) = message {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
        }
    }
}
impl std::error::Error for ClientError {}
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::ReqwestError(e)
    }
}
impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::DeserializationError(e)
    }
}
/// A result type for the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// A client for the catalog's web API.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) base_url: String,
    pub(crate) token: String,
    pub(crate) market: String,
    pub(crate) client: reqwest::Client,
}
impl Client {
    /// The default API root.
    pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1";

    /// Create a new client.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        market: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            market: market.into(),
            client: reqwest::Client::new(),
        }
    }

    /// The market releases are resolved against.
    pub fn market(&self) -> &str {
        &self.market
    }
}
