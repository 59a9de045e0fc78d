use thiserror::Error;

/// Errors returned by the registry, geocoder and routing clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The service answered with a non-success status. `message` is the
    /// server's own text when it sent one.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The geocoder had no match for the query.
    #[error("no location found for '{0}'")]
    NotFound(String),

    /// The routing engine found no path between the two points.
    #[error("no route: {0}")]
    NoRoute(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
