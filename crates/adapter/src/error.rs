use thiserror::Error;

/// Error type returned from this library's functions.
///
/// Per-request failures are recoverable configuration mismatches; only
/// template catalog integrity errors are meant to abort startup.
#[derive(Debug, Error)]
pub enum Error {
    /// Cohere has no text-completion endpoint.
    #[error("backend requires chat completions")]
    UnsupportedCompletionType,
    /// A structured chat prompt was required but a flat string was built.
    #[error("chat-structured prompt required, got flat text")]
    PromptShapeMismatch,
    /// A custom backend was selected without a payload template.
    #[error("custom backend is missing a payload template")]
    MissingCustomPayload,
    /// Two sampler fields map to the same external field name.
    #[error("template `{template}` declares duplicate field `{field}`")]
    DuplicateExternalName { template: String, field: String },
    /// A non-custom template carries a custom payload body.
    #[error("template `{0}` carries a payload template but is not a custom backend")]
    UnexpectedCustomPayload(String),
    /// Non-success HTTP status from a model catalog endpoint.
    #[error("could not retrieve models: HTTP {status}: {body}")]
    CatalogStatus { status: u16, body: String },
    /// Transport/HTTP client error.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    /// De/serialization error.
    #[error("de/serialize error: {0}")]
    Serde(#[from] serde_json::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
