/// Result alias that carries the custom [`TriviaError`] type.
pub type Result<T> = std::result::Result<T, TriviaError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum TriviaError {
    /// A required quiz selection is missing or not one of the known values.
    #[error("{0}")]
    Validation(String),
    /// Transport failure or a non-successful HTTP status.
    #[error("network request failed: {0}")]
    Network(String),
    /// The response body was not the JSON shape we expected.
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    /// Every format candidate for a sound failed to fetch or decode.
    #[error("failed to load audio `{url}`: {source}")]
    AudioLoad {
        url: String,
        #[source]
        source: Box<TriviaError>,
    },
    /// The persisted key-value store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Free-form failure, mostly raised by platform backends.
    #[error("{0}")]
    Message(String),
}

impl TriviaError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn network<T: Into<String>>(msg: T) -> Self {
        Self::Network(msg.into())
    }
}

impl From<&str> for TriviaError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for TriviaError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<reqwest::Error> for TriviaError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}
