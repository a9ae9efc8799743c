#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Discord API error: {0}")]
    Discord(#[from] Box<serenity::Error>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("This command cannot be used in direct messages")]
    PrivateContextNotAllowed,

    #[error("This command has been disabled")]
    CommandDisabled,

    #[error("{0}")]
    InvalidArgument(String),
}

impl From<serenity::Error> for Error {
    fn from(err: serenity::Error) -> Self {
        match &err {
            serenity::Error::Http(serenity::http::HttpError::Request(e))
                if e.is_connect() || e.is_timeout() =>
            {
                Error::NetworkUnavailable(err.to_string())
            }
            _ => Error::Discord(Box::new(err)),
        }
    }
}

impl Error {
    /// Wrap a transport-level reqwest failure, separating "can't reach the
    /// network" from every other HTTP problem.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkUnavailable(err.to_string())
        } else {
            Error::Http(err)
        }
    }

    /// True when the failure means the network could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::NetworkUnavailable(_))
    }
}

/// Render an error and every `source()` below it, one per line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = format!("{err:?}");
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
