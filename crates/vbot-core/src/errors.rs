/// Failure of a call to the verification API.
///
/// `status` is `None` for transport failures (connect, timeout, TLS).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

/// Core error type for the bot.
///
/// Adapter crates map their framework errors into `Platform` so the dispatcher
/// can decide what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Bad argument shape or range. Reported before any external call.
    #[error("{0}")]
    Validation(String),

    /// The invoking user lacks the privilege a command requires.
    #[error("{0}")]
    Permission(String),

    /// The bot lacks something it needs in a referenced guild or channel.
    #[error("{0}")]
    Precondition(String),

    #[error("api error: {0}")]
    Api(#[from] ApiError),

    #[error("discord error: {0}")]
    Platform(String),

    /// The interaction token is no longer valid; only a followup can still land.
    #[error("interaction expired")]
    InteractionExpired,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
