use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Classified outcome of a failed gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("The server is alive, but reports this error: {0}")]
    ServerReported(String),

    #[error("The server is alive but reports an error.")]
    ServerAliveButUnparsable,

    #[error("The server is not alive. I received this error: {0}")]
    ServerUnreachable(String),
}

/// What is known about a failed attempt at the moment it failed.
#[derive(Debug)]
pub enum FailedAttempt<'a> {
    /// The request never produced a response (connect error, timeout, ...).
    NoResponse(String),
    /// A response arrived with a non-success status.
    Rejected { status: StatusCode, body: &'a [u8] },
    /// A success response arrived but its body could not be decoded.
    Undecodable(String),
}

/// Maps every failed attempt onto exactly one [`GatewayError`].
pub fn classify(attempt: FailedAttempt<'_>) -> GatewayError {
    match attempt {
        FailedAttempt::NoResponse(detail) | FailedAttempt::Undecodable(detail) => {
            GatewayError::ServerUnreachable(detail)
        }
        FailedAttempt::Rejected { status, body } => match serde_json::from_slice::<Value>(body) {
            Ok(Value::String(text)) => GatewayError::ServerReported(text),
            Ok(Value::Object(map)) => match map.get("message") {
                Some(Value::String(text)) => GatewayError::ServerReported(text.clone()),
                Some(other) => GatewayError::ServerReported(other.to_string()),
                None => GatewayError::ServerAliveButUnparsable,
            },
            Ok(_) => GatewayError::ServerAliveButUnparsable,
            Err(_) => GatewayError::ServerUnreachable(status_text(status)),
        },
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

/// Local rejections. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("You must select an image file. Try again!")]
    InvalidFileType(Option<String>),

    #[error("The max file size for a meme is {} MB. Try again!", megabytes(.limit))]
    FileTooLarge { size: u64, limit: u64 },

    #[error("You must set a user name. Try again!")]
    MissingUserName,

    #[error("Your user name is already set for this session.")]
    UserNameLocked,

    #[error("Choose a meme to upload first.")]
    NothingStaged,

    #[error("A meme is already being posted.")]
    PostInFlight,

    #[error("Your like is still being sent.")]
    LikeInFlight,

    #[error("No meme is open.")]
    NoOpenMeme,

    #[error("You can't like your own meme.")]
    SelfLike,

    #[error("You already liked this meme.")]
    AlreadyLiked,
}

fn megabytes(bytes: &u64) -> u64 {
    bytes / (1024 * 1024)
}

/// Everything the engine can report to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("The image could not be read or was corrupt: {0}")]
    Encoding(String),
}
