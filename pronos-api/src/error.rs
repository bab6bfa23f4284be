use uuid::Uuid;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Uuid already used {0}")]
    UuidAlreadyUsed(Uuid),

    #[error("Name already used {0}")]
    NameAlreadyUsed(String),

    #[error("Nothing found with id {0}")]
    NotFound(Uuid),

    #[error("Content must not be empty")]
    EmptyContent,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Invalid odds: {0}")]
    InvalidOdds(String),

    #[error("Confidence must be between 1 and 5, got {0}")]
    InvalidConfidence(u8),

    #[error("Users cannot follow themselves")]
    CannotFollowSelf,
}
