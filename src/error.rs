use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize/deserialize data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Session number must be between 1 and {max}, got {session}")]
    InvalidSession { session: u32, max: u32 },

    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    #[error("Adaptive test {0} is already complete")]
    TestComplete(u32),

    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),
}

pub type Result<T> = std::result::Result<T, VocabError>;
