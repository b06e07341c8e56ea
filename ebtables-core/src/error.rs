use thiserror::Error;

/// Errors that can occur while building, validating, translating, or
/// installing a rule-set.
#[derive(Error, Debug)]
pub enum EbtError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Resolve(String),

    #[error("{0}")]
    Reference(String),

    #[error("Loop from chain '{from}' to chain '{to}'")]
    Loop { from: String, to: String },

    #[error("corrupt blob: {0}")]
    Corrupt(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("out of memory")]
    OutOfMemory,

    #[error("BUG: {0}")]
    Bug(String),
}

pub type Result<T> = std::result::Result<T, EbtError>;
