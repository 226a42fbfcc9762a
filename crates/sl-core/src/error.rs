use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Buffer too short: need {needed} bytes for {what}, have {available}")]
    ShortBuffer {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Data size ({actual} bytes) does not match the expected size ({expected} bytes)")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Serialized data does not start with the expected prefix: {expected}")]
    PrefixMismatch { expected: &'static str },

    #[error("Serialized data does not match any known {family}")]
    UnknownTag { family: &'static str },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
