use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No {0} specified")]
    MissingArgument(&'static str),

    #[error("Argument must be {expected}, got {found}")]
    InvalidArgumentType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGUMENTS: i32 = 2;
    pub const INVALID_PROFILE: i32 = 3;
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingArgument(_)
            | Error::InvalidArgumentType { .. }
            | Error::UnknownMethod(_)
            | Error::InvalidArgument(_) => exit_code::INVALID_ARGUMENTS,
            Error::InvalidProfile(_) | Error::Json(_) => exit_code::INVALID_PROFILE,
            Error::Io(_) => exit_code::GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_errors_map_to_invalid_arguments() {
        assert_eq!(
            Error::MissingArgument("index").exit_code(),
            exit_code::INVALID_ARGUMENTS
        );
        assert_eq!(
            Error::InvalidArgumentType {
                expected: "integer",
                found: "string"
            }
            .exit_code(),
            exit_code::INVALID_ARGUMENTS
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::MissingArgument("index").to_string(),
            "No index specified"
        );
        assert_eq!(
            Error::InvalidArgumentType {
                expected: "integer",
                found: "string"
            }
            .to_string(),
            "Argument must be integer, got string"
        );
    }
}
