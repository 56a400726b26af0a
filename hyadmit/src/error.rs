use hyspec::decl::{FieldId, MethodId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdmitError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),

    #[error("Unknown method {0} referenced by the specification module")]
    UnknownMethod(MethodId),

    #[error("Unknown field {0} referenced by the specification module")]
    UnknownField(FieldId),
}

pub type AdmitResult<T> = Result<T, AdmitError>;
