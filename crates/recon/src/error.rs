use std::fmt;

/// Fatal errors. Data-driven problems never surface here; they degrade the
/// output and are reported as [`crate::model::Notice`]s instead.
#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty prefix, zero cap, etc.).
    ConfigValidation(String),
    /// An attribute name in the config is not a canonical attribute.
    UnknownAttribute { section: String, name: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownAttribute { section, name } => {
                write!(f, "[{section}]: unknown attribute '{name}'")
            }
        }
    }
}

impl std::error::Error for EngineError {}
