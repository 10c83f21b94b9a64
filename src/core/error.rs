use thiserror::Error;

/// Core error types for fwspec
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A port or service name could not be resolved
    #[error("Port not found in {field}: '{value}'")]
    PortNotFound { field: String, value: String },

    /// A numeric port exceeded 65535
    #[error("Port out of range in {field}: '{value}'")]
    PortTooLarge { field: String, value: String },

    /// More than one split of a range specification resolved
    #[error("Ambiguous port range in {field}: '{value}'")]
    AmbiguousRange { field: String, value: String },

    /// A value did not match the expected lexical format
    #[error("Invalid format in {field}: '{value}'")]
    InvalidFormat { field: String, value: String },

    /// Input validation failed
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    /// Configuration could not be used
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Name of the offending field, if the error is tied to one
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::PortNotFound { field, .. }
            | Error::PortTooLarge { field, .. }
            | Error::AmbiguousRange { field, .. }
            | Error::InvalidFormat { field, .. }
            | Error::Validation { field, .. } => Some(field),
            Error::Io(_) | Error::Serialization(_) | Error::Config(_) => None,
        }
    }
}

/// Represents a translated error with helpful context
#[derive(Debug, Clone)]
pub struct ErrorTranslation {
    pub user_message: String,
    pub suggestions: Vec<String>,
}

impl ErrorTranslation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

/// Turns an [`Error`] into a message a configuration tool can show the user.
///
/// Not found, out of range and ambiguous get distinct wording so the user
/// knows whether to fix a typo, a number, or rewrite the range explicitly.
pub fn translate(error: &Error) -> ErrorTranslation {
    match error {
        Error::PortNotFound { field, value } => {
            ErrorTranslation::new(format!("Unknown port or service '{value}' in {field}"))
                .with_suggestion("Use a number between 0 and 65535 or a name from /etc/services")
                .with_suggestion("Check the service name for typos: getent services <name>")
        }
        Error::PortTooLarge { field, value } => {
            ErrorTranslation::new(format!("Port '{value}' in {field} is out of range"))
                .with_suggestion("Port numbers must be between 0 and 65535")
        }
        Error::AmbiguousRange { field, value } => ErrorTranslation::new(format!(
            "Could not uniquely interpret the range '{value}' in {field}"
        ))
        .with_suggestion("Rewrite the range explicitly with port numbers, e.g. 8080-8090")
        .with_suggestion("Service names containing '-' can be read more than one way"),
        Error::InvalidFormat { field, value } => {
            let translation =
                ErrorTranslation::new(format!("Invalid value '{value}' in {field}"));
            match field.as_str() {
                "address" | "sources" => translation
                    .with_suggestion("Use a dotted-quad IPv4 address: 192.168.1.1")
                    .with_suggestion("Each component must be between 0 and 255"),
                "interfaces" | "interface" => translation
                    .with_suggestion("Interface names are at most 16 characters")
                    .with_suggestion("Spaces and the characters / ! : * are not allowed"),
                _ => translation,
            }
        }
        Error::Validation { field, message } => {
            ErrorTranslation::new(format!("Invalid {field}: {message}"))
        }
        Error::Io(e) => ErrorTranslation::new(format!("I/O error: {e}"))
            .with_suggestion("Check that the file exists and is readable"),
        Error::Serialization(e) => ErrorTranslation::new(format!("Malformed JSON: {e}"))
            .with_suggestion("Check for missing quotes, brackets, or commas"),
        Error::Config(msg) => ErrorTranslation::new(format!("Configuration error: {msg}")),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
