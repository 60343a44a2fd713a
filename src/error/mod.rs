//! Error types for spendwatch.
//!
//! Uses `thiserror` for structured error types that map to HTTP statuses and
//! process exit codes.
//!
//! ## Error Taxonomy
//!
//! - **Validation**: Missing or malformed request fields (client-facing 4xx)
//! - **Authorization**: Cron trigger shared-secret mismatch
//! - **NotFound**: Unknown alert ids or routes
//! - **Configuration**: Config file parsing or invalid values
//! - **Storage**: Ledger, budget, or alert store read/write failures
//! - **Internal**: Unexpected errors, bugs, or unclassified issues
//!
//! Each error has a stable error code (e.g., `SPW-V001`) for programmatic handling.
//! Storage and internal errors never leak their details to HTTP clients; see
//! [`SpendError::client_message`].

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing/invalid request fields.
    Validation,
    /// Shared-secret check failed.
    Authorization,
    /// Requested resource does not exist.
    NotFound,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Storage read/write failures.
    Storage,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Validation error",
            Self::Authorization => "Authorization error",
            Self::NotFound => "Not found",
            Self::Configuration => "Configuration error",
            Self::Storage => "Storage error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Validation => "V",
            Self::Authorization => "A",
            Self::NotFound => "N",
            Self::Configuration => "C",
            Self::Storage => "S",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Invalid arguments or input values
    InvalidInput = 2,
    /// Configuration could not be loaded or validated
    ConfigError = 3,
    /// Storage backend failure
    StorageError = 4,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for spendwatch operations.
#[derive(Error, Debug)]
pub enum SpendError {
    // ==========================================================================
    // Validation errors (Category: Validation)
    // ==========================================================================
    /// One or more required fields were absent.
    #[error("Missing required fields: {0}")]
    MissingFields(String),

    /// A field was present but had an unusable value.
    #[error("invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// Provider name is not one of the tracked providers.
    #[error("unknown provider: {0}")]
    InvalidProvider(String),

    /// Month/year query could not be interpreted.
    #[error("invalid budget period: {0}")]
    InvalidPeriod(String),

    /// Request body could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    // ==========================================================================
    // Authorization errors (Category: Authorization)
    // ==========================================================================
    /// Cron trigger bearer token missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    // ==========================================================================
    // Not found (Category: NotFound)
    // ==========================================================================
    /// No alert with the given id.
    #[error("alert not found: {0}")]
    AlertNotFound(i64),

    /// No route matched the request.
    #[error("Endpoint not found")]
    RouteNotFound,

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // Storage errors (Category: Storage)
    // ==========================================================================
    /// A store operation failed.
    #[error("storage error during {operation}: {message}")]
    Storage { operation: String, message: String },

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpendError {
    /// Build a storage error from any displayable backend error.
    pub fn storage(operation: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }

    /// Build a field validation error.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingFields(_)
            | Self::InvalidField { .. }
            | Self::InvalidProvider(_)
            | Self::InvalidPeriod(_)
            | Self::InvalidRequest(_) => ErrorCategory::Validation,

            Self::Unauthorized => ErrorCategory::Authorization,

            Self::AlertNotFound(_) | Self::RouteNotFound => ErrorCategory::NotFound,

            Self::ConfigParse { .. } | Self::ConfigInvalid { .. } | Self::Config(_) => {
                ErrorCategory::Configuration
            }

            Self::Storage { .. } => ErrorCategory::Storage,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `SPW-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "SPW-V001",
            Self::InvalidField { .. } => "SPW-V002",
            Self::InvalidProvider(_) => "SPW-V003",
            Self::InvalidPeriod(_) => "SPW-V004",
            Self::InvalidRequest(_) => "SPW-V005",

            Self::Unauthorized => "SPW-A001",

            Self::AlertNotFound(_) => "SPW-N001",
            Self::RouteNotFound => "SPW-N002",

            Self::ConfigParse { .. } => "SPW-C001",
            Self::ConfigInvalid { .. } => "SPW-C002",
            Self::Config(_) => "SPW-C003",

            Self::Storage { .. } => "SPW-S001",

            Self::Io(_) => "SPW-X001",
            Self::Json(_) => "SPW-X002",
            Self::Other(_) => "SPW-X099",
        }
    }

    /// HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            ErrorCategory::Authorization => 401,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Configuration
            | ErrorCategory::Storage
            | ErrorCategory::Internal => 500,
        }
    }

    /// Map error to a CLI exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::NotFound => ExitCode::InvalidInput,
            ErrorCategory::Configuration => ExitCode::ConfigError,
            ErrorCategory::Storage => ExitCode::StorageError,
            ErrorCategory::Authorization | ErrorCategory::Internal => ExitCode::GeneralError,
        }
    }

    /// Message that is safe to hand to an HTTP client.
    ///
    /// Validation, auth, and not-found errors carry their own message; storage,
    /// configuration, and internal failures collapse to a generic string.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self.category() {
            ErrorCategory::Validation
            | ErrorCategory::Authorization
            | ErrorCategory::NotFound => self.to_string(),
            ErrorCategory::Configuration
            | ErrorCategory::Storage
            | ErrorCategory::Internal => "Internal server error".to_string(),
        }
    }
}

/// Result type alias for spendwatch operations.
pub type Result<T> = std::result::Result<T, SpendError>;

// =============================================================================
// Tests
// =============================================================================
