//! Tracked providers.
//!
//! The set is closed: usage for any other provider name is rejected at the
//! request boundary.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendError};

// =============================================================================
// Provider Enum
// =============================================================================

/// Supported AI API providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    /// All providers in dashboard order.
    pub const ALL: &'static [Self] = &[Self::OpenAI, Self::Gemini];

    /// Wire/CLI name for this provider.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Display name for human output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Gemini => "Gemini",
        }
    }

    /// Name used in alert messages.
    #[must_use]
    pub const fn alert_label(self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI",
            Self::Gemini => "GEMINI",
        }
    }

    /// Parse from CLI argument or path segment (case-insensitive).
    pub fn from_cli_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|p| p.cli_name() == lower)
            .copied()
            .ok_or_else(|| SpendError::InvalidProvider(name.to_string()))
    }

    /// Monthly budget used when neither the store nor config has one.
    #[must_use]
    pub const fn builtin_budget(self) -> f64 {
        match self {
            Self::OpenAI => 10.0,
            Self::Gemini => 8.0,
        }
    }

    /// Model billed by the simulated endpoint for this provider.
    #[must_use]
    pub const fn simulated_model(self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-3.5-turbo",
            Self::Gemini => "gemini-pro",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl std::str::FromStr for Provider {
    type Err = SpendError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_cli_name(s)
    }
}

// =============================================================================
// Request Type
// =============================================================================

/// Billing direction of a usage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    #[default]
    Input,
    Output,
}

impl RequestType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    /// Lenient parse: anything other than `output` bills as input.
    #[must_use]
    pub fn from_arg_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("output") {
            Self::Output
        } else {
            Self::Input
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
