//! Error rendering for the CLI.
//!
//! JSON and Markdown formats get a structured error object; human output is
//! a single line with the error code, red when color is enabled.

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::error::SpendError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorJson {
    error_code: &'static str,
    category: String,
    message: String,
    exit_code: u8,
}

impl ErrorJson {
    fn from_error(error: &SpendError) -> Self {
        Self {
            error_code: error.error_code(),
            category: error.category().to_string(),
            message: error.to_string(),
            exit_code: error.exit_code().as_u8(),
        }
    }
}

/// Render an error for the selected output format.
#[must_use]
pub fn render_error(error: &SpendError, format: OutputFormat, no_color: bool, pretty: bool) -> String {
    match format {
        OutputFormat::Json => render_error_json(error, pretty),
        OutputFormat::Md => render_error_json(error, true),
        OutputFormat::Human => render_simple(error, no_color),
    }
}

/// Render error as structured JSON.
#[must_use]
pub fn render_error_json(error: &SpendError, pretty: bool) -> String {
    let error_json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&error_json)
    } else {
        serde_json::to_string(&error_json)
    };
    rendered.unwrap_or_else(|_| render_simple(error, true))
}

fn render_simple(error: &SpendError, no_color: bool) -> String {
    let header = format!("Error [{}]:", error.error_code());
    if no_color {
        format!("{header} {error}")
    } else {
        format!("{} {error}", header.red().bold())
    }
}
