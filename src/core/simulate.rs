//! Canned provider responses for the simulated chat endpoints.
//!
//! No upstream API is contacted. Token usage is estimated from the request
//! content length and tracked before the canned body is returned.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::core::provider::Provider;

/// Content length assumed when the request carries no `content`.
pub const DEFAULT_CONTENT_LENGTH: usize = 100;
/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// `ceil(chars / 4)`, with absent content counted as 100 characters.
#[must_use]
pub fn estimate_tokens(content: Option<&str>) -> u64 {
    let chars = content.map_or(DEFAULT_CONTENT_LENGTH, |c| c.chars().count());
    u64::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u64::MAX)
}

/// Provider-shaped response body.
#[must_use]
pub fn canned_response(provider: Provider, now: DateTime<Utc>) -> Value {
    match provider {
        Provider::OpenAI => openai_chat_completion(now),
        Provider::Gemini => gemini_generate_content(),
    }
}

fn openai_chat_completion(now: DateTime<Utc>) -> Value {
    json!({
        "id": format!("chatcmpl-{}", now.timestamp_millis()),
        "object": "chat.completion",
        "created": now.timestamp(),
        "model": Provider::OpenAI.simulated_model(),
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": "This is a simulated AI response. No request was sent to the OpenAI API."
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 20,
            "completion_tokens": 30,
            "total_tokens": 50
        }
    })
}

fn gemini_generate_content() -> Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [{
                    "text": "This is a simulated Gemini response. No request was sent to the Gemini API."
                }],
                "role": "model"
            },
            "finishReason": "STOP",
            "index": 0
        }],
        "usageMetadata": {
            "promptTokenCount": 15,
            "candidatesTokenCount": 25,
            "totalTokenCount": 40
        }
    })
}
