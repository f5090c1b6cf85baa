//! Static metadata for well-known models

use super::BackendModelInfo;

const fn info(max_output_tokens: u32, function_calling: bool, vision: bool) -> BackendModelInfo {
    BackendModelInfo {
        max_output_tokens: Some(max_output_tokens),
        max_tokens: Some(max_output_tokens),
        supports_function_calling: function_calling,
        supports_vision: vision,
        supports_system_messages: true,
    }
}

static CATALOG: &[(&str, BackendModelInfo)] = &[
    ("gpt-4o", info(16_384, true, true)),
    ("gpt-4o-mini", info(16_384, true, true)),
    ("gpt-4.1", info(32_768, true, true)),
    ("gpt-4.1-mini", info(32_768, true, true)),
    ("gpt-4-turbo", info(4_096, true, true)),
    ("gpt-3.5-turbo", info(4_096, true, false)),
    ("o3-mini", info(100_000, true, false)),
    ("claude-3-haiku-20240307", info(4_096, true, true)),
    ("claude-3-5-haiku-20241022", info(8_192, true, true)),
    ("claude-3-5-sonnet-20241022", info(8_192, true, true)),
    ("claude-3-7-sonnet-20250219", info(128_000, true, true)),
    ("claude-sonnet-4-20250514", info(64_000, true, true)),
    ("claude-opus-4-20250514", info(32_000, true, true)),
    ("gemini-1.5-pro", info(8_192, true, true)),
    ("gemini-2.0-flash", info(8_192, true, true)),
    ("gemini-2.5-pro", info(65_535, true, true)),
    ("mistral-large-latest", info(128_000, true, false)),
    (
        "llama3",
        BackendModelInfo {
            max_output_tokens: None,
            max_tokens: Some(8_192),
            supports_function_calling: false,
            supports_vision: false,
            supports_system_messages: true,
        },
    ),
];

/// Metadata for `model`, ignoring any `provider/` routing prefix
pub fn lookup(model: &str) -> Option<BackendModelInfo> {
    let bare = model.rsplit_once('/').map_or(model, |(_, id)| id);
    CATALOG.iter().find(|(id, _)| *id == bare).map(|(_, info)| *info)
}
