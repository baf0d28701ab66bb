// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// Per-route prompt templates. The upstream backend takes one flat prompt
// string; these helpers render it from the request fields.

/// Preamble for the home-assistant route.
const HOME_ASSISTANT_PREAMBLE: &str = "You are a helpful AI home assistant.";

/// Render the home-assistant prompt around the user's message.
pub fn home_assistant(message: &str) -> String {
    format!("{HOME_ASSISTANT_PREAMBLE}\nUser: {message}")
}

/// Render the streaming-route prompt: optional system prompt, optional
/// character name, then the query, newline-joined. Absent or empty optional
/// parts are skipped rather than rendered as blank lines.
pub fn streaming(query: &str, system_prompt: Option<&str>, character_name: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(3);
    if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
        parts.push(system);
    }
    if let Some(name) = character_name.filter(|s| !s.is_empty()) {
        parts.push(name);
    }
    parts.push(query);
    parts.join("\n")
}
