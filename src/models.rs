// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// Model Registry: fixed mapping from logical model name to the identifier
// the Ollama backend knows the model by. Compiled in, read-only at runtime.
//
// Some entries are declared but not pulled on every host; the relay does not
// verify availability — the backend answers 404 for a missing model and that
// surfaces as an upstream status error.

/// A model the relay knows how to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelName {
    Llama3,
    Llama32Vision,
    Mistral,
    MistralVision,
    Qwen25Coder,
    Qwen25CoderVision,
}

impl ModelName {
    /// The logical name used in configuration.
    pub fn logical(self) -> &'static str {
        match self {
            ModelName::Llama3 => "llama3",
            ModelName::Llama32Vision => "llama3.2-vision",
            ModelName::Mistral => "mistral",
            ModelName::MistralVision => "mistral-vision",
            ModelName::Qwen25Coder => "qwen2.5-coder",
            ModelName::Qwen25CoderVision => "qwen2.5-coder-vision",
        }
    }

    /// The identifier sent to the backend in the `model` field.
    pub fn backend_id(self) -> &'static str {
        match self {
            ModelName::Llama3 => "llama3",
            ModelName::Llama32Vision => "llama3.2-vision:11b",
            ModelName::Mistral => "mistral",
            ModelName::MistralVision => "mistral-vision:7b",
            ModelName::Qwen25Coder => "qwen2.5-coder:14b",
            ModelName::Qwen25CoderVision => "qwen2.5-coder-vision:14b",
        }
    }
}

/// Every registered model.
pub static MODELS: &[ModelName] = &[
    ModelName::Llama3,
    ModelName::Llama32Vision,
    ModelName::Mistral,
    ModelName::MistralVision,
    ModelName::Qwen25Coder,
    ModelName::Qwen25CoderVision,
];

/// Look up a model by its logical name.
pub fn resolve(logical: &str) -> Option<ModelName> {
    MODELS.iter().copied().find(|m| m.logical() == logical)
}
