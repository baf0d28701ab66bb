// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

pub mod config;
pub mod models;
pub mod prompt;
pub mod routes;
pub mod stream;
pub mod upstream;
