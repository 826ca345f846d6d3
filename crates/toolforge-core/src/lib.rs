// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for toolforge.
//!
//! Defines the error type, the tool record and execution types, and the
//! adapter traits implemented by the provider, embedding, storage and
//! runtime crates.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ForgeError;
pub use types::{
    AdapterType, ChatMessage, CompletionRequest, CompletionResponse, EmbeddingInput,
    EmbeddingOutput, ExecutionOutcome, HealthStatus, Invocation, ParamSpec, ParameterMap,
    ScoredTool, SyntaxCheck, ToolRecord, parameters_from_value, tool_id,
};

pub use traits::{
    EmbeddingAdapter, PluginAdapter, ProviderAdapter, ToolRuntimeAdapter, ToolStoreAdapter,
};
