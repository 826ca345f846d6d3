// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapters used by the tool store.
//!
//! [`HashingEmbedder`] works offline and is the default. [`HttpEmbedder`]
//! calls an OpenAI-compatible or Ollama embedding endpoint.

pub mod hashing;
pub mod http;

use std::sync::Arc;

use toolforge_config::{EmbeddingConfig, EmbeddingKind};
use toolforge_core::{EmbeddingAdapter, ForgeError};

pub use hashing::HashingEmbedder;
pub use http::HttpEmbedder;

/// Builds the embedder selected in configuration.
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingAdapter>, ForgeError> {
    match config.kind {
        EmbeddingKind::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimensions))),
        EmbeddingKind::Openai | EmbeddingKind::Ollama => Ok(Arc::new(HttpEmbedder::new(config)?)),
    }
}

/// Scales a vector to unit length. Zero vectors are returned unchanged.
pub(crate) fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter_mut().for_each(|v| *v /= norm);
    }
}
