// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline feature-hashing embedder.
//!
//! Lowercased word unigrams and adjacent-word bigrams are hashed into a
//! fixed number of signed buckets, then the vector is L2-normalized.
//! Buckets come from SHA-256 so stored vectors stay comparable across
//! builds and platforms.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use toolforge_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, ForgeError, HealthStatus,
    PluginAdapter,
};

use crate::l2_normalize;

const BIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic bag-of-words embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// A zero `dimensions` is bumped to 1.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut vec = vec![0.0f32; self.dimensions];
        for token in &tokens {
            self.accumulate(&mut vec, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vec, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }
        l2_normalize(&mut vec);
        vec
    }

    fn accumulate(&self, vec: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(head) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign * weight;
    }
}

#[async_trait]
impl PluginAdapter for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, ForgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ForgeError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for HashingEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, ForgeError> {
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.embed_text(t)).collect(),
            dimensions: self.dimensions,
        })
    }
}
