// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy surfaced by the binding.

use mapnik_port::EngineError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by map, render and encode operations.
///
/// Engine diagnostics are kept verbatim in the payload. Every variant is
/// terminal for the call that produced it; no partial output accompanies it.
#[derive(Debug, Error)]
pub enum Error {
    /// The map description could not be read or parsed.
    #[error("failed to load map from {source_name}: {message}")]
    Load {
        /// Path of the description, or `<string>` for in-memory loads.
        source_name: String,
        /// Engine diagnostic.
        message: String,
    },
    /// Rendering or encoding a map failed (including unknown formats).
    #[error("render failed: {0}")]
    Render(String),
    /// Encoding a standalone pixel buffer failed (including unknown formats).
    #[error("encode failed: {0}")]
    Encode(String),
    /// Any other engine call failed (allocation, projection, zoom, registration).
    #[error("engine error: {0}")]
    Native(String),
    /// The layer list changed between storing and restoring visibility.
    #[error("layer count changed from {stored} to {current} since visibility was stored")]
    LayerCountChanged {
        /// Flags in the stored snapshot.
        stored: usize,
        /// Layers on the map now.
        current: usize,
    },
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn load(source_name: impl Into<String>, err: &EngineError) -> Self {
        Self::Load {
            source_name: source_name.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn render(err: &EngineError) -> Self {
        Self::Render(err.to_string())
    }

    pub(crate) fn encode(err: &EngineError) -> Self {
        Self::Encode(err.to_string())
    }

    pub(crate) fn native(err: &EngineError) -> Self {
        Self::Native(err.to_string())
    }
}
