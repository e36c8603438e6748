// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine port contract for the mapnik binding.
//!
//! This crate defines the boundary between the binding (`mapnik`) and whatever
//! actually renders maps: the native library loaded by `mapnik-dylib`, or the
//! headless `mapnik-mock` engine used by tests.
//!
//! # Design Principles
//!
//! - **Adapters are dumb**: they forward calls and report native failures.
//!   Layer bookkeeping and option resolution live in the binding.
//! - **Ownership is the release protocol**: a [`NativeMap`] owns exactly one
//!   native map resource and releases it in `Drop`.
//! - **Messages are verbatim**: [`EngineError`] carries the engine's own
//!   diagnostic text, unprefixed.

use thiserror::Error;

/// Error reported by an engine adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The native engine reported a failure; the payload is its diagnostic text.
    #[error("{0}")]
    Native(String),
    /// An argument could not be marshaled across the call boundary
    /// (interior NUL byte, mismatched buffer length, and so on).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    /// Diagnostic text without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Native(msg) | Self::InvalidArgument(msg) => msg,
        }
    }
}

mod pixels;
mod port;
mod types;

pub use pixels::{demultiply, premultiply, AlphaMode, PixelBuffer};
pub use port::{Engine, NativeMap};
pub use types::{
    BoundingBox, RenderParams, Rgba, DEFAULT_FORMAT, DEFAULT_HEIGHT, DEFAULT_SRS, DEFAULT_WIDTH,
};
