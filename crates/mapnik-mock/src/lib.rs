// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless engine and fixtures for mapnik-port.
//!
//! This crate provides:
//! - [`MockEngine`]/[`MockMap`]: an in-process implementation of the engine
//!   port, driven by JSON map descriptions ([`MapFixture`])
//! - real PNG/JPEG codecs behind the engine's format-string vocabulary
//!
//! # Design
//!
//! The mock keeps only the state the binding can observe: size, projection,
//! background, extents and per-layer visibility. It exists so the binding's
//! state machine and render dispatch can be tested without a native library.
#![forbid(unsafe_code)]

mod codec;
mod engine;
mod fixture;

pub use engine::{MockEngine, MockMap};
pub use fixture::{LayerFixture, MapFixture};
