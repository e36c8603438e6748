// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed binding for the Mapnik map renderer.
//!
//! The binding owns no rendering logic. It wraps an engine adapter (see
//! `mapnik-port`) and adds what the native API leaves to the caller:
//!
//! - [`Map`]: an owning handle; dropping it (or calling [`Map::free`])
//!   releases the native map exactly once.
//! - Layer selection: snapshot, override and restore per-layer visibility
//!   through a caller-supplied [`LayerSelector`].
//! - Render dispatch: [`RenderOpts`] resolved against the map and sent to the
//!   engine as encoded bytes, a file, or a decoded [`PixelBuffer`].
//! - [`encode`]: the engine's codecs applied to any pixel buffer.
//!
//! # Example
//!
//! ```no_run
//! # fn demo<E: mapnik::Engine>(engine: &E) -> Result<(), mapnik::Error> {
//! use mapnik::{Map, RenderOpts, Status};
//!
//! let mut map = Map::new(engine)?;
//! map.load("style/map.xml")?;
//! map.zoom_all()?;
//! map.select_layers(&|name: &str| {
//!     if name == "labels" { Status::Exclude } else { Status::Default }
//! });
//! let png = map.render(&RenderOpts::default().with_format("png24"))?;
//! map.reset_layers()?;
//! # let _ = png;
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//!
//! Every call blocks until the engine returns. Mutating calls take `&mut self`,
//! so a map cannot be rendered from two threads at once. Callers on an async
//! runtime should move the map into a blocking worker.
#![forbid(unsafe_code)]

pub mod config;
mod encode;
mod error;
mod layers;
mod map;
mod render;

pub use config::MapConfig;
pub use encode::encode;
pub use error::Error;
pub use layers::{LayerSelector, Status};
pub use map::Map;
pub use render::RenderOpts;

pub use mapnik_port::{
    AlphaMode, BoundingBox, Engine, EngineError, NativeMap, PixelBuffer, Rgba, DEFAULT_FORMAT,
    DEFAULT_SRS,
};
