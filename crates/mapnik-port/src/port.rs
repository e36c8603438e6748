// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine and map port traits defining the native rendering contract.

use std::path::Path;

use crate::{BoundingBox, EngineError, PixelBuffer, RenderParams, Rgba};

/// Process-level entry points of a rendering engine.
///
/// # Design
///
/// This is the hexagonal port on the engine side. The binding allocates maps
/// and encodes images through it; adapters (`mapnik-dylib`, `mapnik-mock`)
/// implement it. Everything map-specific lives on [`NativeMap`].
pub trait Engine {
    /// Owning handle to one native map resource.
    type Map: NativeMap;

    /// Allocate a map in the engine's default state.
    ///
    /// Defaults: [`DEFAULT_WIDTH`](crate::DEFAULT_WIDTH) x
    /// [`DEFAULT_HEIGHT`](crate::DEFAULT_HEIGHT), [`DEFAULT_SRS`](crate::DEFAULT_SRS),
    /// transparent background, no layers.
    fn create_default_map(&self) -> Result<Self::Map, EngineError>;

    /// Encode a decoded pixel buffer with the engine's codecs.
    ///
    /// `format` uses the engine vocabulary (`png`, `png256:m=h`, `jpeg80`, ...).
    fn encode_pixels(&self, image: &PixelBuffer, format: &str) -> Result<Vec<u8>, EngineError>;

    /// Human-readable engine version.
    fn version(&self) -> String;

    /// Register datasource plugins found in `dir`.
    fn register_datasources(&self, dir: &Path) -> Result<(), EngineError>;

    /// Register font files found in `dir`.
    fn register_fonts(&self, dir: &Path) -> Result<(), EngineError>;
}

/// One native map resource.
///
/// Implementors release the native resource in `Drop`; a value of this type
/// is the only reference to it. Layer indices follow [`layer_names`](Self::layer_names).
pub trait NativeMap {
    /// Replace the map with the description stored at `path`.
    fn load(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Replace the map with an in-memory description; relative resources
    /// resolve against `base_path`.
    fn load_string(&mut self, description: &str, base_path: &Path) -> Result<(), EngineError>;

    /// Zoom to the union of all layer extents.
    fn zoom_to_full_extent(&mut self) -> Result<(), EngineError>;

    /// Zoom to `bbox`, in map coordinates.
    fn zoom_to_box(&mut self, bbox: BoundingBox);

    /// Current projection definition.
    fn srs(&self) -> String;

    /// Set the projection definition.
    fn set_srs(&mut self, srs: &str) -> Result<(), EngineError>;

    /// Current background color (straight alpha).
    fn background(&self) -> Rgba;

    /// Set the background color (straight alpha).
    fn set_background(&mut self, color: Rgba);

    /// Configured output size `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Change the configured output size.
    fn resize(&mut self, width: u32, height: u32);

    /// Scale denominator of the current extent at the configured size.
    fn scale_denominator(&self) -> f64;

    /// Clamp zooming to `bbox`.
    fn set_maximum_extent(&mut self, bbox: BoundingBox);

    /// Remove the zoom clamp.
    fn reset_maximum_extent(&mut self);

    /// Layer names in stacking order.
    fn layer_names(&self) -> Vec<String>;

    /// Whether the layer at `index` is enabled. Out-of-range indices are hidden.
    fn layer_visible(&self, index: usize) -> bool;

    /// Enable or disable the layer at `index`. Out-of-range indices are ignored.
    fn set_layer_visible(&mut self, index: usize, visible: bool);

    /// Render and encode in one native call.
    fn render(&mut self, params: &RenderParams, format: &str) -> Result<Vec<u8>, EngineError>;

    /// Render, encode and write to `path` through the engine's own file writer.
    fn render_to_file(
        &mut self,
        params: &RenderParams,
        format: &str,
        path: &Path,
    ) -> Result<(), EngineError>;

    /// Render into an uncompressed, alpha-associated pixel buffer.
    fn render_pixels(&mut self, params: &RenderParams) -> Result<PixelBuffer, EngineError>;
}
