// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Owning map handle and engine pass-throughs.

use std::path::Path;

use mapnik_port::{BoundingBox, Engine, NativeMap, Rgba};
use tracing::{debug, info};

use crate::config::MapConfig;
use crate::layers::LayerState;
use crate::Error;

/// A map loaded into the rendering engine.
///
/// `Map` is move-only. The native resource is released when the value is
/// dropped or passed to [`Map::free`]; neither can happen twice and no call
/// can follow it.
#[derive(Debug)]
pub struct Map<N: NativeMap> {
    pub(crate) native: N,
    pub(crate) layers: LayerState,
}

impl<N: NativeMap> Map<N> {
    /// Allocate a map in the engine's default state.
    ///
    /// Before any load the map reports the engine defaults: 800x600,
    /// [`DEFAULT_SRS`](crate::DEFAULT_SRS), transparent background, no layers.
    pub fn new<E>(engine: &E) -> Result<Self, Error>
    where
        E: Engine<Map = N>,
    {
        let native = engine.create_default_map().map_err(|e| Error::native(&e))?;
        Ok(Self::from_native(native))
    }

    /// Allocate a default map and resize it.
    pub fn with_size<E>(engine: &E, width: u32, height: u32) -> Result<Self, Error>
    where
        E: Engine<Map = N>,
    {
        let mut map = Self::new(engine)?;
        map.resize(width, height);
        Ok(map)
    }

    /// Allocate a map and apply `config`: fonts and datasource plugins are
    /// registered with the engine, then size, projection and background are set.
    pub fn with_config<E>(engine: &E, config: &MapConfig) -> Result<Self, Error>
    where
        E: Engine<Map = N>,
    {
        for dir in &config.plugin_dirs {
            engine
                .register_datasources(dir)
                .map_err(|e| Error::native(&e))?;
        }
        for dir in &config.font_dirs {
            engine.register_fonts(dir).map_err(|e| Error::native(&e))?;
        }
        let mut map = Self::with_size(engine, config.width, config.height)?;
        if let Some(srs) = &config.srs {
            map.set_srs(srs)?;
        }
        if let Some(background) = config.background {
            map.set_background(Rgba::from(background));
        }
        Ok(map)
    }

    /// Allocate a map prepared from the [`MapConfig`] JSON file at `path`.
    pub fn with_config_file<E>(engine: &E, path: impl AsRef<Path>) -> Result<Self, Error>
    where
        E: Engine<Map = N>,
    {
        let config = MapConfig::from_path(path)?;
        Self::with_config(engine, &config)
    }

    /// Wrap an already allocated native map.
    pub fn from_native(native: N) -> Self {
        Self {
            native,
            layers: LayerState::default(),
        }
    }

    /// Borrow the underlying native map.
    pub fn native(&self) -> &N {
        &self.native
    }

    /// Mutably borrow the underlying native map.
    ///
    /// Changes made here bypass layer bookkeeping; see
    /// [`reset_layer_status`](Self::reset_layer_status).
    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    /// Release the native map now instead of at end of scope.
    pub fn free(self) {
        drop(self);
    }

    /// Load the map description at `path`, replacing the current map.
    ///
    /// Any stored layer visibility is discarded: it described the old layer list.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        self.native
            .load(path)
            .map_err(|e| Error::load(path.display().to_string(), &e))?;
        self.after_load();
        info!(path = %path.display(), layers = self.native.layer_names().len(), "map loaded");
        Ok(())
    }

    /// Load a map description from memory; relative resources resolve
    /// against `base_path`.
    pub fn load_string(
        &mut self,
        description: &str,
        base_path: impl AsRef<Path>,
    ) -> Result<(), Error> {
        self.native
            .load_string(description, base_path.as_ref())
            .map_err(|e| Error::load("<string>", &e))?;
        self.after_load();
        Ok(())
    }

    fn after_load(&mut self) {
        if self.layers.take().is_some() {
            debug!("discarded layer visibility snapshot of the previous map");
        }
    }

    /// Zoom to the combined extent of all layers.
    pub fn zoom_all(&mut self) -> Result<(), Error> {
        self.native
            .zoom_to_full_extent()
            .map_err(|e| Error::native(&e))
    }

    /// Zoom to `bbox`, in map coordinates.
    pub fn zoom_to(&mut self, bbox: BoundingBox) {
        self.native.zoom_to_box(bbox);
    }

    /// Projection of the map.
    pub fn srs(&self) -> String {
        self.native.srs()
    }

    /// Set the projection of the map.
    pub fn set_srs(&mut self, srs: &str) -> Result<(), Error> {
        self.native.set_srs(srs).map_err(|e| Error::native(&e))
    }

    /// Background color (straight alpha).
    pub fn background_color(&self) -> Rgba {
        self.native.background()
    }

    /// Set the background color (straight alpha).
    pub fn set_background(&mut self, color: Rgba) {
        self.native.set_background(color);
    }

    /// Configured output size `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        self.native.size()
    }

    /// Change the configured output size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.native.resize(width, height);
    }

    /// Scale denominator of the current view; 0 before any zoom.
    pub fn scale_denominator(&self) -> f64 {
        self.native.scale_denominator()
    }

    /// Prevent zooming beyond `bbox`.
    pub fn set_maximum_extent(&mut self, bbox: BoundingBox) {
        self.native.set_maximum_extent(bbox);
    }

    /// Remove the maximum extent.
    pub fn reset_maximum_extent(&mut self) {
        self.native.reset_maximum_extent();
    }

    /// Layer names in stacking order.
    pub fn layer_names(&self) -> Vec<String> {
        self.native.layer_names()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mapnik_mock::{LayerFixture, MapFixture, MockEngine};
    use mapnik_port::DEFAULT_SRS;

    #[test]
    fn defaults_before_load() {
        let engine = MockEngine::new();
        let map = Map::new(&engine).unwrap();
        assert_eq!(map.srs(), DEFAULT_SRS);
        assert_eq!(map.background_color(), Rgba::TRANSPARENT);
        assert_eq!(map.size(), (800, 600));
        assert!(map.layer_names().is_empty());
    }

    #[test]
    fn free_and_drop_release_once() {
        let engine = MockEngine::new();
        Map::new(&engine).unwrap().free();
        {
            let _scoped = Map::new(&engine).unwrap();
        }
        assert_eq!(engine.allocated_maps(), 2);
        assert_eq!(engine.released_maps(), 2);
    }

    #[test]
    fn failed_load_keeps_handle_usable() {
        let engine = MockEngine::new();
        let mut map = Map::new(&engine).unwrap();
        let err = map.load_string("{ not json", ".").unwrap_err();
        assert!(matches!(err, Error::Load { ref source_name, .. } if source_name == "<string>"));
        let json = MapFixture::default()
            .with_layer(LayerFixture::new("a"))
            .to_json()
            .unwrap();
        map.load_string(&json, ".").unwrap();
        assert_eq!(map.layer_names(), vec!["a".to_owned()]);
        drop(map);
        assert_eq!(engine.live_maps(), 0);
    }

    #[test]
    fn with_size_resizes() {
        let engine = MockEngine::new();
        let map = Map::with_size(&engine, 256, 128).unwrap();
        assert_eq!(map.size(), (256, 128));
    }
}
