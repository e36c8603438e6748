// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock engine for headless testing of the mapnik binding.
//!
//! `MockMap` keeps map state in plain Rust values and rasterizes each visible
//! layer as a filled rectangle over its extent, so layer selection has a
//! visible effect on output. Allocation and release are counted to verify
//! exactly-once release.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mapnik_port::{
    premultiply, AlphaMode, BoundingBox, Engine, EngineError, NativeMap, PixelBuffer,
    RenderParams, Rgba, DEFAULT_HEIGHT, DEFAULT_SRS, DEFAULT_WIDTH,
};
use tracing::debug;

use crate::codec;
use crate::fixture::{bbox_from_array, MapFixture, MockLayer};

/// Meters per degree at the equator on the WGS84 ellipsoid.
const METERS_PER_DEGREE: f64 = 6_378_137.0 * 2.0 * std::f64::consts::PI / 360.0;
/// Standard rendering pixel size in meters (0.28 mm).
const PIXEL_SIZE_METERS: f64 = 0.00028;
/// Largest image area the engine allocates, in pixels.
const MAX_IMAGE_PIXELS: u64 = 65_535 * 65_535;

#[derive(Debug, Default)]
struct Counters {
    allocated: AtomicUsize,
    released: AtomicUsize,
}

#[derive(Debug, Default)]
struct Registry {
    datasources: Vec<PathBuf>,
    fonts: Vec<PathBuf>,
}

/// Mock engine.
///
/// Cloning shares counters and registrations, so a test can keep one clone
/// for inspection while maps are created from another.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    counters: Arc<Counters>,
    registry: Arc<Mutex<Registry>>,
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps allocated so far.
    pub fn allocated_maps(&self) -> usize {
        self.counters.allocated.load(Ordering::SeqCst)
    }

    /// Maps released so far.
    pub fn released_maps(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Maps allocated and not yet released.
    pub fn live_maps(&self) -> usize {
        self.allocated_maps() - self.released_maps()
    }

    /// Datasource directories registered so far.
    pub fn registered_datasources(&self) -> Vec<PathBuf> {
        self.with_registry(|r| r.datasources.clone())
    }

    /// Font directories registered so far.
    pub fn registered_fonts(&self) -> Vec<PathBuf> {
        self.with_registry(|r| r.fonts.clone())
    }

    fn with_registry<T>(&self, f: impl FnOnce(&mut Registry) -> T) -> T {
        let mut guard = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

fn require_dir(dir: &Path) -> Result<(), EngineError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(EngineError::Native(format!(
            "{} is not a directory",
            dir.display()
        )))
    }
}

impl Engine for MockEngine {
    type Map = MockMap;

    fn create_default_map(&self) -> Result<MockMap, EngineError> {
        self.counters.allocated.fetch_add(1, Ordering::SeqCst);
        Ok(MockMap {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            srs: DEFAULT_SRS.to_owned(),
            background: Rgba::TRANSPARENT,
            layers: Vec::new(),
            extent: None,
            maximum_extent: None,
            counters: Arc::clone(&self.counters),
        })
    }

    fn encode_pixels(&self, image: &PixelBuffer, format: &str) -> Result<Vec<u8>, EngineError> {
        codec::encode(image, format)
    }

    fn version(&self) -> String {
        format!("mapnik-mock {}", env!("CARGO_PKG_VERSION"))
    }

    fn register_datasources(&self, dir: &Path) -> Result<(), EngineError> {
        require_dir(dir)?;
        self.with_registry(|r| r.datasources.push(dir.to_path_buf()));
        Ok(())
    }

    fn register_fonts(&self, dir: &Path) -> Result<(), EngineError> {
        require_dir(dir)?;
        self.with_registry(|r| r.fonts.push(dir.to_path_buf()));
        Ok(())
    }
}

/// Map state held by the mock engine.
#[derive(Debug)]
pub struct MockMap {
    width: u32,
    height: u32,
    srs: String,
    background: Rgba,
    layers: Vec<MockLayer>,
    extent: Option<BoundingBox>,
    maximum_extent: Option<BoundingBox>,
    counters: Arc<Counters>,
}

impl MockMap {
    /// Current view extent, if the map has been zoomed.
    pub fn extent(&self) -> Option<BoundingBox> {
        self.extent
    }

    /// Remove the layer at `index` and return its name.
    ///
    /// Real maps only change their layer list on load; this lets tests
    /// simulate an out-of-band change.
    pub fn remove_layer(&mut self, index: usize) -> Option<String> {
        (index < self.layers.len()).then(|| self.layers.remove(index).name)
    }

    fn apply_fixture(&mut self, fixture: &MapFixture) {
        self.srs.clone_from(&fixture.srs);
        self.background = fixture.background.map_or(Rgba::TRANSPARENT, Rgba::from);
        self.layers = fixture.layers.iter().map(MockLayer::from).collect();
        self.maximum_extent = fixture.maximum_extent.map(bbox_from_array);
        self.extent = None;
        debug!(layers = self.layers.len(), srs = %self.srs, "mock map loaded");
    }

    fn clamp(&self, bbox: BoundingBox) -> BoundingBox {
        match self.maximum_extent {
            Some(max) => BoundingBox::new(
                bbox.min_x.max(max.min_x),
                bbox.min_y.max(max.min_y),
                bbox.max_x.min(max.max_x),
                bbox.max_y.min(max.max_y),
            ),
            None => bbox,
        }
    }

    fn is_geographic(&self) -> bool {
        self.srs.contains("+proj=longlat") || self.srs.contains("epsg:4326")
    }
}

impl Drop for MockMap {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl NativeMap for MockMap {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| EngineError::Native(format!("{}: {err}", path.display())))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        self.load_string(&text, base)
    }

    fn load_string(&mut self, description: &str, _base_path: &Path) -> Result<(), EngineError> {
        let fixture: MapFixture = serde_json::from_str(description).map_err(|err| {
            EngineError::Native(format!("failed to parse map description: {err}"))
        })?;
        self.apply_fixture(&fixture);
        Ok(())
    }

    fn zoom_to_full_extent(&mut self) -> Result<(), EngineError> {
        let full = self
            .layers
            .iter()
            .filter(|l| l.visible)
            .filter_map(|l| l.extent)
            .reduce(|acc, e| acc.union(&e))
            .ok_or_else(|| {
                EngineError::Native("could not zoom to combined layer extents".to_owned())
            })?;
        self.extent = Some(self.clamp(full));
        Ok(())
    }

    fn zoom_to_box(&mut self, bbox: BoundingBox) {
        self.extent = Some(self.clamp(bbox));
    }

    fn srs(&self) -> String {
        self.srs.clone()
    }

    fn set_srs(&mut self, srs: &str) -> Result<(), EngineError> {
        if srs.trim().is_empty() {
            return Err(EngineError::Native(
                "invalid projection definition: empty string".to_owned(),
            ));
        }
        srs.clone_into(&mut self.srs);
        Ok(())
    }

    fn background(&self) -> Rgba {
        self.background
    }

    fn set_background(&mut self, color: Rgba) {
        self.background = color;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn scale_denominator(&self) -> f64 {
        let Some(extent) = self.extent.filter(BoundingBox::is_valid) else {
            return 0.0;
        };
        if self.width == 0 {
            return 0.0;
        }
        let mut resolution = extent.width() / f64::from(self.width);
        if self.is_geographic() {
            resolution *= METERS_PER_DEGREE;
        }
        resolution / PIXEL_SIZE_METERS
    }

    fn set_maximum_extent(&mut self, bbox: BoundingBox) {
        self.maximum_extent = Some(bbox);
    }

    fn reset_maximum_extent(&mut self) {
        self.maximum_extent = None;
    }

    fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.name.clone()).collect()
    }

    fn layer_visible(&self, index: usize) -> bool {
        self.layers.get(index).is_some_and(|l| l.visible)
    }

    fn set_layer_visible(&mut self, index: usize, visible: bool) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.visible = visible;
        }
    }

    fn render(&mut self, params: &RenderParams, format: &str) -> Result<Vec<u8>, EngineError> {
        let pixels = self.render_pixels(params)?;
        codec::encode(&pixels, format)
    }

    fn render_to_file(
        &mut self,
        params: &RenderParams,
        format: &str,
        path: &Path,
    ) -> Result<(), EngineError> {
        let bytes = self.render(params, format)?;
        std::fs::write(path, bytes)
            .map_err(|err| EngineError::Native(format!("{}: {err}", path.display())))
    }

    fn render_pixels(&mut self, params: &RenderParams) -> Result<PixelBuffer, EngineError> {
        validate(params)?;
        let mut canvas = PixelBuffer::filled(
            params.width,
            params.height,
            AlphaMode::Premultiplied,
            premultiply(self.background),
        )?;
        let Some(extent) = self.extent.filter(BoundingBox::is_valid) else {
            // Nothing to project onto; only the background is drawn.
            return Ok(canvas);
        };
        for layer in self.layers.iter().filter(|l| l.visible) {
            if let (Some(bbox), Some(color)) = (layer.extent, layer.color) {
                fill(&mut canvas, &extent, &bbox, premultiply(color));
            }
        }
        Ok(canvas)
    }
}

fn validate(params: &RenderParams) -> Result<(), EngineError> {
    if params.width == 0 || params.height == 0 {
        return Err(EngineError::Native(format!(
            "invalid image size {}x{}",
            params.width, params.height
        )));
    }
    if u64::from(params.width) * u64::from(params.height) > MAX_IMAGE_PIXELS {
        return Err(EngineError::Native(format!(
            "image size {}x{} exceeds the maximum of {MAX_IMAGE_PIXELS} pixels",
            params.width, params.height
        )));
    }
    if !(params.scale_factor.is_finite() && params.scale_factor > 0.0) {
        return Err(EngineError::Native(format!(
            "invalid scale factor {}",
            params.scale_factor
        )));
    }
    if let Some(denominator) = params.scale_denominator {
        if !(denominator.is_finite() && denominator > 0.0) {
            return Err(EngineError::Native(format!(
                "invalid scale denominator {denominator}"
            )));
        }
    }
    Ok(())
}

/// Paint `color` (premultiplied) source-over onto the pixels covered by `bbox`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fill(canvas: &mut PixelBuffer, view: &BoundingBox, bbox: &BoundingBox, color: Rgba) {
    let (w, h) = (f64::from(canvas.width()), f64::from(canvas.height()));
    let to_px = |v: f64, max: f64| v.clamp(0.0, max) as u32;
    let x0 = to_px((bbox.min_x - view.min_x) / view.width() * w, w);
    let x1 = to_px((bbox.max_x - view.min_x) / view.width() * w, w);
    // Pixel rows grow southwards.
    let y0 = to_px((view.max_y - bbox.max_y) / view.height() * h, h);
    let y1 = to_px((view.max_y - bbox.min_y) / view.height() * h, h);

    let inv = 255 - u16::from(color.a);
    let over = |src: u8, dst: u8| -> u8 { (u16::from(src) + u16::from(dst) * inv / 255) as u8 };
    for y in y0..y1 {
        for x in x0..x1 {
            if let Some(dst) = canvas.pixel(x, y) {
                let out = Rgba::new(
                    over(color.r, dst.r),
                    over(color.g, dst.g),
                    over(color.b, dst.b),
                    over(color.a, dst.a),
                );
                canvas.set_pixel(x, y, out);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixture::LayerFixture;

    fn params(width: u32, height: u32) -> RenderParams {
        RenderParams {
            width,
            height,
            scale_factor: 1.0,
            scale_denominator: None,
        }
    }

    fn loaded(fixture: &MapFixture) -> (MockEngine, MockMap) {
        let engine = MockEngine::new();
        let mut map = engine.create_default_map().unwrap();
        map.load_string(&fixture.to_json().unwrap(), Path::new("."))
            .unwrap();
        (engine, map)
    }

    #[test]
    fn default_map_state() {
        let engine = MockEngine::new();
        let map = engine.create_default_map().unwrap();
        assert_eq!(map.srs(), DEFAULT_SRS);
        assert_eq!(map.background(), Rgba::TRANSPARENT);
        assert_eq!(map.size(), (800, 600));
        assert!(map.layer_names().is_empty());
        assert!(map.scale_denominator().abs() < f64::EPSILON);
        assert!(engine.version().starts_with("mapnik-mock "));
    }

    #[test]
    fn drop_releases_exactly_once() {
        let engine = MockEngine::new();
        let a = engine.create_default_map().unwrap();
        let b = engine.create_default_map().unwrap();
        assert_eq!(engine.live_maps(), 2);
        drop(a);
        assert_eq!(engine.released_maps(), 1);
        drop(b);
        assert_eq!(engine.allocated_maps(), 2);
        assert_eq!(engine.released_maps(), 2);
        assert_eq!(engine.live_maps(), 0);
    }

    #[test]
    fn zoom_all_uses_visible_layers_only() {
        let fixture = MapFixture::default()
            .with_layer(LayerFixture::new("a").filled([0.0, 0.0, 10.0, 10.0], [0, 0, 0, 255]))
            .with_layer(
                LayerFixture::new("b")
                    .active(false)
                    .filled([-50.0, -50.0, 50.0, 50.0], [0, 0, 0, 255]),
            );
        let (_engine, mut map) = loaded(&fixture);
        map.zoom_to_full_extent().unwrap();
        assert_eq!(map.extent(), Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn zoom_all_without_extents_fails() {
        let (_engine, mut map) = loaded(&MapFixture::default().with_layer(LayerFixture::new("a")));
        assert!(map.zoom_to_full_extent().is_err());
    }

    #[test]
    fn maximum_extent_clamps_zoom() {
        let (_engine, mut map) = loaded(&MapFixture::default());
        map.set_maximum_extent(BoundingBox::new(0.0, 0.0, 5.0, 5.0));
        map.zoom_to_box(BoundingBox::new(-10.0, -10.0, 10.0, 10.0));
        assert_eq!(map.extent(), Some(BoundingBox::new(0.0, 0.0, 5.0, 5.0)));
        map.reset_maximum_extent();
        map.zoom_to_box(BoundingBox::new(-10.0, -10.0, 10.0, 10.0));
        assert_eq!(map.extent(), Some(BoundingBox::new(-10.0, -10.0, 10.0, 10.0)));
    }

    #[test]
    fn visible_layer_covers_its_extent() {
        let fixture = MapFixture::default().with_layer(
            LayerFixture::new("west").filled([0.0, 0.0, 5.0, 10.0], [255, 0, 0, 255]),
        );
        let (_engine, mut map) = loaded(&fixture);
        map.zoom_to_box(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        let img = map.render_pixels(&params(10, 10)).unwrap();
        assert_eq!(img.pixel(0, 0), Some(Rgba::new(255, 0, 0, 255)));
        assert_eq!(img.pixel(4, 9), Some(Rgba::new(255, 0, 0, 255)));
        assert_eq!(img.pixel(5, 0), Some(Rgba::TRANSPARENT));

        map.set_layer_visible(0, false);
        let img = map.render_pixels(&params(10, 10)).unwrap();
        assert_eq!(img.pixel(0, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let (_engine, mut map) = loaded(&MapFixture::default());
        assert!(map.render_pixels(&params(0, 10)).is_err());
        let mut p = params(10, 10);
        p.scale_factor = f64::NAN;
        assert!(map.render_pixels(&p).is_err());
        p.scale_factor = 1.0;
        p.scale_denominator = Some(-1.0);
        assert!(map.render_pixels(&p).is_err());
    }

    #[test]
    fn oversized_render_is_rejected_before_allocating() {
        let (_engine, mut map) = loaded(&MapFixture::default());
        let err = map.render_pixels(&params(u32::MAX, u32::MAX)).unwrap_err();
        assert!(matches!(err, EngineError::Native(ref msg) if msg.contains("exceeds the maximum")));
        assert!(map.render(&params(70_000, 70_000), "png").is_err());
    }

    #[test]
    fn empty_srs_is_rejected() {
        let (_engine, mut map) = loaded(&MapFixture::default());
        assert!(map.set_srs("  ").is_err());
        assert_eq!(map.srs(), DEFAULT_SRS);
    }

    #[test]
    fn registration_requires_directories() {
        let engine = MockEngine::new();
        let dir = tempfile::tempdir().unwrap();
        engine.register_fonts(dir.path()).unwrap();
        assert!(engine
            .register_datasources(&dir.path().join("missing"))
            .is_err());
        assert_eq!(engine.registered_fonts(), vec![dir.path().to_path_buf()]);
        assert!(engine.registered_datasources().is_empty());
    }
}
