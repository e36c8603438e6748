// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON map descriptions understood by the mock engine.
//!
//! The real engine reads its own XML schema; the mock only needs enough
//! structure to exercise layer bookkeeping and rendering:
//!
//! ```json
//! {
//!   "srs": "+init=epsg:4326",
//!   "background": [255, 255, 255, 255],
//!   "layers": [
//!     { "name": "layerA", "extent": [-10, -10, 10, 10], "color": [255, 0, 0, 255] },
//!     { "name": "layerD", "active": false }
//!   ]
//! }
//! ```

use mapnik_port::{BoundingBox, Rgba, DEFAULT_SRS};
use serde::{Deserialize, Serialize};

/// Top-level map description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapFixture {
    /// Projection definition.
    #[serde(default = "default_srs")]
    pub srs: String,
    /// Background color; transparent when absent.
    #[serde(default)]
    pub background: Option<[u8; 4]>,
    /// Zoom clamp as `[min_x, min_y, max_x, max_y]`.
    #[serde(default)]
    pub maximum_extent: Option<[f64; 4]>,
    /// Layers in stacking order.
    #[serde(default)]
    pub layers: Vec<LayerFixture>,
}

impl Default for MapFixture {
    fn default() -> Self {
        Self {
            srs: default_srs(),
            background: None,
            maximum_extent: None,
            layers: Vec::new(),
        }
    }
}

impl MapFixture {
    /// Append a layer (builder style).
    pub fn with_layer(mut self, layer: LayerFixture) -> Self {
        self.layers.push(layer);
        self
    }

    /// Serialize to the JSON form accepted by `load`/`load_string`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One layer of a [`MapFixture`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerFixture {
    /// Layer name reported to selectors.
    pub name: String,
    /// Initial visibility.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Data extent as `[min_x, min_y, max_x, max_y]`; layers without one draw nothing.
    #[serde(default)]
    pub extent: Option<[f64; 4]>,
    /// Fill color (straight alpha) painted over the layer's extent.
    #[serde(default)]
    pub color: Option<[u8; 4]>,
}

impl LayerFixture {
    /// A visible layer with no geometry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            extent: None,
            color: None,
        }
    }

    /// Set initial visibility.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Give the layer an extent filled with `color`.
    pub fn filled(mut self, extent: [f64; 4], color: [u8; 4]) -> Self {
        self.extent = Some(extent);
        self.color = Some(color);
        self
    }
}

/// Runtime state of one loaded layer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MockLayer {
    pub(crate) name: String,
    pub(crate) visible: bool,
    pub(crate) extent: Option<BoundingBox>,
    pub(crate) color: Option<Rgba>,
}

impl From<&LayerFixture> for MockLayer {
    fn from(layer: &LayerFixture) -> Self {
        Self {
            name: layer.name.clone(),
            visible: layer.active,
            extent: layer.extent.map(bbox_from_array),
            color: layer.color.map(Rgba::from),
        }
    }
}

pub(crate) fn bbox_from_array([min_x, min_y, max_x, max_y]: [f64; 4]) -> BoundingBox {
    BoundingBox::new(min_x, min_y, max_x, max_y)
}

fn default_srs() -> String {
    DEFAULT_SRS.to_owned()
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn minimal_description_takes_defaults() {
        let fixture: MapFixture = serde_json::from_str(r#"{"layers":[{"name":"a"}]}"#).unwrap();
        assert_eq!(fixture.srs, DEFAULT_SRS);
        assert_eq!(fixture.background, None);
        assert!(fixture.layers[0].active);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res = serde_json::from_str::<MapFixture>(r#"{"layer":[]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn builder_round_trips_through_json() {
        let fixture = MapFixture::default()
            .with_layer(LayerFixture::new("roads").filled([0.0, 0.0, 1.0, 1.0], [1, 2, 3, 4]))
            .with_layer(LayerFixture::new("labels").active(false));
        let json = fixture.to_json().unwrap();
        let back: MapFixture = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fixture);
    }
}
