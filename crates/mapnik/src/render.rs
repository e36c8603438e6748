// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render options and dispatch to the engine.

use std::path::Path;

use mapnik_port::{NativeMap, PixelBuffer, RenderParams, DEFAULT_FORMAT};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{Error, Map};

/// Options for one render call. Zero values mean "use the default".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Output format in the engine's vocabulary (`png24`, `png256:m=h`,
    /// `jpeg80`, ...). Empty selects [`DEFAULT_FORMAT`]. Ignored by
    /// [`Map::render_image`].
    pub format: String,
    /// Output width in pixels; 0 uses the map width.
    pub width: u32,
    /// Output height in pixels; 0 uses the map height.
    pub height: u32,
    /// Symbol and font scaling for high-DPI output; 0 means 1.0.
    pub scale_factor: f64,
    /// Render at this fixed scale denominator; 0 derives it from the extent.
    pub scale_denominator: f64,
}

impl RenderOpts {
    /// Set the output format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set the output size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the scale factor.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set a fixed scale denominator.
    pub fn with_scale_denominator(mut self, scale_denominator: f64) -> Self {
        self.scale_denominator = scale_denominator;
        self
    }

    /// The format that will be sent to the engine.
    pub fn effective_format(&self) -> &str {
        if self.format.is_empty() {
            DEFAULT_FORMAT
        } else {
            &self.format
        }
    }

    /// Fill in defaults against a map of `map_size`.
    ///
    /// Only exact zeros are replaced; other out-of-range values are passed
    /// through for the engine to reject.
    pub fn resolve(&self, map_size: (u32, u32)) -> RenderParams {
        let (map_width, map_height) = map_size;
        RenderParams {
            width: if self.width == 0 { map_width } else { self.width },
            height: if self.height == 0 {
                map_height
            } else {
                self.height
            },
            scale_factor: if self.scale_factor == 0.0 {
                1.0
            } else {
                self.scale_factor
            },
            scale_denominator: (self.scale_denominator != 0.0).then_some(self.scale_denominator),
        }
    }
}

impl<N: NativeMap> Map<N> {
    /// Render the map and return the encoded image.
    #[instrument(skip(self), fields(format = opts.effective_format()))]
    pub fn render(&mut self, opts: &RenderOpts) -> Result<Vec<u8>, Error> {
        let params = opts.resolve(self.native.size());
        let bytes = self
            .native
            .render(&params, opts.effective_format())
            .map_err(|e| Error::render(&e))?;
        debug!(bytes = bytes.len(), ?params, "rendered");
        Ok(bytes)
    }

    /// Render the map and write the encoded image to `path` through the
    /// engine's own file writer.
    ///
    /// Produces the same bytes as [`render`](Self::render) for the same options.
    #[instrument(skip(self, path), fields(format = opts.effective_format()))]
    pub fn render_to_file(&mut self, opts: &RenderOpts, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let params = opts.resolve(self.native.size());
        self.native
            .render_to_file(&params, opts.effective_format(), path)
            .map_err(|e| Error::render(&e))?;
        debug!(path = %path.display(), ?params, "rendered to file");
        Ok(())
    }

    /// Render the map into a decoded, alpha-associated pixel buffer.
    ///
    /// `opts.format` is ignored.
    #[instrument(skip(self))]
    pub fn render_image(&mut self, opts: &RenderOpts) -> Result<PixelBuffer, Error> {
        let params = opts.resolve(self.native.size());
        let image = self
            .native
            .render_pixels(&params)
            .map_err(|e| Error::render(&e))?;
        debug!(width = image.width(), height = image.height(), "rendered pixels");
        Ok(image)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let params = RenderOpts::default().resolve((800, 600));
        assert_eq!(
            params,
            RenderParams {
                width: 800,
                height: 600,
                scale_factor: 1.0,
                scale_denominator: None,
            }
        );
        assert_eq!(RenderOpts::default().effective_format(), "png256");
    }

    #[test]
    fn explicit_values_win() {
        let opts = RenderOpts::default()
            .with_format("jpeg80")
            .with_size(256, 0)
            .with_scale_factor(2.0)
            .with_scale_denominator(50_000.0);
        let params = opts.resolve((800, 600));
        assert_eq!(params.width, 256);
        assert_eq!(params.height, 600);
        assert_eq!(params.scale_denominator, Some(50_000.0));
        assert_eq!(opts.effective_format(), "jpeg80");
    }

    #[test]
    fn negative_scale_factor_reaches_engine() {
        let params = RenderOpts::default().with_scale_factor(-1.0).resolve((1, 1));
        assert!(params.scale_factor < 0.0);
    }

    #[test]
    fn options_deserialize_with_missing_fields() {
        let opts: RenderOpts = serde_json::from_str(r#"{"format":"png24","width":64}"#).unwrap();
        assert_eq!(opts.format, "png24");
        assert_eq!(opts.width, 64);
        assert_eq!(opts.height, 0);
    }
}
