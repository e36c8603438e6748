// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoded RGBA8 pixel buffers and the engine's alpha-association rule.
//!
//! The engine premultiplies with `c * a / 255` and demultiplies with
//! `c * 255 / a`, both truncating. A premultiply/demultiply round trip is
//! therefore lossy for translucent pixels: `(100, 50, 200, 150)` comes back as
//! `(98, 49, 198, 150)`.

use crate::{EngineError, Rgba};

/// How color components relate to the alpha channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphaMode {
    /// Components are already multiplied by alpha (alpha-associated).
    Premultiplied,
    /// Components are independent of alpha.
    Straight,
}

/// Premultiply one color using the engine's truncating rule.
#[allow(clippy::cast_possible_truncation)]
pub fn premultiply(c: Rgba) -> Rgba {
    let a = u16::from(c.a);
    let mul = |v: u8| -> u8 { ((u16::from(v) * a) / 255) as u8 };
    Rgba::new(mul(c.r), mul(c.g), mul(c.b), c.a)
}

/// Undo [`premultiply`] using the engine's truncating rule.
///
/// Fully transparent pixels demultiply to transparent black.
#[allow(clippy::cast_possible_truncation)]
pub fn demultiply(c: Rgba) -> Rgba {
    if c.a == 0 {
        return Rgba::TRANSPARENT;
    }
    let a = u16::from(c.a);
    let div = |v: u8| -> u8 { ((u16::from(v) * 255) / a).min(255) as u8 };
    Rgba::new(div(c.r), div(c.g), div(c.b), c.a)
}

/// Row-major RGBA8 image of `width * height` pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    alpha: AlphaMode,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA8 bytes.
    ///
    /// Fails when `data.len()` is not `width * height * 4`, or when that
    /// size is not addressable.
    pub fn new(
        width: u32,
        height: u32,
        alpha: AlphaMode,
        data: Vec<u8>,
    ) -> Result<Self, EngineError> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(EngineError::InvalidArgument(format!(
                "pixel buffer holds {} bytes, {width}x{height} RGBA8 needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            alpha,
            data,
        })
    }

    /// A buffer with every pixel set to `color` (stored as given).
    pub fn filled(
        width: u32,
        height: u32,
        alpha: AlphaMode,
        color: Rgba,
    ) -> Result<Self, EngineError> {
        let data = color
            .to_array()
            .iter()
            .copied()
            .cycle()
            .take(byte_len(width, height)?)
            .collect();
        Ok(Self {
            width,
            height,
            alpha,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha association of the stored components.
    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Stored components at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let i = self.offset(x, y)?;
        let px = self.data.get(i..i + 4)?;
        Some(Rgba::new(px[0], px[1], px[2], px[3]))
    }

    /// Overwrite the stored components at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(i) = self.offset(x, y) {
            if let Some(px) = self.data.get_mut(i..i + 4) {
                px.copy_from_slice(&color.to_array());
            }
        }
    }

    /// Copy with straight alpha. Returns a clone when already straight.
    pub fn to_straight(&self) -> Self {
        self.convert(AlphaMode::Straight, demultiply)
    }

    /// Copy with associated alpha. Returns a clone when already premultiplied.
    pub fn to_premultiplied(&self) -> Self {
        self.convert(AlphaMode::Premultiplied, premultiply)
    }

    fn convert(&self, target: AlphaMode, f: fn(Rgba) -> Rgba) -> Self {
        if self.alpha == target {
            return self.clone();
        }
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(4) {
            let c = f(Rgba::new(px[0], px[1], px[2], px[3]));
            px.copy_from_slice(&c.to_array());
        }
        Self {
            width: self.width,
            height: self.height,
            alpha: target,
            data,
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

fn byte_len(width: u32, height: u32) -> Result<usize, EngineError> {
    usize::try_from(width)
        .ok()
        .and_then(|w| w.checked_mul(usize::try_from(height).ok()?))
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| {
            EngineError::InvalidArgument(format!("{width}x{height} RGBA8 image is too large"))
        })
}
