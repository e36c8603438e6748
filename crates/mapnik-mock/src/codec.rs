// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Format-string dispatch onto real PNG/JPEG codecs.
//!
//! Vocabulary (anything after `:` is accepted and ignored):
//!
//! | format | output |
//! |---|---|
//! | `png`, `png24`, `png32` | RGBA8 PNG, lossless |
//! | `png8`, `png256` | indexed PNG with tRNS, exact up to 256 colors |
//! | `jpeg`, `jpegNN` | baseline JPEG at quality NN (default 85), alpha dropped |

use std::collections::HashMap;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use mapnik_port::{EngineError, PixelBuffer};

const DEFAULT_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Png,
    Palette,
    Jpeg(u8),
}

fn parse(format: &str) -> Option<Codec> {
    let kind = format.split_once(':').map_or(format, |(kind, _)| kind);
    match kind {
        "png" | "png24" | "png32" => Some(Codec::Png),
        "png8" | "png256" => Some(Codec::Palette),
        "jpeg" => Some(Codec::Jpeg(DEFAULT_JPEG_QUALITY)),
        _ => {
            let quality = kind.strip_prefix("jpeg")?.parse::<u8>().ok()?;
            (1..=100).contains(&quality).then_some(Codec::Jpeg(quality))
        }
    }
}

/// Encode `image` as `format`. Premultiplied input is demultiplied first.
pub(crate) fn encode(image: &PixelBuffer, format: &str) -> Result<Vec<u8>, EngineError> {
    let codec =
        parse(format).ok_or_else(|| EngineError::Native(format!("unknown file type: {format}")))?;
    let straight = image.to_straight();
    match codec {
        Codec::Png => encode_png(&straight),
        Codec::Palette => encode_palette(&straight),
        Codec::Jpeg(quality) => encode_jpeg(&straight, quality),
    }
}

fn encode_png(image: &PixelBuffer) -> Result<Vec<u8>, EngineError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            image.data(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(native)?;
    Ok(out)
}

fn encode_jpeg(image: &PixelBuffer, quality: u8) -> Result<Vec<u8>, EngineError> {
    let rgb: Vec<u8> = image
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(&rgb, image.width(), image.height(), ExtendedColorType::Rgb8)
        .map_err(native)?;
    Ok(out)
}

fn encode_palette(image: &PixelBuffer) -> Result<Vec<u8>, EngineError> {
    let (palette, indices) = quantize(image.data());
    let rgb: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(rgb);
        encoder.set_trns(trns);
        let mut writer = encoder.write_header().map_err(native)?;
        writer.write_image_data(&indices).map_err(native)?;
        writer.finish().map_err(native)?;
    }
    Ok(out)
}

/// Exact palette when the image has at most 256 colors, otherwise a uniform
/// four-level-per-channel palette.
fn quantize(data: &[u8]) -> (Vec<[u8; 4]>, Vec<u8>) {
    if let Some(exact) = index_exact(data, |c| c) {
        return exact;
    }
    // 4^4 levels always fit in 256 entries.
    let reduce = |c: [u8; 4]| c.map(|v| (v >> 6) * 85);
    index_exact(data, reduce).unwrap_or_default()
}

fn index_exact(data: &[u8], map: impl Fn([u8; 4]) -> [u8; 4]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut palette: Vec<[u8; 4]> = Vec::new();
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
    let mut indices = Vec::with_capacity(data.len() / 4);
    for px in data.chunks_exact(4) {
        let color = map([px[0], px[1], px[2], px[3]]);
        let index = match lookup.get(&color) {
            Some(&i) => i,
            None => {
                let i = u8::try_from(palette.len()).ok()?;
                palette.push(color);
                lookup.insert(color, i);
                i
            }
        };
        indices.push(index);
    }
    Some((palette, indices))
}

fn native(err: impl std::fmt::Display) -> EngineError {
    EngineError::Native(err.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mapnik_port::{AlphaMode, Rgba};

    #[test]
    fn format_vocabulary() {
        assert_eq!(parse("png"), Some(Codec::Png));
        assert_eq!(parse("png24"), Some(Codec::Png));
        assert_eq!(parse("png256:m=h"), Some(Codec::Palette));
        assert_eq!(parse("png8:c=64:t=0"), Some(Codec::Palette));
        assert_eq!(parse("jpeg"), Some(Codec::Jpeg(85)));
        assert_eq!(parse("jpeg80"), Some(Codec::Jpeg(80)));
        assert_eq!(parse("jpeg0"), None);
        assert_eq!(parse("jpegxl"), None);
        assert_eq!(parse("invalidformat"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn unknown_format_is_an_error_not_empty_output() {
        let img = PixelBuffer::filled(2, 2, AlphaMode::Straight, Rgba::new(1, 2, 3, 255)).unwrap();
        let err = encode(&img, "invalid").unwrap_err();
        assert_eq!(err, EngineError::Native("unknown file type: invalid".into()));
    }

    #[test]
    fn palette_falls_back_to_uniform_levels() {
        let data: Vec<u8> = (0..=255u8).flat_map(|v| [v, 255 - v, v / 2, 255]).collect();
        let (mut palette, indices) = quantize(&[data.clone(), vec![7, 7, 7, 7]].concat());
        assert!(palette.len() <= 256);
        assert_eq!(indices.len(), 257);
        palette.sort_unstable();
        palette.dedup();
        assert!(palette.iter().all(|c| c.iter().all(|v| v % 85 == 0)));
    }

    #[test]
    fn small_images_get_exact_palettes() {
        let data = [1, 2, 3, 4, 1, 2, 3, 4, 5, 6, 7, 8];
        let (palette, indices) = quantize(&data);
        assert_eq!(palette, vec![[1, 2, 3, 4], [5, 6, 7, 8]]);
        assert_eq!(indices, vec![0, 0, 1]);
    }
}
