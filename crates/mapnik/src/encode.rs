// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Standalone image encoding through the engine's codecs.

use mapnik_port::{Engine, PixelBuffer};
use tracing::{debug, instrument};

use crate::Error;

/// Encode `image` as `format` without involving a map.
///
/// Premultiplied buffers are demultiplied by the engine before encoding.
/// The format is passed through unchanged; an empty or unknown format is an
/// [`Error::Encode`].
#[instrument(skip(engine, image), fields(width = image.width(), height = image.height()))]
pub fn encode<E: Engine>(engine: &E, image: &PixelBuffer, format: &str) -> Result<Vec<u8>, Error> {
    let bytes = engine
        .encode_pixels(image, format)
        .map_err(|e| Error::encode(&e))?;
    debug!(bytes = bytes.len(), "encoded");
    Ok(bytes)
}
