// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Native engine adapter for the mapnik binding.
//!
//! Mapnik is a C++ library; this crate talks to it through a thin C shim
//! (`libmapnik_c`) loaded at runtime with `libloading`. The shim exports the
//! functions listed below. Status-returning calls return `0` on success and
//! leave a message retrievable through the matching `*_last_error` call.
//! Strings returned by the shim are owned by it and stay valid until the next
//! call on the same object.
//!
//! | symbol | signature |
//! |---|---|
//! | `mapnik_version_string` | `() -> const char*` |
//! | `mapnik_register_datasources` | `(const char* dir) -> int` |
//! | `mapnik_register_fonts` | `(const char* dir) -> int` |
//! | `mapnik_map` | `(unsigned w, unsigned h) -> map*` |
//! | `mapnik_map_free` | `(map*)` |
//! | `mapnik_map_last_error` | `(map*) -> const char*` |
//! | `mapnik_map_load` | `(map*, const char* path) -> int` |
//! | `mapnik_map_load_string` | `(map*, const char* xml, const char* base) -> int` |
//! | `mapnik_map_zoom_all` | `(map*) -> int` |
//! | `mapnik_map_zoom_to_box` | `(map*, double, double, double, double)` |
//! | `mapnik_map_get_srs` / `mapnik_map_set_srs` | `(map*) -> const char*` / `(map*, const char*) -> int` |
//! | `mapnik_map_background` / `mapnik_map_set_background` | `(map*, uint8_t out[4])` / `(map*, uint8_t r, g, b, a)` |
//! | `mapnik_map_width` / `mapnik_map_height` | `(map*) -> unsigned` |
//! | `mapnik_map_resize` | `(map*, unsigned w, unsigned h)` |
//! | `mapnik_map_scale_denominator` | `(map*) -> double` |
//! | `mapnik_map_set_maximum_extent` | `(map*, double, double, double, double)` |
//! | `mapnik_map_reset_maximum_extent` | `(map*)` |
//! | `mapnik_map_layer_count` | `(map*) -> size_t` |
//! | `mapnik_map_layer_name` | `(map*, size_t) -> const char*` |
//! | `mapnik_map_layer_is_active` / `mapnik_map_layer_set_active` | `(map*, size_t) -> int` / `(map*, size_t, int)` |
//! | `mapnik_map_render_to_file` | `(map*, const char* path, unsigned w, unsigned h, double scale, double denom, const char* fmt) -> int` |
//! | `mapnik_map_render_to_image` | `(map*, unsigned w, unsigned h, double scale, double denom) -> image*` |
//! | `mapnik_image_from_raw` | `(const uint8_t* rgba, unsigned w, unsigned h) -> image*` |
//! | `mapnik_image_free` | `(image*)` |
//! | `mapnik_image_last_error` | `(image*) -> const char*` |
//! | `mapnik_image_to_raw` | `(image*, size_t* len) -> const uint8_t*` |
//! | `mapnik_image_to_blob` | `(image*, const char* fmt) -> blob*` |
//! | `mapnik_image_blob_free` | `(blob*)` |
//!
//! A scale denominator of `0.0` asks the engine to derive it from the extent.
//! Raw image data is premultiplied RGBA8, row-major.
#![allow(unsafe_code)]

mod api;
mod engine;
mod map;

pub use engine::{DylibEngine, DylibError, LIBRARY_ENV};
pub use map::DylibMap;
