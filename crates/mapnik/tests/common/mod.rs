// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::path::PathBuf;

use mapnik::Map;
use mapnik_mock::{MockEngine, MockMap};

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Engine plus a map with `fixtures/map.json` loaded.
///
/// Layers: `layerA` (west half, red), `layerB` (east half, blue),
/// `layerC` (center, translucent green), `layerD` (hidden, black, whole world).
pub fn loaded_map() -> (MockEngine, Map<MockMap>) {
    init_tracing();
    let engine = MockEngine::new();
    let mut map = Map::new(&engine).expect("allocate map");
    map.load(fixture("map.json")).expect("load fixture");
    (engine, map)
}
