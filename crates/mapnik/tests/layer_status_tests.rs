// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
mod common;

use std::collections::HashMap;

use mapnik::{Error, Map, NativeMap, RenderOpts, Rgba, Status};
use mapnik_mock::{LayerFixture, MapFixture, MockEngine};
use proptest::prelude::*;

fn a_out_b_in(layer: &str) -> Status {
    match layer {
        "layerA" => Status::Exclude,
        "layerB" => Status::Include,
        _ => Status::Default,
    }
}

#[test]
fn default_layer_status_is_unset() {
    let (_engine, map) = common::loaded_map();
    assert_eq!(map.stored_layer_status(), None);
    assert!(!map.has_layer_selection());
}

#[test]
fn current_status_reads_the_map() {
    let (_engine, map) = common::loaded_map();
    assert_eq!(map.current_layer_status(), vec![true, true, true, false]);
    assert_eq!(
        map.layer_names(),
        vec!["layerA", "layerB", "layerC", "layerD"]
    );
}

#[test]
fn store_captures_once() {
    let (_engine, mut map) = common::loaded_map();
    map.store_layer_status();
    assert_eq!(
        map.stored_layer_status(),
        Some(&[true, true, true, false][..])
    );

    // A later store must not overwrite the baseline.
    map.native_mut().set_layer_visible(0, false);
    map.store_layer_status();
    assert_eq!(
        map.stored_layer_status(),
        Some(&[true, true, true, false][..])
    );
}

#[test]
fn select_then_reset_restores_baseline() {
    let (_engine, mut map) = common::loaded_map();
    map.store_layer_status();
    map.reset_layer_status().unwrap();
    assert_eq!(map.stored_layer_status(), None);

    map.select_layers(&a_out_b_in);
    assert_eq!(
        map.stored_layer_status(),
        Some(&[true, true, true, false][..])
    );
    assert_eq!(map.current_layer_status(), vec![false, true, true, false]);
    assert!(map.has_layer_selection());

    map.reset_layers().unwrap();
    assert_eq!(map.stored_layer_status(), None);
    assert!(!map.has_layer_selection());
    assert_eq!(map.current_layer_status(), vec![true, true, true, false]);
}

#[test]
fn reset_without_snapshot_is_a_noop() {
    let (_engine, mut map) = common::loaded_map();
    map.reset_layers().unwrap();
    assert_eq!(map.current_layer_status(), vec![true, true, true, false]);
}

#[test]
fn default_keeps_current_not_stored_visibility() {
    let (_engine, mut map) = common::loaded_map();
    // layerD starts hidden and the selector has no opinion on it.
    map.select_layers(&|_: &str| Status::Default);
    assert_eq!(map.current_layer_status(), vec![true, true, true, false]);
    map.select_layers(&|name: &str| {
        if name == "layerD" {
            Status::Include
        } else {
            Status::Default
        }
    });
    assert_eq!(map.current_layer_status(), vec![true, true, true, true]);
}

#[test]
fn successive_selections_compose() {
    let (_engine, mut map) = common::loaded_map();
    map.select_layers(&a_out_b_in);
    map.select_layers(&|name: &str| {
        if name == "layerC" {
            Status::Exclude
        } else {
            Status::Default
        }
    });
    // layerA stays excluded from the first selection; no re-baselining.
    assert_eq!(map.current_layer_status(), vec![false, true, false, false]);
    assert_eq!(
        map.stored_layer_status(),
        Some(&[true, true, true, false][..])
    );

    map.reset_layers().unwrap();
    assert_eq!(map.current_layer_status(), vec![true, true, true, false]);
}

#[test]
fn selection_changes_rendered_output() {
    let (_engine, mut map) = common::loaded_map();
    map.zoom_all().unwrap();
    let opts = RenderOpts::default();

    let before = map.render_image(&opts).unwrap();
    assert_eq!(before.pixel(0, 0), Some(Rgba::new(255, 0, 0, 255)));
    assert_eq!(before.pixel(799, 0), Some(Rgba::new(0, 0, 255, 255)));

    map.select_layers(&a_out_b_in);
    let during = map.render_image(&opts).unwrap();
    assert_eq!(during.pixel(0, 0), Some(Rgba::TRANSPARENT));
    assert_eq!(during.pixel(799, 0), Some(Rgba::new(0, 0, 255, 255)));

    map.select_layers(&|name: &str| {
        if name == "layerD" {
            Status::Include
        } else {
            Status::Default
        }
    });
    let covered = map.render_image(&opts).unwrap();
    assert_eq!(covered.pixel(799, 0), Some(Rgba::new(0, 0, 0, 255)));

    map.reset_layers().unwrap();
    assert_eq!(map.render_image(&opts).unwrap(), before);
}

#[test]
fn selector_sees_every_layer_in_order() {
    let (_engine, mut map) = common::loaded_map();
    let seen = std::cell::RefCell::new(Vec::new());
    map.select_layers(&|name: &str| {
        seen.borrow_mut().push(name.to_owned());
        Status::Default
    });
    assert_eq!(
        seen.into_inner(),
        vec!["layerA", "layerB", "layerC", "layerD"]
    );
}

#[test]
fn load_discards_snapshot() {
    let (_engine, mut map) = common::loaded_map();
    map.select_layers(&a_out_b_in);
    map.load(common::fixture("map.json")).unwrap();
    assert_eq!(map.stored_layer_status(), None);
    assert_eq!(map.current_layer_status(), vec![true, true, true, false]);
}

#[test]
fn layer_count_change_is_reported_not_patched() {
    let (_engine, mut map) = common::loaded_map();
    map.select_layers(&a_out_b_in);
    assert_eq!(map.native_mut().remove_layer(3).as_deref(), Some("layerD"));

    let err = map.reset_layers().unwrap_err();
    assert!(matches!(
        err,
        Error::LayerCountChanged {
            stored: 4,
            current: 3
        }
    ));
    // Nothing was restored and the snapshot is still available.
    assert_eq!(map.current_layer_status(), vec![false, true, true]);
    assert_eq!(
        map.stored_layer_status(),
        Some(&[true, true, true, false][..])
    );
}

#[test]
fn map_without_layers_has_empty_status() {
    let engine = MockEngine::new();
    let mut map = Map::new(&engine).unwrap();
    assert!(map.current_layer_status().is_empty());
    map.select_layers(&a_out_b_in);
    assert_eq!(map.stored_layer_status(), Some(&[][..]));
    map.reset_layers().unwrap();
}

fn status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Default),
        Just(Status::Include),
        Just(Status::Exclude)
    ]
}

proptest! {
    #[test]
    fn selections_compose_and_reset_restores(
        initial in prop::collection::vec(any::<bool>(), 0..8),
        rounds in prop::collection::vec(prop::collection::vec(status(), 8), 1..4),
    ) {
        let fixture = initial.iter().enumerate().fold(MapFixture::default(), |f, (i, active)| {
            f.with_layer(LayerFixture::new(format!("l{i}")).active(*active))
        });
        let engine = MockEngine::new();
        let mut map = Map::new(&engine).unwrap();
        map.load_string(&fixture.to_json().unwrap(), ".").unwrap();

        let mut expected = initial.clone();
        for round in &rounds {
            let by_name: HashMap<String, Status> = round
                .iter()
                .enumerate()
                .map(|(i, s)| (format!("l{i}"), *s))
                .collect();
            map.select_layers(&|name: &str| by_name.get(name).copied().unwrap_or_default());
            for (flag, s) in expected.iter_mut().zip(round) {
                match s {
                    Status::Default => {}
                    Status::Include => *flag = true,
                    Status::Exclude => *flag = false,
                }
            }
            prop_assert_eq!(map.current_layer_status(), expected.clone());
            prop_assert_eq!(map.stored_layer_status(), Some(&initial[..]));
        }

        map.reset_layers().unwrap();
        prop_assert_eq!(map.current_layer_status(), initial);
        prop_assert_eq!(map.stored_layer_status(), None);
    }
}
