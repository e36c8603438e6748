// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Layer visibility: snapshot, selection and restore.
//!
//! # State machine
//!
//! ```text
//!            store / select                 select
//!   Empty ────────────────────▶ Stored ─────────────▶ Applied ◀─┐
//!     ▲                           │                     │  select
//!     └──────── reset ────────────┴──────── reset ──────┴───────┘
//! ```
//!
//! The snapshot is captured once and survives repeated selections, so a
//! reset always returns to the visibility the map had before the first
//! selection. Selections compose: [`Status::Default`] keeps whatever the layer
//! currently shows, including an override from an earlier selection.

use mapnik_port::NativeMap;
use tracing::{debug, warn};

use crate::{Error, Map};

/// Verdict of a [`LayerSelector`] for one layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Keep the layer's current visibility.
    #[default]
    Default,
    /// Show the layer.
    Include,
    /// Hide the layer.
    Exclude,
}

/// Caller-defined layer inclusion policy.
///
/// Implemented for every `Fn(&str) -> Status`, so closures work directly.
pub trait LayerSelector {
    /// Decide the visibility of the layer named `layer`.
    fn select(&self, layer: &str) -> Status;
}

impl<F> LayerSelector for F
where
    F: Fn(&str) -> Status,
{
    fn select(&self, layer: &str) -> Status {
        self(layer)
    }
}

/// Stored visibility baseline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum LayerState {
    /// No snapshot.
    #[default]
    Empty,
    /// Snapshot captured, no selection applied yet.
    Stored(Vec<bool>),
    /// Snapshot captured and at least one selection applied since.
    Applied(Vec<bool>),
}

impl LayerState {
    pub(crate) fn snapshot(&self) -> Option<&[bool]> {
        match self {
            Self::Empty => None,
            Self::Stored(flags) | Self::Applied(flags) => Some(flags),
        }
    }

    /// Remove and return the snapshot, leaving `Empty`.
    pub(crate) fn take(&mut self) -> Option<Vec<bool>> {
        match std::mem::take(self) {
            Self::Empty => None,
            Self::Stored(flags) | Self::Applied(flags) => Some(flags),
        }
    }

    fn mark_applied(&mut self) {
        if let Self::Stored(flags) = self {
            *self = Self::Applied(std::mem::take(flags));
        }
    }
}

impl<N: NativeMap> Map<N> {
    /// Live visibility of every layer, in layer order. Never cached.
    pub fn current_layer_status(&self) -> Vec<bool> {
        let count = self.native.layer_names().len();
        (0..count).map(|i| self.native.layer_visible(i)).collect()
    }

    /// Capture the current visibility as the baseline, unless one is
    /// already stored.
    pub fn store_layer_status(&mut self) {
        if self.layers.snapshot().is_none() {
            let flags = self.current_layer_status();
            debug!(?flags, "stored layer visibility");
            self.layers = LayerState::Stored(flags);
        }
    }

    /// Restore the stored baseline and discard it. No-op without a baseline.
    ///
    /// Fails with [`Error::LayerCountChanged`] if the native layer list no
    /// longer matches the snapshot; visibility and snapshot are then left
    /// untouched.
    pub fn reset_layer_status(&mut self) -> Result<(), Error> {
        let Some(stored) = self.layers.snapshot() else {
            return Ok(());
        };
        let current = self.native.layer_names().len();
        if stored.len() != current {
            warn!(stored = stored.len(), current, "layer list changed since visibility was stored");
            return Err(Error::LayerCountChanged {
                stored: stored.len(),
                current,
            });
        }
        let flags = self.layers.take().unwrap_or_default();
        for (index, visible) in flags.iter().copied().enumerate() {
            self.native.set_layer_visible(index, visible);
        }
        debug!(?flags, "restored layer visibility");
        Ok(())
    }

    /// Apply `selector` to every layer.
    ///
    /// The baseline is stored first if none exists. [`Status::Exclude`] hides
    /// and [`Status::Include`] shows a layer; [`Status::Default`] leaves its
    /// current visibility alone.
    pub fn select_layers<S>(&mut self, selector: &S)
    where
        S: LayerSelector + ?Sized,
    {
        self.store_layer_status();
        for (index, name) in self.native.layer_names().iter().enumerate() {
            match selector.select(name) {
                Status::Default => {}
                Status::Include => self.native.set_layer_visible(index, true),
                Status::Exclude => self.native.set_layer_visible(index, false),
            }
        }
        self.layers.mark_applied();
    }

    /// Undo all selections since the baseline was stored. Alias for
    /// [`reset_layer_status`](Self::reset_layer_status).
    pub fn reset_layers(&mut self) -> Result<(), Error> {
        self.reset_layer_status()
    }

    /// The stored baseline, if any.
    pub fn stored_layer_status(&self) -> Option<&[bool]> {
        self.layers.snapshot()
    }

    /// True once [`select_layers`](Self::select_layers) has run since the
    /// last reset.
    pub fn has_layer_selection(&self) -> bool {
        matches!(self.layers, LayerState::Applied(_))
    }
}
