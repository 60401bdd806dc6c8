//! Play context — the settings a node inherits from its ancestors.

use std::collections::HashSet;
use std::sync::Arc;

use super::instrument::InstrumentId;
use super::PlayableId;

/// Snapshot of the current tempo, volume, instrument and channel, plus the
/// identities of the containers currently being expanded.
///
/// Contexts are never mutated in place: each container derives a fresh one
/// for its children. The ancestor set is shared until a container adds
/// itself, at which point it is copied.
#[derive(Debug, Clone)]
pub struct PlayContext {
    pub bpm: f64,
    pub volume: u8,
    pub instrument: InstrumentId,
    pub channel: u8,
    ancestors: Arc<HashSet<PlayableId>>,
}

impl PlayContext {
    pub fn new(bpm: f64, volume: u8) -> Self {
        Self {
            bpm,
            volume,
            instrument: InstrumentId::ACOUSTIC_GRAND_PIANO,
            channel: 0,
            ancestors: Arc::default(),
        }
    }

    /// Whether `id` is already being expanded further up the tree.
    pub fn is_ancestor(&self, id: &PlayableId) -> bool {
        self.ancestors.contains(id)
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Context for the children of container `id`, or `None` if `id` is
    /// already an ancestor.
    pub fn enter(&self, id: &PlayableId) -> Option<PlayContext> {
        if self.is_ancestor(id) {
            return None;
        }
        let mut child = self.clone();
        Arc::make_mut(&mut child.ancestors).insert(id.clone());
        Some(child)
    }
}

impl Default for PlayContext {
    fn default() -> Self {
        Self::new(120.0, 100)
    }
}
