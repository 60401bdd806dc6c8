//! Score model — the playable tree the compiler produces, and the timing
//! rules that turn it into a sorted event list.

pub mod beat;
pub mod chord;
pub mod container;
pub mod context;
pub mod element;
pub mod event;
pub mod instrument;
pub mod pitch;
pub mod playable;

use std::fmt;

use serde::Serialize;

pub use beat::{is_valid_tempo, Beat};
pub use container::{ConfigurableContainer, ContainerSettings, Section, Track};
pub use context::PlayContext;
pub use element::{ChordElement, ElementOverrides, GroupElement, Note, NoteElement, RestElement};
pub use event::{sort_events, Event, EventAction, EventKind, EventStats, Payload};
pub use instrument::{InstrumentId, DRUM_CHANNEL};
pub use pitch::{BeatValue, PitchClass};
pub use playable::{Playable, PlayableKind};

/// Identity of a node in the playable tree, either assigned explicitly or
/// derived from the node's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayableId(String);

impl PlayableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_VOLUME: u8 = 100;

/// A compiled piece: a root playable plus the global tempo and volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub bpm: f64,
    pub volume: u8,
    /// Note value used where the source gives none.
    pub base_duration: BeatValue,
    pub root: Playable,
}

impl Score {
    pub fn new(root: impl Into<Playable>) -> Self {
        Self {
            bpm: DEFAULT_BPM,
            volume: DEFAULT_VOLUME,
            base_duration: BeatValue::QUARTER,
            root: root.into(),
        }
    }

    /// The context the root is evaluated in.
    pub fn context(&self) -> PlayContext {
        PlayContext::new(self.bpm, self.volume)
    }

    pub fn duration(&self) -> Beat {
        self.root.duration(&self.context())
    }

    /// Wall-clock length at the score's tempo.
    pub fn seconds(&self) -> f64 {
        self.duration().to_duration(self.bpm).as_secs_f64()
    }

    /// Every event of the piece, in playback order.
    pub fn events(&self) -> Vec<Event> {
        let mut events = self.root.generate_events(Beat::ZERO, &self.context());
        sort_events(&mut events);
        events
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score")?;
        writeln!(f, "  bpm: {}", self.bpm)?;
        writeln!(f, "  volume: {}", self.volume)?;
        writeln!(f, "  base duration: {}", self.base_duration)?;
        writeln!(
            f,
            "  duration: {} beats ({:.1}s)",
            self.duration(),
            self.seconds()
        )?;
        self.root.write_tree(f, 1, &self.context())
    }
}
