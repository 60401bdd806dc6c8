//! Events produced by the playable tree, and the total order used to play
//! them back.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::beat::Beat;
use super::instrument::InstrumentId;
use super::PlayableId;

/// What kind of node produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Note,
    Chord,
    Control,
}

/// The instruction an event carries.
///
/// Variant order is the tie-break order at equal time: control changes land
/// before the notes they affect, and a note-on precedes a note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    ProgramChange,
    VolumeChange,
    NoteOn,
    NoteOff,
}

impl EventAction {
    pub fn label(self) -> &'static str {
        match self {
            EventAction::ProgramChange => "PROGRAM_CHANGE",
            EventAction::VolumeChange => "VOLUME_CHANGE",
            EventAction::NoteOn => "NOTE_ON",
            EventAction::NoteOff => "NOTE_OFF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// MIDI note number.
    Pitch(u8),
    Instrument(InstrumentId),
    /// 0-127, sent as controller 7.
    Volume(u8),
}

/// A single instruction on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Absolute position in beats.
    pub time: Beat,
    /// Length of the note for note-ons, zero otherwise.
    pub duration: Beat,
    pub kind: EventKind,
    pub action: EventAction,
    pub payload: Payload,
    pub channel: u8,
    pub velocity: u8,
    pub source: PlayableId,
}

impl Event {
    pub fn note_on(
        time: Beat,
        duration: Beat,
        kind: EventKind,
        pitch: u8,
        channel: u8,
        velocity: u8,
        source: PlayableId,
    ) -> Self {
        Self {
            time,
            duration,
            kind,
            action: EventAction::NoteOn,
            payload: Payload::Pitch(pitch),
            channel,
            velocity,
            source,
        }
    }

    /// The note-off that ends `on`, at `on.time + on.duration`.
    pub fn note_off_for(on: &Event) -> Self {
        Self {
            time: on.time + on.duration,
            duration: Beat::ZERO,
            action: EventAction::NoteOff,
            velocity: 0,
            ..on.clone()
        }
    }

    pub fn program_change(
        time: Beat,
        instrument: InstrumentId,
        channel: u8,
        source: PlayableId,
    ) -> Self {
        Self {
            time,
            duration: Beat::ZERO,
            kind: EventKind::Control,
            action: EventAction::ProgramChange,
            payload: Payload::Instrument(instrument),
            channel,
            velocity: 0,
            source,
        }
    }

    pub fn volume_change(time: Beat, volume: u8, channel: u8, source: PlayableId) -> Self {
        Self {
            time,
            duration: Beat::ZERO,
            kind: EventKind::Control,
            action: EventAction::VolumeChange,
            payload: Payload::Volume(volume),
            channel,
            velocity: 0,
            source,
        }
    }

    pub fn pitch(&self) -> Option<u8> {
        match self.payload {
            Payload::Pitch(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>8}] {:<14} ch {:>2}",
            self.time.to_string(),
            self.action.label(),
            self.channel
        )?;
        match self.payload {
            Payload::Pitch(p) => write!(f, " pitch {p:>3} vel {:>3}", self.velocity)?,
            Payload::Instrument(i) => write!(f, " instrument {i}")?,
            Payload::Volume(v) => write!(f, " volume {v}")?,
        }
        if !self.duration.is_zero() {
            write!(f, " dur {}", self.duration)?;
        }
        write!(f, " src {}", self.source)
    }
}

/// Total order on events: time, then action, then source identity.
pub fn compare_events(a: &Event, b: &Event) -> Ordering {
    a.time
        .cmp(&b.time)
        .then(a.action.cmp(&b.action))
        .then_with(|| a.source.cmp(&b.source))
}

/// Sort events into playback order. The sort is stable, so events that tie on
/// every key keep their generation order.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(compare_events);
}

/// Summary counts over an event list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStats {
    pub note_ons: usize,
    pub note_offs: usize,
    pub program_changes: usize,
    pub volume_changes: usize,
    pub distinct_pitches: BTreeSet<u8>,
    pub first: Option<Beat>,
    pub last: Option<Beat>,
}

impl EventStats {
    pub fn from_events(events: &[Event]) -> Self {
        let mut stats = Self::default();
        for event in events {
            match event.action {
                EventAction::NoteOn => stats.note_ons += 1,
                EventAction::NoteOff => stats.note_offs += 1,
                EventAction::ProgramChange => stats.program_changes += 1,
                EventAction::VolumeChange => stats.volume_changes += 1,
            }
            if let Some(p) = event.pitch() {
                stats.distinct_pitches.insert(p);
            }
            stats.first = Some(stats.first.map_or(event.time, |t| t.min(event.time)));
            stats.last = Some(stats.last.map_or(event.time, |t| t.max(event.time)));
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.note_ons + self.note_offs + self.program_changes + self.volume_changes
    }

    /// Beats between the first and last event.
    pub fn span(&self) -> Beat {
        match (self.first, self.last) {
            (Some(first), Some(last)) => last - first,
            _ => Beat::ZERO,
        }
    }
}

impl fmt::Display for EventStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "events: {}", self.total())?;
        writeln!(
            f,
            "  note on/off: {}/{}",
            self.note_ons, self.note_offs
        )?;
        writeln!(
            f,
            "  program/volume changes: {}/{}",
            self.program_changes, self.volume_changes
        )?;
        writeln!(f, "  distinct pitches: {}", self.distinct_pitches.len())?;
        write!(f, "  span: {} beats", self.span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(beats: f64, pitch: u8, src: &str) -> Event {
        Event::note_on(
            Beat::from_beats_f64(beats),
            Beat::from_beats(1),
            EventKind::Note,
            pitch,
            0,
            100,
            PlayableId::new(src),
        )
    }

    #[test]
    fn note_off_mirrors_note_on() {
        let e = on(2.0, 60, "n");
        let off = Event::note_off_for(&e);
        assert_eq!(off.time, Beat::from_beats(3));
        assert_eq!(off.action, EventAction::NoteOff);
        assert_eq!(off.payload, e.payload);
        assert_eq!(off.channel, e.channel);
        assert_eq!(off.source, e.source);
        assert_eq!(off.duration, Beat::ZERO);
    }

    #[test]
    fn time_is_primary_key() {
        let mut events = vec![on(2.0, 62, "b"), on(0.0, 60, "a"), on(1.0, 61, "c")];
        sort_events(&mut events);
        let pitches: Vec<u8> = events.iter().filter_map(Event::pitch).collect();
        assert_eq!(pitches, vec![60, 61, 62]);
    }

    #[test]
    fn note_on_sorts_before_note_off_at_equal_time() {
        let first = on(0.0, 60, "z");
        let off = Event::note_off_for(&first);
        let next = on(1.0, 62, "a");
        let mut events = vec![off.clone(), next.clone()];
        sort_events(&mut events);
        assert_eq!(events[0].action, EventAction::NoteOn);
        assert_eq!(events[1].action, EventAction::NoteOff);

        // independent of input order and source ids
        let mut events = vec![next, off];
        sort_events(&mut events);
        assert_eq!(events[0].action, EventAction::NoteOn);
    }

    #[test]
    fn control_changes_precede_notes() {
        let note = on(0.0, 60, "a");
        let program =
            Event::program_change(Beat::ZERO, InstrumentId(40), 0, PlayableId::new("z"));
        let mut events = vec![note, program];
        sort_events(&mut events);
        assert_eq!(events[0].action, EventAction::ProgramChange);
    }

    #[test]
    fn source_breaks_remaining_ties() {
        let mut events = vec![on(0.0, 64, "note_E"), on(0.0, 60, "note_C")];
        sort_events(&mut events);
        assert_eq!(events[0].source.as_str(), "note_C");
    }

    #[test]
    fn stats_count_actions_and_span() {
        let a = on(0.0, 60, "a");
        let b = on(1.0, 64, "b");
        let events = vec![
            a.clone(),
            Event::note_off_for(&a),
            b.clone(),
            Event::note_off_for(&b),
            Event::volume_change(Beat::ZERO, 90, 0, PlayableId::new("s")),
        ];
        let stats = EventStats::from_events(&events);
        assert_eq!(stats.note_ons, 2);
        assert_eq!(stats.note_offs, 2);
        assert_eq!(stats.volume_changes, 1);
        assert_eq!(stats.total(), 5);
        assert_eq!(stats.distinct_pitches.len(), 2);
        assert_eq!(stats.span(), Beat::from_beats(2));
    }

    #[test]
    fn display_shows_action_and_source() {
        let line = on(1.0, 60, "note_C_4_1.00").to_string();
        assert!(line.contains("NOTE_ON"));
        assert!(line.contains("pitch  60"));
        assert!(line.ends_with("src note_C_4_1.00"));
    }
}
