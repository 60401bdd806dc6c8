//! Leaf elements (note, chord, rest) and the group element.

use super::beat::Beat;
use super::context::PlayContext;
use super::event::{Event, EventKind};
use super::instrument::{InstrumentId, DRUM_CHANNEL};
use super::pitch::{BeatValue, PitchClass};
use super::playable::Playable;
use super::PlayableId;

/// A pitched note as written: pitch, octave and note value.
///
/// Velocity and channel may be embedded in the note itself; when absent the
/// play context supplies them.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub pitch: PitchClass,
    pub octave: u8,
    pub value: BeatValue,
    pub velocity: Option<u8>,
    pub channel: Option<u8>,
    midi: u8,
}

impl Note {
    /// `None` when the pitch falls outside the MIDI range.
    pub fn new(pitch: PitchClass, octave: u8, value: BeatValue) -> Option<Self> {
        let midi = pitch.midi_number(octave)?;
        Some(Self {
            pitch,
            octave,
            value,
            velocity: None,
            channel: None,
            midi,
        })
    }

    /// A note from a raw MIDI number, spelled with sharps.
    pub fn from_midi(midi: u8, value: BeatValue) -> Option<Self> {
        if midi > 127 || midi < 12 {
            return None;
        }
        let pitch = PitchClass::from_semitone(midi % 12);
        Self::new(pitch, midi / 12 - 1, value)
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn midi_number(&self) -> u8 {
        self.midi
    }

    pub fn beats(&self) -> Beat {
        self.value.beats()
    }

    fn spelled(&self) -> String {
        format!("{}{}", self.pitch.name().replace('#', "s"), self.octave)
    }
}

/// Per-element settings that win over both the note and the context.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementOverrides {
    pub volume: Option<u8>,
    pub instrument: Option<InstrumentId>,
    pub channel: Option<u8>,
}

impl ElementOverrides {
    fn velocity(&self, note: &Note, ctx: &PlayContext) -> u8 {
        self.volume.or(note.velocity).unwrap_or(ctx.volume)
    }

    fn channel(&self, note: &Note, ctx: &PlayContext) -> u8 {
        if let Some(channel) = self.channel {
            return channel;
        }
        if self.instrument.is_some_and(InstrumentId::is_drum_kit) {
            return DRUM_CHANNEL;
        }
        note.channel.unwrap_or(ctx.channel)
    }

    fn note_on(
        &self,
        note: &Note,
        start: Beat,
        duration: Beat,
        kind: EventKind,
        ctx: &PlayContext,
        source: &PlayableId,
    ) -> [Event; 2] {
        let on = Event::note_on(
            start,
            duration,
            kind,
            note.midi_number(),
            self.channel(note, ctx),
            self.velocity(note, ctx),
            source.clone(),
        );
        let off = Event::note_off_for(&on);
        [on, off]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteElement {
    pub id: Option<PlayableId>,
    pub note: Note,
    pub overrides: ElementOverrides,
}

impl NoteElement {
    pub fn new(note: Note) -> Self {
        Self {
            id: None,
            note,
            overrides: ElementOverrides::default(),
        }
    }

    pub fn id(&self) -> PlayableId {
        self.id.clone().unwrap_or_else(|| {
            PlayableId::new(format!(
                "note_{}_{}_{:.2}",
                self.note.pitch.name().replace('#', "s"),
                self.note.octave,
                self.note.beats().as_beats_f64()
            ))
        })
    }

    pub fn duration(&self) -> Beat {
        self.note.beats()
    }

    pub fn generate_events(&self, start: Beat, ctx: &PlayContext) -> Vec<Event> {
        self.overrides
            .note_on(
                &self.note,
                start,
                self.duration(),
                EventKind::Note,
                ctx,
                &self.id(),
            )
            .into()
    }
}

/// Several notes sounding together. All notes are assumed to share the
/// first note's value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordElement {
    pub id: Option<PlayableId>,
    pub notes: Vec<Note>,
    pub overrides: ElementOverrides,
}

impl ChordElement {
    pub fn new(notes: Vec<Note>) -> Self {
        Self {
            id: None,
            notes,
            overrides: ElementOverrides::default(),
        }
    }

    pub fn id(&self) -> PlayableId {
        self.id.clone().unwrap_or_else(|| {
            let spelled: Vec<String> = self.notes.iter().map(Note::spelled).collect();
            PlayableId::new(format!(
                "chord_{}_{:.2}",
                spelled.join("_"),
                self.duration().as_beats_f64()
            ))
        })
    }

    pub fn duration(&self) -> Beat {
        self.notes.first().map_or(Beat::ZERO, Note::beats)
    }

    pub fn generate_events(&self, start: Beat, ctx: &PlayContext) -> Vec<Event> {
        let id = self.id();
        let duration = self.duration();
        self.notes
            .iter()
            .flat_map(|note| {
                self.overrides
                    .note_on(note, start, duration, EventKind::Chord, ctx, &id)
            })
            .collect()
    }
}

/// Silence for one note value.
#[derive(Debug, Clone, PartialEq)]
pub struct RestElement {
    pub id: Option<PlayableId>,
    pub value: BeatValue,
}

impl RestElement {
    pub fn new(value: BeatValue) -> Self {
        Self { id: None, value }
    }

    pub fn id(&self) -> PlayableId {
        self.id.clone().unwrap_or_else(|| {
            PlayableId::new(format!("rest_{:.2}", self.value.beats().as_beats_f64()))
        })
    }

    pub fn duration(&self) -> Beat {
        self.value.beats()
    }
}

/// A run of children played back to back.
///
/// With a target duration the children are squeezed or stretched to fit it,
/// each keeping its share of the natural total. Without one the group plays
/// like an anonymous section.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupElement {
    pub id: Option<PlayableId>,
    pub children: Vec<Playable>,
    pub target: Option<Beat>,
}

impl GroupElement {
    pub fn new(children: Vec<Playable>) -> Self {
        Self {
            id: None,
            children,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Beat) -> Self {
        self.target = Some(target);
        self
    }

    pub fn id(&self) -> PlayableId {
        self.id
            .clone()
            .unwrap_or_else(|| PlayableId::new(format!("group_{}_elements", self.children.len())))
    }

    fn natural_duration(&self, ctx: &PlayContext) -> Beat {
        self.children.iter().map(|c| c.duration(ctx)).sum()
    }

    pub fn duration(&self, ctx: &PlayContext) -> Beat {
        self.target.unwrap_or_else(|| self.natural_duration(ctx))
    }

    pub fn generate_events(&self, start: Beat, ctx: &PlayContext) -> Vec<Event> {
        let natural = self.natural_duration(ctx);
        let target = match self.target {
            Some(target) if target != natural && !natural.is_zero() => target,
            _ => return sequential(&self.children, start, ctx),
        };

        // Lay the children out at natural time from zero, then map every
        // offset through target/natural. Note-off times are scaled from their
        // own offsets, so durations are recomputed to keep pairs aligned.
        let mut events = sequential(&self.children, Beat::ZERO, ctx);
        for event in &mut events {
            let on_offset = event.time;
            let off_offset = on_offset + event.duration;
            event.time = start + on_offset.scale(target, natural);
            event.duration = off_offset.scale(target, natural) - on_offset.scale(target, natural);
        }
        events
    }
}

/// Events of `children` placed one after another from `start`.
pub(crate) fn sequential(children: &[Playable], start: Beat, ctx: &PlayContext) -> Vec<Event> {
    let mut events = Vec::new();
    let mut cursor = start;
    for child in children {
        events.extend(child.generate_events(cursor, ctx));
        cursor = cursor + child.duration(ctx);
    }
    events
}
