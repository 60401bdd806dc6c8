//! The playable tree: one closed enum over every node kind.

use std::fmt;

use super::beat::Beat;
use super::container::{ContainerSettings, Section, Track};
use super::context::PlayContext;
use super::element::{ChordElement, GroupElement, NoteElement, RestElement};
use super::event::Event;
use super::PlayableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayableKind {
    Note,
    Chord,
    Rest,
    Group,
    Section,
    Track,
}

impl PlayableKind {
    pub fn is_container(self) -> bool {
        matches!(self, PlayableKind::Section | PlayableKind::Track)
    }
}

/// Any node that takes time and produces events.
#[derive(Debug, Clone, PartialEq)]
pub enum Playable {
    Note(NoteElement),
    Chord(ChordElement),
    Rest(RestElement),
    Group(GroupElement),
    Section(Section),
    Track(Track),
}

impl Playable {
    pub fn id(&self) -> PlayableId {
        match self {
            Playable::Note(n) => n.id(),
            Playable::Chord(c) => c.id(),
            Playable::Rest(r) => r.id(),
            Playable::Group(g) => g.id(),
            Playable::Section(s) => s.id(),
            Playable::Track(t) => t.id(),
        }
    }

    pub fn kind(&self) -> PlayableKind {
        match self {
            Playable::Note(_) => PlayableKind::Note,
            Playable::Chord(_) => PlayableKind::Chord,
            Playable::Rest(_) => PlayableKind::Rest,
            Playable::Group(_) => PlayableKind::Group,
            Playable::Section(_) => PlayableKind::Section,
            Playable::Track(_) => PlayableKind::Track,
        }
    }

    /// Length in beats under `ctx`.
    pub fn duration(&self, ctx: &PlayContext) -> Beat {
        match self {
            Playable::Note(n) => n.duration(),
            Playable::Chord(c) => c.duration(),
            Playable::Rest(r) => r.duration(),
            Playable::Group(g) => g.duration(ctx),
            Playable::Section(s) => s.duration(ctx),
            Playable::Track(t) => t.duration(ctx),
        }
    }

    /// Events for this node starting at `start`, in absolute beats.
    pub fn generate_events(&self, start: Beat, ctx: &PlayContext) -> Vec<Event> {
        match self {
            Playable::Note(n) => n.generate_events(start, ctx),
            Playable::Chord(c) => c.generate_events(start, ctx),
            Playable::Rest(_) => Vec::new(),
            Playable::Group(g) => g.generate_events(start, ctx),
            Playable::Section(s) => s.generate_events(start, ctx),
            Playable::Track(t) => t.generate_events(start, ctx),
        }
    }

    pub fn children(&self) -> &[Playable] {
        match self {
            Playable::Group(g) => &g.children,
            Playable::Section(s) => &s.children,
            Playable::Track(t) => &t.children,
            _ => &[],
        }
    }

    /// Indented tree rendering, one node per line.
    pub fn write_tree(&self, f: &mut impl fmt::Write, depth: usize, ctx: &PlayContext) -> fmt::Result {
        let pad = "  ".repeat(depth);
        let beats = self.duration(ctx);
        match self {
            Playable::Note(n) => writeln!(
                f,
                "{pad}Note {}{} ({}) {} beats",
                n.note.pitch,
                n.note.octave,
                n.note.midi_number(),
                beats
            )?,
            Playable::Chord(c) => {
                let pitches: Vec<String> = c
                    .notes
                    .iter()
                    .map(|n| n.midi_number().to_string())
                    .collect();
                writeln!(f, "{pad}Chord [{}] {} beats", pitches.join(" "), beats)?
            }
            Playable::Rest(_) => writeln!(f, "{pad}Rest {beats} beats")?,
            Playable::Group(g) => match g.target {
                Some(target) => writeln!(f, "{pad}Group fitted to {target} beats")?,
                None => writeln!(f, "{pad}Group {beats} beats")?,
            },
            Playable::Section(s) => {
                writeln!(f, "{pad}Section '{}' {} beats", s.name, beats)?;
                write_settings(f, &pad, &s.settings)?;
            }
            Playable::Track(t) => {
                writeln!(f, "{pad}Track '{}' {} beats", t.name, beats)?;
                write_settings(f, &pad, &t.settings)?;
            }
        }
        for child in self.children() {
            child.write_tree(f, depth + 1, ctx)?;
        }
        Ok(())
    }
}

fn write_settings(
    f: &mut impl fmt::Write,
    pad: &str,
    settings: &ContainerSettings,
) -> fmt::Result {
    if let Some(bpm) = settings.bpm {
        writeln!(f, "{pad}  bpm: {bpm}")?;
    }
    if let Some(volume) = settings.volume {
        writeln!(f, "{pad}  volume: {volume}")?;
    }
    if let Some(instrument) = settings.instrument {
        writeln!(f, "{pad}  instrument: {instrument}")?;
    }
    if let Some(channel) = settings.channel {
        writeln!(f, "{pad}  channel: {channel}")?;
    }
    Ok(())
}

impl From<NoteElement> for Playable {
    fn from(n: NoteElement) -> Self {
        Playable::Note(n)
    }
}

impl From<ChordElement> for Playable {
    fn from(c: ChordElement) -> Self {
        Playable::Chord(c)
    }
}

impl From<RestElement> for Playable {
    fn from(r: RestElement) -> Self {
        Playable::Rest(r)
    }
}

impl From<GroupElement> for Playable {
    fn from(g: GroupElement) -> Self {
        Playable::Group(g)
    }
}

impl From<Section> for Playable {
    fn from(s: Section) -> Self {
        Playable::Section(s)
    }
}

impl From<Track> for Playable {
    fn from(t: Track) -> Self {
        Playable::Track(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::element::Note;
    use crate::score::pitch::{BeatValue, PitchClass};

    fn c4() -> Playable {
        NoteElement::new(Note::new(PitchClass::C, 4, BeatValue::QUARTER).unwrap()).into()
    }

    #[test]
    fn kinds_and_container_flag() {
        assert_eq!(c4().kind(), PlayableKind::Note);
        assert!(!c4().kind().is_container());
        let track: Playable = Track::new("t").into();
        assert!(track.kind().is_container());
        let group: Playable = GroupElement::new(vec![c4()]).into();
        assert!(!group.kind().is_container());
    }

    #[test]
    fn tree_rendering_nests_children() {
        let mut track = Track::new("lead");
        track.push(c4());
        let root: Playable = Section::new("main").with_children(vec![track.into()]).into();
        let mut out = String::new();
        root.write_tree(&mut out, 0, &PlayContext::default()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Section 'main' 1.000 beats");
        assert_eq!(lines[1], "  Track 'lead' 1.000 beats");
        assert_eq!(lines[2], "    Note C4 (60) 1.000 beats");
    }
}
