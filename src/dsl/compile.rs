//! Generator: lowers a parsed [`ScoreNode`] into a [`Score`].
//!
//! Global `set` blocks configure the score itself. Tracks and sections get
//! their own merged blocks applied through [`ConfigurableContainer`]. A key
//! whose merged value is a filled-in default is inherited from the parent
//! instead.
//! Parameter problems anywhere in the tree are collected and reported
//! together.

use tracing::debug;

use super::ast::*;
use super::error::{CompileError, Diagnostic};
use super::params::{resolve_blocks, ParamValue, ResolvedParams};
use crate::score::chord::{chord_pitches, parse_chord_name, NAMED_CHORD_OCTAVE};
use crate::score::instrument::MAX_INSTRUMENT;
use crate::score::{
    is_valid_tempo, BeatValue, ChordElement, ConfigurableContainer, GroupElement, InstrumentId,
    Note, NoteElement, Playable, RestElement, Score, Section, Track,
};

/// Name of the section that wraps several top-level items.
pub const IMPLICIT_ROOT: &str = "main";

/// Lower `ast` into a score.
pub fn generate(ast: &ScoreNode) -> Result<Score, CompileError> {
    let mut generator = Generator::default();
    let globals = generator.resolve(&ast.global_sets);
    let mut score = Score::new(Section::new(IMPLICIT_ROOT));
    generator.apply_globals(&mut score, &globals);

    let mut items: Vec<Playable> = ast
        .elements
        .iter()
        .filter_map(|node| generator.lower(node))
        .collect();

    if !generator.diagnostics.is_empty() {
        return Err(CompileError::Parameters(generator.diagnostics));
    }
    score.root = match items.len() {
        0 => return Err(CompileError::NoPlayables),
        1 => items.remove(0),
        _ => Section::new(IMPLICIT_ROOT).with_children(items).into(),
    };

    debug!(
        bpm = score.bpm,
        volume = score.volume,
        root = %score.root.id(),
        "score generated"
    );
    Ok(score)
}

struct Generator {
    base_duration: BeatValue,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            base_duration: BeatValue::QUARTER,
            diagnostics: Vec::new(),
        }
    }
}

impl Generator {
    fn resolve(&mut self, sets: &[SetNode]) -> ResolvedParams {
        let (params, mut diagnostics) = resolve_blocks(sets);
        self.diagnostics.append(&mut diagnostics);
        params
    }

    /// Global values apply whether declared or defaulted.
    fn apply_globals(&mut self, score: &mut Score, params: &ResolvedParams) {
        let pos = Position::default();

        if let Some(bpm) = params.value("BPM").and_then(ParamValue::as_float) {
            if is_valid_tempo(bpm) {
                score.bpm = bpm;
            } else {
                self.report(format!("BPM must be positive, got {bpm}"), pos);
            }
        }
        if let Some(value) = params.value("volume") {
            if let Some(volume) = self.volume(value, pos) {
                score.volume = volume;
            }
        }
        if let Some(text) = params.value("base_duration").and_then(ParamValue::as_str) {
            match BeatValue::parse(text) {
                Some(value) => {
                    score.base_duration = value;
                    self.base_duration = value;
                }
                None => self.report(format!("invalid base_duration '{text}'"), pos),
            }
        }
    }

    fn lower(&mut self, node: &PlayableNode) -> Option<Playable> {
        match node {
            PlayableNode::Note(n) => {
                let value = n.duration.unwrap_or(self.base_duration);
                self.note(n, value).map(|note| NoteElement::new(note).into())
            }
            PlayableNode::Chord(c) => self.chord(c).map(Playable::from),
            PlayableNode::Rest(r) => {
                Some(RestElement::new(r.duration.unwrap_or(self.base_duration)).into())
            }
            PlayableNode::Group(g) => {
                let children = g.elements.iter().filter_map(|e| self.lower(e)).collect();
                let group = GroupElement::new(children);
                // A quarter suffix is the default and sets no target.
                Some(match g.duration {
                    Some(value) if value != BeatValue::QUARTER => {
                        group.with_target(value.beats()).into()
                    }
                    _ => group.into(),
                })
            }
            PlayableNode::Track(body) => {
                let mut track = Track::new(&body.name);
                self.fill(&mut track, body);
                track.children = self.lower_all(&body.elements);
                Some(track.into())
            }
            PlayableNode::Section(body) => {
                let mut section = Section::new(&body.name);
                self.fill(&mut section, body);
                section.children = self.lower_all(&body.elements);
                Some(section.into())
            }
        }
    }

    fn lower_all(&mut self, nodes: &[PlayableNode]) -> Vec<Playable> {
        nodes.iter().filter_map(|n| self.lower(n)).collect()
    }

    /// Apply the declared values of a container's merged parameters.
    fn fill(&mut self, container: &mut impl ConfigurableContainer, body: &ContainerNode) {
        let params = self.resolve(&body.sets);
        let pos = body.pos;

        if let Some(value) = params.declared("volume") {
            if let Some(volume) = self.volume(value, pos) {
                container.set_volume(volume);
            }
        }
        if let Some(value) = params.declared("instrument") {
            let id = value
                .as_int()
                .and_then(|n| u16::try_from(n).ok())
                .and_then(InstrumentId::new);
            match id {
                Some(id) => container.set_instrument(id),
                None => self.report(
                    format!("instrument must be 0-{MAX_INSTRUMENT}, got {value} in '{}'", body.name),
                    pos,
                ),
            }
        }
        if let Some(value) = params.declared("channel") {
            match value.as_int().and_then(|n| u8::try_from(n).ok()) {
                Some(channel) => container.set_channel(channel),
                None => self.report(
                    format!("channel {value} is not a MIDI channel in '{}'", body.name),
                    pos,
                ),
            }
        }
    }

    fn volume(&mut self, value: &ParamValue, pos: Position) -> Option<u8> {
        let volume = value
            .as_int()
            .and_then(|n| u8::try_from(n).ok())
            .filter(|&v| v <= 127);
        if volume.is_none() {
            self.report(format!("volume must be 0-127, got {value}"), pos);
        }
        volume
    }

    fn note(&mut self, node: &NoteNode, value: BeatValue) -> Option<Note> {
        let note = Note::new(node.pitch, node.octave, value);
        if note.is_none() {
            self.report(
                format!("note {}{} is above the MIDI range", node.pitch, node.octave),
                node.pos,
            );
        }
        note
    }

    fn chord(&mut self, node: &ChordNode) -> Option<ChordElement> {
        let notes = match &node.content {
            ChordContent::Named(name) => {
                let value = node.duration.unwrap_or(self.base_duration);
                let Some((root, quality)) = parse_chord_name(name) else {
                    self.report(format!("unknown chord name '{name}'"), node.pos);
                    return None;
                };
                chord_pitches(root, NAMED_CHORD_OCTAVE, quality)
                    .into_iter()
                    .filter_map(|midi| Note::from_midi(midi, value))
                    .collect()
            }
            ChordContent::Notes(notes) => {
                let mut lowered = Vec::with_capacity(notes.len());
                for n in notes {
                    let value = node.duration.or(n.duration).unwrap_or(self.base_duration);
                    lowered.push(self.note(n, value)?);
                }
                lowered
            }
        };
        Some(ChordElement::new(notes))
    }

    fn report(&mut self, message: String, pos: Position) {
        self.diagnostics.push(Diagnostic::at(message, pos));
    }
}
