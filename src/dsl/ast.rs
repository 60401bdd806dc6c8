//! Abstract syntax tree for the catrock language.
//!
//! The parser builds these once; the generator only reads them. Every node
//! carries the position of its first token.

use std::fmt;

use crate::score::{BeatValue, PitchClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A complete source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreNode {
    pub global_sets: Vec<SetNode>,
    pub elements: Vec<PlayableNode>,
    pub pos: Position,
}

/// Which kind of block a `set` appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Track,
    Section,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Global => "global",
            Scope::Track => "track",
            Scope::Section => "section",
        })
    }
}

/// A `set` value exactly as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Integer(u64),
    Fraction { num: u64, den: u64 },
    /// A bare word, taken as a string.
    Ident(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Integer(n) => write!(f, "{n}"),
            RawValue::Fraction { num, den } => write!(f, "{num}/{den}"),
            RawValue::Ident(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetEntry {
    pub key: String,
    pub value: RawValue,
    pub pos: Position,
}

/// A `set { key: value ... }` block, entries in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct SetNode {
    pub scope: Scope,
    pub entries: Vec<SetEntry>,
    pub pos: Position,
}

impl SetNode {
    pub fn new(scope: Scope, pos: Position) -> Self {
        Self {
            scope,
            entries: Vec::new(),
            pos,
        }
    }

    pub fn with_entry(mut self, key: &str, value: RawValue) -> Self {
        self.entries.push(SetEntry {
            key: key.to_string(),
            value,
            pos: self.pos,
        });
        self
    }
}

/// A note as written. `duration` is `None` when no suffix was given.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteNode {
    pub pitch: PitchClass,
    pub octave: u8,
    pub duration: Option<BeatValue>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChordContent {
    /// `[Am]`, `[Fmaj7]`
    Named(String),
    /// `[C4 E4 G4]`
    Notes(Vec<NoteNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordNode {
    pub content: ChordContent,
    pub duration: Option<BeatValue>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestNode {
    pub duration: Option<BeatValue>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub elements: Vec<PlayableNode>,
    pub duration: Option<BeatValue>,
    pub pos: Position,
}

/// Body shared by `track NAME { ... }` and `section NAME { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerNode {
    pub name: String,
    pub sets: Vec<SetNode>,
    pub elements: Vec<PlayableNode>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayableNode {
    Note(NoteNode),
    Chord(ChordNode),
    Rest(RestNode),
    Group(GroupNode),
    Track(ContainerNode),
    Section(ContainerNode),
}

impl PlayableNode {
    pub fn pos(&self) -> Position {
        match self {
            PlayableNode::Note(n) => n.pos,
            PlayableNode::Chord(c) => c.pos,
            PlayableNode::Rest(r) => r.pos,
            PlayableNode::Group(g) => g.pos,
            PlayableNode::Track(t) | PlayableNode::Section(t) => t.pos,
        }
    }
}

fn suffix(duration: &Option<BeatValue>) -> String {
    duration.map(|d| format!(" {d}")).unwrap_or_default()
}

fn write_sets(f: &mut fmt::Formatter<'_>, sets: &[SetNode], depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    for set in sets {
        writeln!(f, "{pad}Set ({})", set.scope)?;
        for entry in &set.entries {
            writeln!(f, "{pad}  {}: {}", entry.key, entry.value)?;
        }
    }
    Ok(())
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &PlayableNode, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match node {
        PlayableNode::Note(n) => {
            writeln!(f, "{pad}Note {}{}{}", n.pitch, n.octave, suffix(&n.duration))
        }
        PlayableNode::Chord(c) => match &c.content {
            ChordContent::Named(name) => {
                writeln!(f, "{pad}Chord {name}{}", suffix(&c.duration))
            }
            ChordContent::Notes(notes) => {
                let names: Vec<String> = notes
                    .iter()
                    .map(|n| format!("{}{}", n.pitch, n.octave))
                    .collect();
                writeln!(f, "{pad}Chord [{}]{}", names.join(" "), suffix(&c.duration))
            }
        },
        PlayableNode::Rest(r) => writeln!(f, "{pad}Rest{}", suffix(&r.duration)),
        PlayableNode::Group(g) => {
            writeln!(f, "{pad}Group{}", suffix(&g.duration))?;
            for child in &g.elements {
                write_node(f, child, depth + 1)?;
            }
            Ok(())
        }
        PlayableNode::Track(c) | PlayableNode::Section(c) => {
            let label = if matches!(node, PlayableNode::Track(_)) {
                "Track"
            } else {
                "Section"
            };
            writeln!(f, "{pad}{label} '{}'", c.name)?;
            write_sets(f, &c.sets, depth + 1)?;
            for child in &c.elements {
                write_node(f, child, depth + 1)?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for ScoreNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score")?;
        write_sets(f, &self.global_sets, 1)?;
        for element in &self.elements {
            write_node(f, element, 1)?;
        }
        Ok(())
    }
}
