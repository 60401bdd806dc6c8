//! Chord qualities and named chords (`Am`, `Fmaj7`, `Bbsus4`).

use super::pitch::PitchClass;

/// Octave used for the root of a chord written by name.
pub const NAMED_CHORD_OCTAVE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Major7,
    Minor7,
    Dominant7,
    Sus2,
    Sus4,
}

impl ChordQuality {
    /// Semitone offsets from the root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "maj" => Some(ChordQuality::Major),
            "m" | "min" => Some(ChordQuality::Minor),
            "dim" => Some(ChordQuality::Diminished),
            "aug" => Some(ChordQuality::Augmented),
            "maj7" => Some(ChordQuality::Major7),
            "m7" | "min7" => Some(ChordQuality::Minor7),
            "7" => Some(ChordQuality::Dominant7),
            "sus2" => Some(ChordQuality::Sus2),
            "sus4" => Some(ChordQuality::Sus4),
            _ => None,
        }
    }
}

/// Split a chord name into its root and quality.
///
/// The quality suffix is tried before an accidental, so `Csus4` is C with a
/// suspended fourth while `Csm` is C-sharp minor.
pub fn parse_chord_name(name: &str) -> Option<(PitchClass, ChordQuality)> {
    let letter = name.get(..1)?;
    let rest = name.get(1..)?;

    if let (Some(root), Some(quality)) = (
        PitchClass::from_spelling(letter),
        ChordQuality::from_suffix(rest),
    ) {
        return Some((root, quality));
    }

    let spelled = name.get(..2)?;
    let root = PitchClass::from_spelling(spelled)?;
    let quality = ChordQuality::from_suffix(name.get(2..)?)?;
    Some((root, quality))
}

/// MIDI numbers of the chord tones, root first. Tones above 127 are dropped.
pub fn chord_pitches(root: PitchClass, octave: u8, quality: ChordQuality) -> Vec<u8> {
    let Some(base) = root.midi_number(octave) else {
        return Vec::new();
    };
    quality
        .intervals()
        .iter()
        .filter_map(|&i| base.checked_add(i).filter(|&p| p <= 127))
        .collect()
}
