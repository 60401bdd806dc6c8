//! Pitch classes and note values.
//!
//! Pitch spelling is normalized to sharps: `Db` and `C#` are both [`PitchClass::Cs`].
//! MIDI numbering follows the convention where C4 (middle C) is 60.

use std::fmt;

use super::beat::{Beat, TICKS_PER_BEAT};

/// One of the twelve chromatic pitch classes, sharp-normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Semitones above C.
    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn from_semitone(semitone: u8) -> PitchClass {
        Self::ALL[(semitone % 12) as usize]
    }

    /// Parse a spelling such as `C`, `c`, `Cs`, `C#`, `Db` or `bb`.
    ///
    /// The letter is case-insensitive; the accidental is `s`/`#` for sharp or
    /// `b` for flat. Flats wrap around the octave (`Cb` is `B`).
    pub fn from_spelling(spelling: &str) -> Option<PitchClass> {
        let mut chars = spelling.chars();
        let base = match chars.next()?.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let shift: i8 = match chars.next() {
            None => 0,
            Some('s') | Some('S') | Some('#') => 1,
            Some('b') => -1,
            Some(_) => return None,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Self::from_semitone((base + shift + 12) as u8 % 12))
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// MIDI note number for this pitch in `octave`: `(octave + 1) * 12 + semitone`.
    ///
    /// Returns `None` above 127 (G9 is the highest representable note).
    pub fn midi_number(self, octave: u8) -> Option<u8> {
        let midi = (octave as u16 + 1) * 12 + self.semitone() as u16;
        u8::try_from(midi).ok().filter(|&m| m <= 127)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A written note value: `1/denominator` of a whole note, optionally dotted.
///
/// A quarter note (`1/4`) lasts one beat. Any positive denominator is accepted,
/// so `/3` gives a third of a whole note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeatValue {
    denominator: u32,
    dotted: bool,
}

impl BeatValue {
    pub const WHOLE: BeatValue = BeatValue::plain(1);
    pub const HALF: BeatValue = BeatValue::plain(2);
    pub const QUARTER: BeatValue = BeatValue::plain(4);
    pub const EIGHTH: BeatValue = BeatValue::plain(8);
    pub const SIXTEENTH: BeatValue = BeatValue::plain(16);
    pub const THIRTY_SECOND: BeatValue = BeatValue::plain(32);

    const fn plain(denominator: u32) -> Self {
        Self {
            denominator,
            dotted: false,
        }
    }

    /// `None` for a zero denominator.
    pub fn new(denominator: u32) -> Option<Self> {
        (denominator > 0).then_some(Self::plain(denominator))
    }

    pub fn with_dot(self, dotted: bool) -> Self {
        Self { dotted, ..self }
    }

    pub fn denominator(self) -> u32 {
        self.denominator
    }

    pub fn is_dotted(self) -> bool {
        self.dotted
    }

    /// Legacy duration words: `whole`, `half`, `quarter`, `eighth`, `sixteenth`.
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "whole" => Some(Self::WHOLE),
            "half" => Some(Self::HALF),
            "quarter" => Some(Self::QUARTER),
            "eighth" => Some(Self::EIGHTH),
            "sixteenth" => Some(Self::SIXTEENTH),
            _ => None,
        }
    }

    /// Parse a written value such as `1/8`, `1/4.`, `/2`, `half` or `quarter.`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (body, dotted) = match text.strip_suffix('.') {
            Some(body) => (body, true),
            None => (text, false),
        };
        let value = match body.split_once('/') {
            Some((num, den)) => {
                if !(num.is_empty() || num == "1") {
                    return None;
                }
                Self::new(den.parse().ok()?)?
            }
            None => Self::from_word(body)?,
        };
        Some(value.with_dot(dotted))
    }

    /// Length in beats: `4 / denominator`, times 1.5 when dotted.
    pub fn beats(self) -> Beat {
        let whole = 4 * TICKS_PER_BEAT;
        let base = whole as f64 / self.denominator as f64;
        let ticks = if self.dotted { base * 1.5 } else { base };
        Beat::from_ticks(ticks.round() as u64)
    }
}

impl Default for BeatValue {
    fn default() -> Self {
        Self::QUARTER
    }
}

impl fmt::Display for BeatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.denominator)?;
        if self.dotted {
            f.write_str(".")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn middle_c() {
        assert_eq!(PitchClass::C.midi_number(4), Some(60));
    }

    #[test]
    fn a4_concert() {
        assert_eq!(PitchClass::A.midi_number(4), Some(69));
    }

    #[test]
    fn c_sharp_4() {
        assert_eq!(PitchClass::Cs.midi_number(4), Some(61));
    }

    #[test]
    fn semitone_steps_and_octaves_are_monotonic() {
        for octave in 0..8u8 {
            for pair in PitchClass::ALL.windows(2) {
                let lo = pair[0].midi_number(octave).unwrap();
                let hi = pair[1].midi_number(octave).unwrap();
                assert_eq!(hi, lo + 1);
            }
            for pc in PitchClass::ALL {
                let here = pc.midi_number(octave).unwrap();
                let up = pc.midi_number(octave + 1).unwrap();
                assert_eq!(up, here + 12);
            }
        }
    }

    #[test]
    fn g9_max_and_above_rejected() {
        assert_eq!(PitchClass::G.midi_number(9), Some(127));
        assert_eq!(PitchClass::Gs.midi_number(9), None);
    }

    #[test]
    fn flats_normalize_to_sharps() {
        assert_eq!(PitchClass::from_spelling("Db"), Some(PitchClass::Cs));
        assert_eq!(PitchClass::from_spelling("Eb"), Some(PitchClass::Ds));
        assert_eq!(PitchClass::from_spelling("Gb"), Some(PitchClass::Fs));
        assert_eq!(PitchClass::from_spelling("Ab"), Some(PitchClass::Gs));
        assert_eq!(PitchClass::from_spelling("bb"), Some(PitchClass::As));
        assert_eq!(PitchClass::from_spelling("Cb"), Some(PitchClass::B));
    }

    #[test]
    fn sharp_spellings() {
        assert_eq!(PitchClass::from_spelling("Cs"), Some(PitchClass::Cs));
        assert_eq!(PitchClass::from_spelling("F#"), Some(PitchClass::Fs));
        assert_eq!(PitchClass::from_spelling("e"), Some(PitchClass::E));
    }

    #[test]
    fn invalid_spellings() {
        assert_eq!(PitchClass::from_spelling(""), None);
        assert_eq!(PitchClass::from_spelling("H"), None);
        assert_eq!(PitchClass::from_spelling("Cm"), None);
        assert_eq!(PitchClass::from_spelling("Css"), None);
    }

    #[test]
    fn beat_values() {
        assert_approx_eq!(BeatValue::WHOLE.beats().as_beats_f64(), 4.0);
        assert_approx_eq!(BeatValue::HALF.beats().as_beats_f64(), 2.0);
        assert_approx_eq!(BeatValue::QUARTER.beats().as_beats_f64(), 1.0);
        assert_approx_eq!(BeatValue::EIGHTH.beats().as_beats_f64(), 0.5);
        assert_approx_eq!(BeatValue::SIXTEENTH.beats().as_beats_f64(), 0.25);
        assert_approx_eq!(BeatValue::THIRTY_SECOND.beats().as_beats_f64(), 0.125);
    }

    #[test]
    fn dotted_adds_half() {
        let dotted_quarter = BeatValue::QUARTER.with_dot(true);
        assert_approx_eq!(dotted_quarter.beats().as_beats_f64(), 1.5);
    }

    #[test]
    fn zero_denominator_rejected() {
        assert_eq!(BeatValue::new(0), None);
        assert_eq!(BeatValue::parse("1/0"), None);
    }

    #[test]
    fn parse_written_values() {
        assert_eq!(BeatValue::parse("1/8"), Some(BeatValue::EIGHTH));
        assert_eq!(BeatValue::parse("/2"), Some(BeatValue::HALF));
        assert_eq!(BeatValue::parse("quarter"), Some(BeatValue::QUARTER));
        assert_eq!(
            BeatValue::parse("1/4."),
            Some(BeatValue::QUARTER.with_dot(true))
        );
        assert_eq!(BeatValue::parse("3/4"), None);
        assert_eq!(BeatValue::parse("crotchet"), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let v = BeatValue::SIXTEENTH.with_dot(true);
        assert_eq!(v.to_string(), "1/16.");
        assert_eq!(BeatValue::parse(&v.to_string()), Some(v));
    }
}
