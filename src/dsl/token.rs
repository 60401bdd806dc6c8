//! Token types for the catrock lexer.

use std::fmt;

use crate::score::PitchClass;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token (`"\n"` for newlines, empty at end of input).
    pub literal: String,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Set,
    Track,
    Section,
    /// A note letter, with any sharp or flat spelling already folded in.
    Note(PitchClass),

    // Literals
    Ident(String),
    Number(u64),

    // Delimiters
    Colon,
    Slash,
    Dot,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,

    // Special
    Newline,
    Eof,
    /// A character the language does not use.
    Illegal(char),
}

impl TokenKind {
    /// Short upper-case name, as shown by `debug --tokens`.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Set => "SET",
            TokenKind::Track => "TRACK",
            TokenKind::Section => "SECTION",
            TokenKind::Note(_) => "NOTE",
            TokenKind::Ident(_) => "IDENTIFIER",
            TokenKind::Number(_) => "NUMBER",
            TokenKind::Colon => "COLON",
            TokenKind::Slash => "SLASH",
            TokenKind::Dot => "DOT",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Eof => "EOF",
            TokenKind::Illegal(_) => "ILLEGAL",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Note(pc) => write!(f, "note '{pc}'"),
            TokenKind::Ident(s) => write!(f, "identifier '{s}'"),
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Illegal(c) => write!(f, "illegal character '{c}'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Slash => f.write_str("'/'"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::Set => f.write_str("'set'"),
            TokenKind::Track => f.write_str("'track'"),
            TokenKind::Section => f.write_str("'section'"),
        }
    }
}

/// Keyword lookup for a scanned word: `set`, `track`, `section`, and note
/// spellings. Letters match in either case; `s` spellings are sharps and the
/// flat spellings `Db Eb Gb Ab Bb` fold to their sharp equivalents.
pub fn lookup_keyword(word: &str) -> Option<TokenKind> {
    match word {
        "set" => Some(TokenKind::Set),
        "track" => Some(TokenKind::Track),
        "section" => Some(TokenKind::Section),
        _ => note_keyword(word).map(TokenKind::Note),
    }
}

fn note_keyword(word: &str) -> Option<PitchClass> {
    let pc = match word {
        "C" | "c" => PitchClass::C,
        "D" | "d" => PitchClass::D,
        "E" | "e" => PitchClass::E,
        "F" | "f" => PitchClass::F,
        "G" | "g" => PitchClass::G,
        "A" | "a" => PitchClass::A,
        "B" | "b" => PitchClass::B,
        "Cs" | "cs" | "Db" | "db" => PitchClass::Cs,
        "Ds" | "ds" | "Eb" | "eb" => PitchClass::Ds,
        "Fs" | "fs" | "Gb" | "gb" => PitchClass::Fs,
        "Gs" | "gs" | "Ab" | "ab" => PitchClass::Gs,
        "As" | "as" | "Bb" | "bb" => PitchClass::As,
        _ => return None,
    };
    Some(pc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_keywords() {
        assert_eq!(lookup_keyword("set"), Some(TokenKind::Set));
        assert_eq!(lookup_keyword("track"), Some(TokenKind::Track));
        assert_eq!(lookup_keyword("section"), Some(TokenKind::Section));
        assert_eq!(lookup_keyword("Set"), None);
    }

    #[test]
    fn note_letters_in_either_case() {
        assert_eq!(lookup_keyword("C"), Some(TokenKind::Note(PitchClass::C)));
        assert_eq!(lookup_keyword("g"), Some(TokenKind::Note(PitchClass::G)));
    }

    #[test]
    fn flats_fold_to_sharps() {
        assert_eq!(lookup_keyword("Db"), lookup_keyword("Cs"));
        assert_eq!(lookup_keyword("Bb"), Some(TokenKind::Note(PitchClass::As)));
        assert_eq!(lookup_keyword("ab"), Some(TokenKind::Note(PitchClass::Gs)));
    }

    #[test]
    fn other_words_are_not_keywords() {
        assert_eq!(lookup_keyword("rest"), None);
        assert_eq!(lookup_keyword("quarter"), None);
        assert_eq!(lookup_keyword("Am"), None);
    }
}
