//! Parser for the catrock language.
//!
//! Recursive descent over the token stream with one token of lookahead past
//! the current one. Errors never abort the parse: each mismatch records a
//! [`Diagnostic`], the offending token is skipped, and parsing resumes. A
//! partial tree is always returned; callers must treat any diagnostic as a
//! failed parse.

use std::mem::discriminant;

use tracing::debug;

use super::ast::*;
use super::error::Diagnostic;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::score::chord::parse_chord_name;
use crate::score::BeatValue;

/// Highest octave a note may be written in.
pub const MAX_OCTAVE: u64 = 9;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col + 1));
            tokens.push(Token {
                kind: TokenKind::Eof,
                literal: String::new(),
                line,
                col,
            });
        }
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::new(source).tokenize())
    }

    /// Diagnostics collected so far, in source order of discovery.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Parse a whole file.
    pub fn parse(&mut self) -> ScoreNode {
        let mut score = ScoreNode {
            pos: self.position(),
            ..ScoreNode::default()
        };

        loop {
            self.skip_newlines();
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Set => {
                    if let Some(set) = self.parse_set(Scope::Global) {
                        score.global_sets.push(set);
                    }
                }
                _ => {
                    if let Some(node) = self.parse_item() {
                        score.elements.push(node);
                    }
                }
            }
        }

        for d in &self.diagnostics {
            debug!(line = d.line, col = d.col, "{}", d.message);
        }
        score
    }

    /// One playable expression or container. Always consumes at least one
    /// token.
    fn parse_item(&mut self) -> Option<PlayableNode> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Track => self.parse_container(Scope::Track),
            TokenKind::Section => self.parse_container(Scope::Section),
            TokenKind::Note(_) => self.parse_note().map(PlayableNode::Note),
            TokenKind::LBracket => self.parse_chord().map(PlayableNode::Chord),
            TokenKind::LParen => self.parse_group().map(PlayableNode::Group),
            TokenKind::Ident(word) if word == "rest" => Some(PlayableNode::Rest(self.parse_rest())),
            TokenKind::Ident(word) => {
                self.error(format!("unknown identifier '{word}'"), &token);
                self.advance();
                None
            }
            TokenKind::Set => {
                self.error("'set' block is not allowed here", &token);
                self.advance();
                None
            }
            TokenKind::Illegal(ch) => {
                self.error(format!("illegal character '{ch}'"), &token);
                self.advance();
                None
            }
            other => {
                self.error(format!("unexpected {other}"), &token);
                self.advance();
                None
            }
        }
    }

    /// `track NAME { ... }` or `section NAME { ... }`.
    fn parse_container(&mut self, scope: Scope) -> Option<PlayableNode> {
        let keyword = self.advance();
        let pos = position_of(&keyword);
        let name = self.expect_name(&keyword.literal)?;

        self.skip_newlines();
        if !self.expect(TokenKind::LBrace, &format!("after {} name", keyword.literal)) {
            return None;
        }

        let mut sets = Vec::new();
        let mut elements = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek().kind {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    let t = self.peek().clone();
                    self.error(format!("unclosed {} '{name}': expected '}}'", keyword.literal), &t);
                    break;
                }
                TokenKind::Set => {
                    if let Some(set) = self.parse_set(scope) {
                        sets.push(set);
                    }
                }
                _ => {
                    if let Some(node) = self.parse_item() {
                        elements.push(node);
                    }
                }
            }
        }

        let node = ContainerNode {
            name,
            sets,
            elements,
            pos,
        };
        Some(match scope {
            Scope::Track => PlayableNode::Track(node),
            _ => PlayableNode::Section(node),
        })
    }

    /// `set { key: value ... }`
    fn parse_set(&mut self, scope: Scope) -> Option<SetNode> {
        let keyword = self.advance();
        let mut set = SetNode::new(scope, position_of(&keyword));

        self.skip_newlines();
        if !self.expect(TokenKind::LBrace, "after 'set'") {
            return None;
        }

        loop {
            self.skip_newlines();
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    self.error("unclosed 'set' block: expected '}'", &token);
                    break;
                }
                TokenKind::Ident(key) => {
                    self.advance();
                    if !self.expect(TokenKind::Colon, &format!("after parameter '{key}'")) {
                        continue;
                    }
                    if let Some(value) = self.parse_value(key) {
                        set.entries.push(SetEntry {
                            key: key.clone(),
                            value,
                            pos: position_of(&token),
                        });
                    }
                }
                other => {
                    self.error(format!("expected parameter name, got {other}"), &token);
                    self.advance();
                }
            }
        }

        Some(set)
    }

    /// A number, a `NUM/NUM` fraction, or a bare word.
    fn parse_value(&mut self, key: &str) -> Option<RawValue> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Number(num) => {
                self.advance();
                if !self.check(&TokenKind::Slash) {
                    return Some(RawValue::Integer(*num));
                }
                self.advance();
                let den_token = self.peek().clone();
                match den_token.kind {
                    TokenKind::Number(0) => {
                        self.advance();
                        self.error(
                            format!("zero denominator in value of '{key}'"),
                            &den_token,
                        );
                        None
                    }
                    TokenKind::Number(den) => {
                        self.advance();
                        Some(RawValue::Fraction { num: *num, den })
                    }
                    _ => {
                        self.error(
                            format!("expected denominator after '/' in value of '{key}'"),
                            &den_token,
                        );
                        None
                    }
                }
            }
            TokenKind::Ident(word) => {
                self.advance();
                Some(RawValue::Ident(word.clone()))
            }
            TokenKind::Note(_) => {
                self.advance();
                Some(RawValue::Ident(token.literal.clone()))
            }
            other => {
                self.error(format!("expected value for '{key}', got {other}"), &token);
                self.skip_unless_boundary();
                None
            }
        }
    }

    /// `LETTER OCTAVE [suffix]`
    fn parse_note(&mut self) -> Option<NoteNode> {
        let letter = self.advance();
        let TokenKind::Note(pitch) = letter.kind else {
            return None;
        };

        let octave_token = self.peek().clone();
        let octave = match octave_token.kind {
            TokenKind::Number(n) if n <= MAX_OCTAVE => n as u8,
            TokenKind::Number(n) => {
                self.advance();
                self.error(
                    format!("octave {n} out of range 0-{MAX_OCTAVE} for note '{}'", letter.literal),
                    &octave_token,
                );
                return None;
            }
            _ => {
                self.error(
                    format!("expected octave after note '{}'", letter.literal),
                    &octave_token,
                );
                return None;
            }
        };
        self.advance();

        if pitch.midi_number(octave).is_none() {
            self.error(
                format!("note {}{octave} is above the MIDI range", letter.literal),
                &letter,
            );
            return None;
        }

        Some(NoteNode {
            pitch,
            octave,
            duration: self.parse_duration_suffix(),
            pos: position_of(&letter),
        })
    }

    /// `[ NAME ]` or `[ NOTE NOTE* ]`, then an optional suffix.
    fn parse_chord(&mut self) -> Option<ChordNode> {
        let open = self.advance();
        self.skip_newlines();

        let token = self.peek().clone();
        let content = match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                let name = self.glue_number(name.clone(), &token);
                self.check_chord_name(name, &token)
            }
            TokenKind::Note(_) if !matches!(self.peek_next().kind, TokenKind::Number(_)) => {
                self.advance();
                self.check_chord_name(token.literal.clone(), &token)
            }
            _ => {
                let mut notes = Vec::new();
                loop {
                    self.skip_newlines();
                    let t = self.peek().clone();
                    match &t.kind {
                        TokenKind::Note(_) => {
                            if let Some(note) = self.parse_note() {
                                notes.push(note);
                            }
                        }
                        TokenKind::RBracket
                        | TokenKind::RBrace
                        | TokenKind::RParen
                        | TokenKind::Eof => break,
                        other => {
                            self.error(format!("expected note in chord, got {other}"), &t);
                            self.advance();
                        }
                    }
                }
                if notes.is_empty() {
                    self.error("empty chord", &open);
                }
                ChordContent::Notes(notes)
            }
        };

        self.skip_newlines();
        self.expect(TokenKind::RBracket, "to close chord");

        Some(ChordNode {
            content,
            duration: self.parse_duration_suffix(),
            pos: position_of(&open),
        })
    }

    /// `rest [suffix]`
    fn parse_rest(&mut self) -> RestNode {
        let word = self.advance();
        RestNode {
            duration: self.parse_duration_suffix(),
            pos: position_of(&word),
        }
    }

    /// `( playable* ) [suffix]`
    fn parse_group(&mut self) -> Option<GroupNode> {
        let open = self.advance();
        let mut elements = Vec::new();
        loop {
            self.skip_newlines();
            let t = self.peek().clone();
            match t.kind {
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                TokenKind::RBrace | TokenKind::Eof => {
                    self.error(format!("unclosed group: expected ')', got {}", t.kind), &t);
                    break;
                }
                _ => {
                    if let Some(node) = self.parse_item() {
                        elements.push(node);
                    }
                }
            }
        }
        Some(GroupNode {
            elements,
            duration: self.parse_duration_suffix(),
            pos: position_of(&open),
        })
    }

    /// `/N['.']` or a duration word with an optional `.`. `None` when no
    /// suffix follows.
    fn parse_duration_suffix(&mut self) -> Option<BeatValue> {
        let token = self.peek().clone();
        let value = match &token.kind {
            TokenKind::Slash => {
                self.advance();
                let den_token = self.peek().clone();
                let TokenKind::Number(den) = den_token.kind else {
                    self.error(
                        format!("expected number after '/', got {}", den_token.kind),
                        &den_token,
                    );
                    return None;
                };
                self.advance();
                match u32::try_from(den).ok().and_then(BeatValue::new) {
                    Some(value) => value,
                    None => {
                        self.error(format!("invalid duration denominator {den}"), &den_token);
                        return None;
                    }
                }
            }
            TokenKind::Ident(word) => match BeatValue::from_word(word) {
                Some(value) => {
                    self.advance();
                    value
                }
                None => return None,
            },
            _ => return None,
        };

        let dotted = self.check(&TokenKind::Dot);
        if dotted {
            self.advance();
        }
        Some(value.with_dot(dotted))
    }

    /// Chord names like `maj7` lex as a word and a number; join them back
    /// when the number touches the word.
    fn glue_number(&mut self, mut name: String, word: &Token) -> String {
        let next = self.peek();
        let touching = next.line == word.line && next.col == word.col + word.literal.len();
        if touching && matches!(next.kind, TokenKind::Number(_)) {
            let digits = self.advance().literal;
            name.push_str(&digits);
        }
        name
    }

    fn check_chord_name(&mut self, name: String, token: &Token) -> ChordContent {
        if parse_chord_name(&name).is_none() {
            self.error(format!("unknown chord name '{name}'"), token);
        }
        ChordContent::Named(name)
    }

    fn expect_name(&mut self, keyword: &str) -> Option<String> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Some(name.clone())
            }
            // Names may collide with note letters, e.g. `track a`.
            TokenKind::Note(_) | TokenKind::Set | TokenKind::Track | TokenKind::Section => {
                self.advance();
                Some(token.literal.clone())
            }
            other => {
                self.error(format!("expected name after '{keyword}', got {other}"), &token);
                self.skip_unless_boundary();
                None
            }
        }
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn position(&self) -> Position {
        position_of(self.peek())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        discriminant(&self.peek().kind) == discriminant(kind)
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Consume the current token if it is `kind`. Otherwise record a
    /// diagnostic and skip the offending token, unless it closes an
    /// enclosing construct.
    fn expect(&mut self, kind: TokenKind, context: &str) -> bool {
        if self.check(&kind) {
            self.advance();
            return true;
        }
        let t = self.peek().clone();
        self.error(format!("expected {kind} {context}, got {}", t.kind), &t);
        self.skip_unless_boundary();
        false
    }

    fn skip_unless_boundary(&mut self) {
        let boundary = matches!(
            self.peek().kind,
            TokenKind::RBrace
                | TokenKind::RBracket
                | TokenKind::RParen
                | TokenKind::Newline
                | TokenKind::Eof
        );
        if !boundary {
            self.advance();
        }
    }

    fn error(&mut self, message: impl Into<String>, token: &Token) {
        self.diagnostics
            .push(Diagnostic::new(message, token.line, token.col));
    }
}

fn position_of(token: &Token) -> Position {
    Position {
        line: token.line,
        col: token.col,
    }
}
