//! Lexer for the catrock language.
//!
//! Converts source text into [`Token`]s one call at a time. Lexing never
//! fails: characters outside the language become [`TokenKind::Illegal`] and
//! are reported by the parser.

use super::token::{lookup_keyword, Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Lex the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    /// Scan the next token. Returns `Eof` forever once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.skip_comment();

        if self.is_at_end() {
            return Token {
                kind: TokenKind::Eof,
                literal: String::new(),
                line: self.line,
                col: self.col,
            };
        }

        match self.peek() {
            '\n' => self.newline(),
            '\r' => self.newline(),
            ':' => self.single_char(TokenKind::Colon),
            '/' => self.single_char(TokenKind::Slash),
            '.' => self.single_char(TokenKind::Dot),
            '{' => self.single_char(TokenKind::LBrace),
            '}' => self.single_char(TokenKind::RBrace),
            '[' => self.single_char(TokenKind::LBracket),
            ']' => self.single_char(TokenKind::RBracket),
            '(' => self.single_char(TokenKind::LParen),
            ')' => self.single_char(TokenKind::RParen),
            '0'..='9' => self.lex_number(),
            'a'..='z' | 'A'..='Z' | '_' => self.lex_ident_or_keyword(),
            ch => self.single_char(TokenKind::Illegal(ch)),
        }
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        self.col += 1;
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && matches!(self.peek(), ' ' | '\t') {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        if !self.is_at_end() && self.peek() == '/' && self.peek_next() == Some('/') {
            while !self.is_at_end() && !matches!(self.peek(), '\n' | '\r') {
                self.advance();
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        let ch = self.advance();
        Token {
            kind,
            literal: ch.to_string(),
            line,
            col,
        }
    }

    /// `\n`, `\r\n` and a lone `\r` each end a line.
    fn newline(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        if self.advance() == '\r' && !self.is_at_end() && self.peek() == '\n' {
            self.advance();
        }
        self.line += 1;
        self.col = 1;
        Token {
            kind: TokenKind::Newline,
            literal: "\n".to_string(),
            line,
            col,
        }
    }

    fn lex_number(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let literal = self.take_while(|c| c.is_ascii_digit());
        let kind = match literal.parse() {
            Ok(n) => TokenKind::Number(n),
            // only reachable for runs longer than u64
            Err(_) => TokenKind::Illegal(literal.chars().next().unwrap_or('0')),
        };
        Token {
            kind,
            literal,
            line,
            col,
        }
    }

    /// Words are letters and underscores; a digit ends the word.
    fn lex_ident_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let literal = self.take_while(|c| c.is_ascii_alphabetic() || c == '_');
        let kind = lookup_keyword(&literal).unwrap_or_else(|| TokenKind::Ident(literal.clone()));
        Token {
            kind,
            literal,
            line,
            col,
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut s = String::new();
        while !self.is_at_end() && pred(self.peek()) {
            s.push(self.advance());
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::PitchClass;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn lex_note_with_octave() {
        assert_eq!(
            kinds("C4"),
            vec![
                TokenKind::Note(PitchClass::C),
                TokenKind::Number(4),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_fraction_duration_with_dot() {
        assert_eq!(
            kinds("D5/8."),
            vec![
                TokenKind::Note(PitchClass::D),
                TokenKind::Number(5),
                TokenKind::Slash,
                TokenKind::Number(8),
                TokenKind::Dot,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_flat_spelling() {
        assert_eq!(kinds("Eb3")[0], TokenKind::Note(PitchClass::Ds));
    }

    #[test]
    fn lex_duration_word() {
        assert_eq!(
            kinds("A4 quarter"),
            vec![
                TokenKind::Note(PitchClass::A),
                TokenKind::Number(4),
                TokenKind::Ident("quarter".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_block_keywords_and_delimiters() {
        assert_eq!(
            kinds("track lead { set { BPM: 90 } }"),
            vec![
                TokenKind::Track,
                TokenKind::Ident("lead".into()),
                TokenKind::LBrace,
                TokenKind::Set,
                TokenKind::LBrace,
                TokenKind::Ident("BPM".into()),
                TokenKind::Colon,
                TokenKind::Number(90),
                TokenKind::RBrace,
                TokenKind::RBrace,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_brackets_and_parens() {
        assert_eq!(
            kinds("[ ] ( )"),
            vec![
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn underscores_belong_to_identifiers() {
        assert_eq!(kinds("base_duration")[0], TokenKind::Ident("base_duration".into()));
    }

    #[test]
    fn digits_end_identifiers() {
        assert_eq!(
            kinds("maj7"),
            vec![
                TokenKind::Ident("maj".into()),
                TokenKind::Number(7),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn newlines_are_tokens_and_track_lines() {
        let tokens = Lexer::new("C4\n\nD4").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Newline);
        assert_eq!(tokens[3].kind, TokenKind::Newline);
        assert_eq!(tokens[4].kind, TokenKind::Note(PitchClass::D));
        assert_eq!(tokens[4].line, 3);
        assert_eq!(tokens[4].col, 1);
    }

    #[test]
    fn crlf_is_one_newline() {
        let tokens = Lexer::new("C4\r\nD4").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Newline);
        assert_eq!(tokens[3].kind, TokenKind::Note(PitchClass::D));
        assert_eq!(tokens[3].line, 2);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// intro\nC4 // middle c"),
            vec![
                TokenKind::Newline,
                TokenKind::Note(PitchClass::C),
                TokenKind::Number(4),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn illegal_characters_become_tokens() {
        let tokens = Lexer::new("C4 # D4").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Illegal('#'));
        assert_eq!(tokens[2].col, 4);
        assert_eq!(tokens[3].kind, TokenKind::Note(PitchClass::D));
    }

    #[test]
    fn columns_are_tracked() {
        let tokens = Lexer::new("set {BPM: 120}").tokenize();
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        assert_eq!(tokens[2].col, 6);
        assert_eq!(tokens[4].col, 11);
        assert_eq!(tokens[4].literal, "120");
    }

    #[test]
    fn eof_repeats() {
        let mut lexer = Lexer::new("C");
        lexer.next_token();
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
