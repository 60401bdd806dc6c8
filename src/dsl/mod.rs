//! catrock language compiler: source text → tokens → AST → score.

pub mod ast;
pub mod compile;
pub mod error;
pub mod lexer;
pub mod params;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::{CompileError, Diagnostic};

use compile::generate;
use lexer::Lexer;
use parser::Parser;
use token::Token;

use crate::score::Score;

/// The catrock compiler.
///
/// Source goes through lexer → parser → AST, then the generator builds a
/// [`Score`] whose events can be played.
pub struct Compiler;

impl Compiler {
    /// Lex source text. The last token is always end of input.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize()
    }

    /// Parse source into an AST, failing if any diagnostic was recorded.
    pub fn parse(source: &str) -> Result<ScoreNode, CompileError> {
        let (ast, diagnostics) = Self::parse_partial(source);
        if diagnostics.is_empty() {
            Ok(ast)
        } else {
            Err(CompileError::Syntax(diagnostics))
        }
    }

    /// Parse source and return whatever tree was recovered alongside every
    /// diagnostic.
    pub fn parse_partial(source: &str) -> (ScoreNode, Vec<Diagnostic>) {
        let mut parser = Parser::new(Self::tokenize(source));
        let ast = parser.parse();
        (ast, parser.into_diagnostics())
    }

    /// Parse and lower source into a score.
    pub fn compile(source: &str) -> Result<Score, CompileError> {
        let ast = Self::parse(source)?;
        generate(&ast)
    }
}
