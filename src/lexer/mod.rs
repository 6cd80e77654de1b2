pub mod token;

use logos::Logos;

use crate::diagnostics::CompileError;
use crate::span::Span;
pub use token::{Token, TokenKind};

/// Pull-based scanner: the parser asks for one token at a time.
///
/// Scan errors are recorded internally and surface to the caller as a
/// `TokenKind::Error` token, so the parser fails on them naturally.
pub struct Scanner<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    errors: Vec<CompileError>,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { inner: TokenKind::lexer(source), source, errors: Vec::new() }
    }

    /// Next token. Once the input is exhausted every call returns `Eot`.
    pub fn scan(&mut self) -> Token {
        loop {
            let Some(result) = self.inner.next() else {
                let end = self.source.len();
                return Token::new(TokenKind::Eot, "", Span::new(end, end));
            };
            let range = self.inner.span();
            let span = Span::new(range.start, range.end);
            let text = self.inner.slice();
            let kind = match result {
                Ok(TokenKind::Comment) => continue,
                Ok(TokenKind::UnterminatedComment) => {
                    self.error("unterminated block comment", span)
                }
                Ok(TokenKind::Amp) => self.error("single & not allowed", span),
                Ok(TokenKind::Pipe) => self.error("single | not allowed", span),
                Ok(TokenKind::InvalidIdent) => {
                    self.error(format!("identifier '{text}' is not valid"), span)
                }
                Ok(kind) => kind,
                Err(()) if !text.is_ascii() => {
                    self.errors.push(CompileError::io(format!(
                        "non-ASCII character in input at byte {}",
                        span.start
                    )));
                    TokenKind::Error
                }
                Err(()) => self.error(format!("unrecognized character '{text}'"), span),
            };
            return Token::new(kind, text, span);
        }
    }

    fn error(&mut self, msg: impl Into<String>, span: Span) -> TokenKind {
        self.errors.push(CompileError::scan(msg, span));
        TokenKind::Error
    }

    pub fn take_errors(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.errors)
    }
}

/// Scan a whole source text. The token list always ends in exactly one `Eot`.
pub fn lex(source: &str) -> (Vec<Token>, Vec<CompileError>) {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let tok = scanner.scan();
        let done = tok.kind == TokenKind::Eot;
        tokens.push(tok);
        if done {
            break;
        }
    }
    (tokens, scanner.take_errors())
}
