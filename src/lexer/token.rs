use std::fmt;

use logos::{Filter, Logos};

use crate::span::Span;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    // Keywords
    #[token("class")]
    Class,
    #[token("public")]
    Public,
    #[token("private")]
    Private,
    #[token("static")]
    Static,
    #[token("void")]
    Void,
    #[token("return")]
    Return,
    #[token("int")]
    Int,
    #[token("boolean")]
    Boolean,
    #[token("this")]
    This,
    #[token("while")]
    While,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("new")]
    New,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Literals and names
    #[regex("[0-9]+")]
    Num,
    #[regex("[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,
    #[regex("_[a-zA-Z0-9_]*")]
    InvalidIdent,

    // Operators
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    // Comments
    #[regex(r"//[^\n\r]*")]
    Comment,
    /// Only emitted when the comment never closes; closed ones are skipped.
    #[token("/*", block_comment)]
    UnterminatedComment,

    // Produced by the scanner, never by the automaton
    Eot,
    Error,
}

/// Consume a block comment through the first `*/`. Without one the rest of
/// the input is swallowed and the token is emitted as unterminated.
fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> Filter<()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            Filter::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            Filter::Emit(())
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Class => "'class'",
            TokenKind::Public => "'public'",
            TokenKind::Private => "'private'",
            TokenKind::Static => "'static'",
            TokenKind::Void => "'void'",
            TokenKind::Return => "'return'",
            TokenKind::Int => "'int'",
            TokenKind::Boolean => "'boolean'",
            TokenKind::This => "'this'",
            TokenKind::While => "'while'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::New => "'new'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
            TokenKind::Num => "integer literal",
            TokenKind::Ident | TokenKind::InvalidIdent => "identifier",
            TokenKind::EqEq => "'=='",
            TokenKind::BangEq => "'!='",
            TokenKind::Eq => "'='",
            TokenKind::Bang => "'!'",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Semi => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Comment => "comment",
            TokenKind::UnterminatedComment => "'/*'",
            TokenKind::Eot => "end of file",
            TokenKind::Error => "invalid token",
        };
        write!(f, "{s}")
    }
}

/// A scanned token. Never mutated after the scanner hands it out.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self { kind, text: text.into(), span }
    }
}
