#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

/// Token-level input so the fuzzer spends its time past the scanner.
#[derive(Arbitrary, Debug)]
enum FuzzToken {
    Class,
    Public,
    Private,
    Static,
    Void,
    Int,
    Boolean,
    Return,
    If,
    Else,
    While,
    New,
    This,
    True,
    Null,
    Ident(u8),
    Num(u16),
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    EqEq,
    AmpAmp,
    Bang,
    Eq,
    Dot,
    Comma,
    Semi,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

impl FuzzToken {
    fn text(&self) -> String {
        match self {
            FuzzToken::Class => "class".into(),
            FuzzToken::Public => "public".into(),
            FuzzToken::Private => "private".into(),
            FuzzToken::Static => "static".into(),
            FuzzToken::Void => "void".into(),
            FuzzToken::Int => "int".into(),
            FuzzToken::Boolean => "boolean".into(),
            FuzzToken::Return => "return".into(),
            FuzzToken::If => "if".into(),
            FuzzToken::Else => "else".into(),
            FuzzToken::While => "while".into(),
            FuzzToken::New => "new".into(),
            FuzzToken::This => "this".into(),
            FuzzToken::True => "true".into(),
            FuzzToken::Null => "null".into(),
            FuzzToken::Ident(n) => format!("v{}", n % 4),
            FuzzToken::Num(n) => n.to_string(),
            FuzzToken::Plus => "+".into(),
            FuzzToken::Minus => "-".into(),
            FuzzToken::Star => "*".into(),
            FuzzToken::Slash => "/".into(),
            FuzzToken::Lt => "<".into(),
            FuzzToken::EqEq => "==".into(),
            FuzzToken::AmpAmp => "&&".into(),
            FuzzToken::Bang => "!".into(),
            FuzzToken::Eq => "=".into(),
            FuzzToken::Dot => ".".into(),
            FuzzToken::Comma => ",".into(),
            FuzzToken::Semi => ";".into(),
            FuzzToken::LParen => "(".into(),
            FuzzToken::RParen => ")".into(),
            FuzzToken::LBrace => "{".into(),
            FuzzToken::RBrace => "}".into(),
            FuzzToken::LBracket => "[".into(),
            FuzzToken::RBracket => "]".into(),
        }
    }
}

fuzz_target!(|tokens: Vec<FuzzToken>| {
    let source = tokens.iter().map(FuzzToken::text).collect::<Vec<_>>().join(" ");
    // Whatever parses must survive the checking phases too.
    if let Ok(program) = minijava::parser::parse(&source) {
        if let Ok(table) = minijava::typeck::identify(&program) {
            let _ = minijava::typeck::type_check_with(&program, &table);
        }
    }
});
