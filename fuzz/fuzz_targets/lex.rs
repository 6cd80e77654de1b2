#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must scan to completion without panicking.
    if let Ok(s) = std::str::from_utf8(data) {
        let (tokens, _errors) = minijava::lexer::lex(s);
        assert!(!tokens.is_empty());
    }
});
