#![no_main]

use libfuzzer_sys::fuzz_target;
use proctor_syntax::{lexer, parser};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(tokens) = lexer::lex(s) {
            let _ = parser::parse(&tokens);
        }
    }
});
