#![no_main]

use libfuzzer_sys::fuzz_target;
use proctor::policy::Policy;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let verdict = Policy::default().scan(s);
        assert_eq!(verdict.allowed, verdict.violated_rule.is_none());
    }
});
