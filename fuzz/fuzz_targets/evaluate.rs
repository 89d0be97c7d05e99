#![no_main]

//! Arbitrary learner code against a fixed test script. The engine must always answer with a result,
//! whatever the input does.

use libfuzzer_sys::fuzz_target;
use proctor::evaluate;

fuzz_target!(|data: &[u8]| {
    if let Ok(learner) = std::str::from_utf8(data) {
        let result = evaluate(learner, "test('runs', () => expect(userCode).toBeDefined())", 200);
        assert_eq!(result.total, result.passed_count + result.failed_count);
        assert!(!result.passed || result.fatal_error.is_none());
    }
});
