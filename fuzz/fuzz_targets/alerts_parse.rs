#![no_main]

//! Arbitrary bytes as a linter payload must never panic the parser.

use docfix_alerts::AlertParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let parser = AlertParser::new("docs");
    if let Ok(violations) = parser.parse(raw) {
        for v in &violations {
            assert!(v.line >= 1);
            assert!(v.column >= 1);
            assert!(!v.rule_name.contains('.'));
        }
    }
});
