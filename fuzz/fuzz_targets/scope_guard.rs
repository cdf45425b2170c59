#![no_main]

//! The substitution guard must answer for any document and any position.

use docfix_domain::scope;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct GuardInput {
    document: String,
    line: u16,
    column: u16,
    subs: String,
}

fuzz_target!(|input: GuardInput| {
    let lines: Vec<&str> = input.document.lines().collect();
    let line = usize::from(input.line);
    let column = usize::from(input.column);

    let allowed = scope::replacement_allowed(&lines, line, column);
    if let Some(text) = lines.get(line)
        && scope::inside_inline_literal(text, column)
    {
        assert!(!allowed);
    }

    let empty = scope::SubstitutionSet::new();
    let resolved = scope::resolve_subs(&input.subs, &empty);
    if input.subs.trim().eq_ignore_ascii_case("none") {
        assert!(resolved.is_empty());
    }
});
