#![no_main]

//! Structured fixes against arbitrary documents: applying must never panic,
//! and every input fix is accounted for exactly once.

use docfix_edit::apply_fixes;
use docfix_types::{Fix, FixStrategy, FixType, Severity, Violation};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
enum StrategyChoice {
    ReplaceAtPosition,
    ReplaceLine(u8),
    InsertAtLine(u8),
    InsertCommentAbove,
}

#[derive(Debug, arbitrary::Arbitrary)]
struct FixInput {
    line: u8,
    column: u8,
    matched: String,
    replacement: String,
    strategy: StrategyChoice,
}

#[derive(Debug, arbitrary::Arbitrary)]
struct ApplyInput {
    document: String,
    fixes: Vec<FixInput>,
}

fn to_fix(input: FixInput) -> Fix {
    let violation = Violation {
        file: "fuzz.adoc".into(),
        rule_name: "Fuzz".into(),
        line: usize::from(input.line).max(1),
        column: usize::from(input.column).max(1),
        message: String::new(),
        severity: Severity::Warning,
        original_text: input.matched,
        suggested_text: None,
        check_id: "Fuzz.Fuzz".into(),
        link: None,
    };
    let strategy = match input.strategy {
        StrategyChoice::ReplaceAtPosition => FixStrategy::ReplaceAtPosition,
        StrategyChoice::ReplaceLine(line) => FixStrategy::ReplaceLine {
            line: usize::from(line),
        },
        StrategyChoice::InsertAtLine(line) => FixStrategy::InsertAtLine {
            line: usize::from(line),
        },
        StrategyChoice::InsertCommentAbove => FixStrategy::InsertCommentAbove,
    };
    Fix::new(violation, input.replacement, strategy, FixType::NonDeterministic)
}

fuzz_target!(|input: ApplyInput| {
    let fixes: Vec<Fix> = input.fixes.into_iter().map(to_fix).collect();
    let total = fixes.len();

    let outcome = apply_fixes(&input.document, fixes);
    assert_eq!(outcome.applied.len() + outcome.skipped.len(), total);
});
