//! Integration tests for end-to-end Unarian evaluation.
//!
//! These tests verify the full pipeline:
//! Parse → Optimize → Compile → Execute → Verify

use num_bigint::BigUint;
use unarian_ast::{DivMode, Instruction, Program};
use unarian_tests::TestHarness;

/// The canonical arithmetic helpers from the Unarian standard library.
const STDLIB: &str = "\
    0 { - 0 | }\n\
    * { 0 }\n\
    not { - * | + }\n\
    = { not - }\n\
";

fn big(n: u64) -> BigUint {
    BigUint::from(n)
}

/// Evaluate without the optimizer, for soundness comparisons.
fn eval_unoptimized(source: &str, expr: &str, input: u64) -> Option<u64> {
    let mut programs = unarian_parser::parse_file(source, false).expect("parse failed");
    let entry = unarian_parser::parse_expression(expr, &mut programs).expect("bad expression");
    let module = unarian_runtime::compile(&programs, &entry).expect("compile failed");
    let vm: unarian_runtime::Vm<BigUint> =
        unarian_runtime::Vm::new(&module).expect("VM construction failed");
    let mut out = Vec::new();
    vm.run(big(input), &mut out)
        .expect("execution failed")
        .map(|n| u64::try_from(&n).expect("result exceeds u64"))
}

/// A bare increment evaluates the counter through the `+` primitive.
#[test]
fn test_increment_smoke() {
    let harness = TestHarness::from_source("inc { + }", "inc");
    assert_eq!(harness.eval(5), Some(6));
    assert_eq!(harness.eval(0), Some(1));
}

/// `mul3 { - mul3 + + + | }` optimizes to a closed-form multiply.
#[test]
fn test_multiply_by_three() {
    let harness = TestHarness::from_source("mul3 { - mul3 + + + | }", "mul3");
    assert_eq!(
        harness.optimized()["mul3"],
        Program::single(vec![Instruction::Mul(big(3))])
    );
    assert_eq!(harness.eval(7), Some(21));
    assert_eq!(harness.eval(0), Some(0));
}

/// `half { - - half + | * }` optimizes to floor division by two.
#[test]
fn test_divide_by_two_floor() {
    let source = format!("{STDLIB}half {{ - - half + | * }}");
    let harness = TestHarness::from_source(&source, "half");
    assert_eq!(
        harness.optimized()["half"],
        Program::single(vec![Instruction::Div(big(2), DivMode::Floor)])
    );
    assert_eq!(harness.eval(7), Some(3));
    assert_eq!(harness.eval(8), Some(4));
    assert_eq!(harness.eval(0), Some(0));
}

/// `halfExact { - - halfExact + | = }` fails on odd input.
#[test]
fn test_divide_by_two_exact() {
    let source = format!("{STDLIB}halfExact {{ - - halfExact + | = }}");
    let harness = TestHarness::from_source(&source, "halfExact");
    assert_eq!(
        harness.optimized()["halfExact"],
        Program::single(vec![Instruction::Div(big(2), DivMode::Fail)])
    );
    assert_eq!(harness.eval(8), Some(4));
    assert_eq!(harness.eval(7), None);
}

/// `not { - * | + }` maps zero to one and everything else to zero.
#[test]
fn test_not() {
    let harness = TestHarness::from_source(STDLIB, "not");
    assert_eq!(harness.eval(0), Some(1));
    assert_eq!(harness.eval(5), Some(0));
}

/// `dec2 { - - | }` on 1: the first branch fails after one decrement and
/// the empty branch returns the pristine input. Verifies the saved-value
/// restore on branch failure.
#[test]
fn test_branch_restore() {
    let harness = TestHarness::from_source("dec2 { - - | }", "dec2");
    assert_eq!(harness.eval(1), Some(1));
    assert_eq!(harness.eval(0), Some(0));
    assert_eq!(harness.eval(5), Some(3));
}

/// A failing callee restores the caller's counter for its next branch.
#[test]
fn test_failure_locality_across_calls() {
    let source = "dec5 { - - - - - }\ng { dec5 + | }";
    let harness = TestHarness::from_source(source, "g");
    assert_eq!(harness.eval(7), Some(3));
    assert_eq!(harness.eval(3), Some(3));
}

/// Modulo recognition end to end: congruence checks leave the counter
/// untouched or fail.
#[test]
fn test_mod_equal() {
    let source = format!(
        "{STDLIB}=2 {{ - - = + + }}\nmod3is2 {{ - - - mod3is2 + + + | =2 }}"
    );
    let harness = TestHarness::from_source(&source, "mod3is2");
    assert_eq!(
        harness.optimized()["mod3is2"],
        Program::single(vec![Instruction::ModEqual(big(2), big(3))])
    );
    assert_eq!(harness.eval(17), Some(17));
    assert_eq!(harness.eval(2), Some(2));
    assert_eq!(harness.eval(9), None);
}

/// Composition in the entry expression: triple, then halve.
#[test]
fn test_expression_composition() {
    let source = format!("{STDLIB}mul3 {{ - mul3 + + + | }}\nhalf {{ - - half + | * }}");
    let harness = TestHarness::from_source(&source, "mul3 half");
    assert_eq!(harness.eval(5), Some(7));
    assert_eq!(harness.eval(4), Some(6));
}

/// Branch alternation in the entry expression backtracks on the initial
/// input.
#[test]
fn test_expression_branches() {
    let harness = TestHarness::from_source("", "- | +");
    assert_eq!(harness.eval(3), Some(2));
    assert_eq!(harness.eval(0), Some(1));
}

/// The optimizer must not change observable results.
#[test]
fn test_optimizer_soundness() {
    let half = format!("{STDLIB}half {{ - - half + | * }}");
    let half_exact = format!("{STDLIB}halfExact {{ - - halfExact + | = }}");
    let cases: Vec<(&str, &str)> = vec![
        ("mul3 { - mul3 + + + | }", "mul3"),
        (&half, "half"),
        (&half_exact, "halfExact"),
        (STDLIB, "not"),
        (STDLIB, "="),
        ("dec2 { - - | }", "dec2"),
        ("add { - add + | }", "add"),
        ("", "- - | +"),
    ];

    for (source, expr) in cases {
        let harness = TestHarness::from_source(source, expr);
        for input in 0..=16 {
            assert_eq!(
                harness.eval(input),
                eval_unoptimized(source, expr, input),
                "optimized and unoptimized runs disagree for {expr} on {input}"
            );
        }
    }
}

/// Debug prints are preserved by optimization and appear in order.
#[test]
fn test_debug_print_sequence() {
    let harness = TestHarness::with_debug("f { ! + ! }", "f f");
    let (result, output) = harness.eval_with_output(5);
    assert_eq!(result, Some(7));
    assert_eq!(output, "5\n6\n6\n7\n");
}

/// Without -g, `!` is a no-op and prints nothing.
#[test]
fn test_debug_print_disabled() {
    let harness = TestHarness::from_source("f { ! + ! }", "f f");
    let (result, output) = harness.eval_with_output(5);
    assert_eq!(result, Some(7));
    assert_eq!(output, "");
}

/// Compilation is byte-for-byte deterministic.
#[test]
fn test_compile_determinism() {
    let source = format!("{STDLIB}half {{ - - half + | * }}\nmul3 {{ - mul3 + + + | }}");
    let left = TestHarness::from_source(&source, "half mul3");
    let right = TestHarness::from_source(&source, "half mul3");
    assert_eq!(left.module().instructions(), right.module().instructions());
    assert_eq!(
        left.module().constants().values(),
        right.module().constants().values()
    );
    assert_eq!(left.disassembly(), right.disassembly());
}

/// The entry program is emitted first: its closed form leads the dump.
#[test]
fn test_disassembly_starts_with_entry() {
    let harness = TestHarness::from_source("mul3 { - mul3 + + + | }", "mul3");
    assert!(
        harness.disassembly().starts_with("0: MULT 3\n3: RET\n"),
        "unexpected dump:\n{}",
        harness.disassembly()
    );
}

/// No value appears twice in the constant pool.
#[test]
fn test_constant_pool_interned() {
    let source = "a { - - - } b { - - - + + + } c { + + + }";
    let harness = TestHarness::from_source(source, "a b c");
    let values = harness.module().constants().values();
    for (i, value) in values.iter().enumerate() {
        for other in &values[i + 1..] {
            assert_ne!(value, other, "constant {value} pooled twice");
        }
    }
}

/// Arbitrary precision: counters grow past machine word sizes.
#[test]
fn test_arbitrary_precision() {
    let harness = TestHarness::from_source("mul3 { - mul3 + + + | }", "mul3");
    let input = BigUint::from(2u32).pow(100);
    let expected = &input * 3u32;
    assert_eq!(harness.eval_big(input), Some(expected));
}

/// Fixed precision matches arbitrary precision inside the shared range.
#[test]
fn test_fixed_precision_agrees() {
    let source = format!("{STDLIB}half {{ - - half + | * }}");
    let harness = TestHarness::from_source(&source, "half");
    for input in [0, 1, 2, 7, 100, 1001] {
        assert_eq!(harness.eval(input), harness.eval_fixed(input));
    }
}

/// A recursion no recognizer matches stays recursive and runs deep,
/// exercising tail-call iteration and failure backtracking together.
#[test]
fn test_parity_recursion() {
    // parity { - - parity | } reduces the counter modulo two
    let harness = TestHarness::from_source("parity { - - parity | }", "parity");
    assert!(matches!(
        harness.optimized()["parity"].branches()[0].instructions(),
        [Instruction::Sub(_), Instruction::Call(_)]
    ));
    assert_eq!(harness.eval(10_000), Some(0));
    assert_eq!(harness.eval(10_001), Some(1));
}
