use super::*;
use num_bigint::BigUint;
use unarian_ast::{DivMode, Instruction, Program};
use unarian_parser::{parse_expression, parse_file};

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

/// Test helper: parse, register an entry expression, optimize.
fn optimized(source: &str, expr: &str) -> (ProgramMap, String) {
    let mut programs = parse_file(source, false).expect("parse failed");
    let entry = parse_expression(expr, &mut programs).expect("expression parse failed");
    (optimize_programs(programs, &entry), entry)
}

#[test]
fn test_multiply_chain() {
    let (programs, entry) = optimized("mul3 { - mul3 + + + | }", "mul3");
    assert_eq!(
        programs["mul3"],
        Program::single(vec![Instruction::Mul(big(3))])
    );
    // The closed form is inlined into the entry
    assert_eq!(
        programs[&entry],
        Program::single(vec![Instruction::Mul(big(3))])
    );
}

#[test]
fn test_identity_recursion_is_mul_one() {
    let (programs, _) = optimized("add { - add + | }", "add");
    assert_eq!(
        programs["add"],
        Program::single(vec![Instruction::Mul(big(1))])
    );
}

#[test]
fn test_stdlib_closed_forms() {
    let (programs, _) = optimized(STDLIB, "");
    assert_eq!(programs["0"], Program::single(vec![Instruction::Mul(big(0))]));
    assert_eq!(programs["*"], Program::single(vec![Instruction::Mul(big(0))]));
    assert_eq!(programs["not"], Program::single(vec![Instruction::Not]));
    assert_eq!(
        programs["="],
        Program::single(vec![Instruction::Equal(big(0))])
    );
}

#[test]
fn test_divide_floor_chain() {
    let source = format!("{STDLIB}half {{ - - half + | * }}");
    let (programs, _) = optimized(&source, "half");
    assert_eq!(
        programs["half"],
        Program::single(vec![Instruction::Div(big(2), DivMode::Floor)])
    );
}

#[test]
fn test_divide_fail_chain() {
    let source = format!("{STDLIB}halfExact {{ - - halfExact + | = }}");
    let (programs, _) = optimized(&source, "halfExact");
    assert_eq!(
        programs["halfExact"],
        Program::single(vec![Instruction::Div(big(2), DivMode::Fail)])
    );
}

#[test]
fn test_mod_equal_chain() {
    let source = format!(
        "{STDLIB}=2 {{ - - = + + }}\nmod3is2 {{ - - - mod3is2 + + + | =2 }}"
    );
    let (programs, _) = optimized(&source, "mod3is2");
    assert_eq!(
        programs["=2"],
        Program::single(vec![Instruction::Equal(big(2))])
    );
    assert_eq!(
        programs["mod3is2"],
        Program::single(vec![Instruction::ModEqual(big(2), big(3))])
    );
}

#[test]
fn test_entry_survives_optimization() {
    let (programs, entry) = optimized("", "- | +");
    assert_eq!(
        programs[&entry],
        Program::new(vec![
            unarian_ast::Branch::new(vec![Instruction::Sub(big(1))]),
            unarian_ast::Branch::new(vec![Instruction::Add(big(1))]),
        ])
    );
}

#[test]
fn test_debug_print_survives() {
    let mut programs = parse_file("f { ! + }", true).unwrap();
    let entry = parse_expression("f", &mut programs).unwrap();
    let programs = optimize_programs(programs, &entry);
    assert_eq!(
        programs[&entry],
        Program::single(vec![
            Instruction::DebugPrint,
            Instruction::Add(big(1)),
        ])
    );
}

#[test]
fn test_noop_debug_disappears() {
    let (programs, entry) = optimized("f { ! + }", "f");
    assert_eq!(
        programs[&entry],
        Program::single(vec![Instruction::Add(big(1))])
    );
}

#[test]
fn test_unknown_shape_untouched() {
    // A genuinely branching program stays a branching program
    let (programs, _) = optimized("dec2 { - - | }", "dec2");
    assert_eq!(
        programs["dec2"],
        Program::new(vec![
            unarian_ast::Branch::new(vec![Instruction::Sub(big(2))]),
            unarian_ast::Branch::new(vec![]),
        ])
    );
}
