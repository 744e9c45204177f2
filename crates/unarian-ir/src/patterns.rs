//! Whole-function pattern recognition.
//!
//! Unarian programs express arithmetic through recursion: multiply-by-k
//! peels one off the counter, recurses, and adds k back; divide-by-k peels k
//! off and adds one back. After inlining and condensation these idioms have
//! a small closed set of shapes, and a function matching one is replaced by
//! a single closed-form instruction. That in turn makes it inlinable, so
//! callers see the closed form on the next optimizer pass.
//!
//! Recognizers are tried in order; the first match wins:
//!
//! | Shape (branches) | Replacement |
//! |---|---|
//! | `[Sub(1), f, Add(k)]` / `[Sub(1), f]`, `[]` | `Mul(k)` / `Mul(0)` |
//! | `[Sub(k), f, Add(1)]`, `[Mul(0)]` | `Div(k, Floor)` |
//! | `[Sub(k), f, Add(1)]`, `[Equal(0)]` | `Div(k, Fail)` |
//! | `[Sub(m), f, Add(m)]`, `[Equal(r)]` | `ModEqual(r, m)` |
//! | `[Not, Sub(1)]` | `Equal(0)` |
//! | `[Sub(1), Mul(0)]`, `[Add(1)]` | `Not` |
//! | `[Sub(n), Equal(0), Add(n)]` | `Equal(n)` |
//!
//! The last shape is not recursive; it is the condensed remnant of an
//! equality check against a nonzero constant, and recognizing it is what
//! lets the `ModEqual` shape's second branch appear as a bare `Equal(r)`.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::trace;
use unarian_ast::{DivMode, Instruction, Program, ProgramMap};

/// Replace every function whose shape matches a known idiom with its
/// closed-form single-instruction program. Returns true when at least one
/// function was rewritten.
pub fn simplify_programs(programs: &mut ProgramMap) -> bool {
    let mut changed = false;

    let names: Vec<String> = programs.keys().cloned().collect();
    for name in names {
        if let Some(inst) = recognize(&name, &programs[&name]) {
            trace!(function = %name, closed_form = %inst, "recognized arithmetic idiom");
            programs[&name] = Program::single(vec![inst]);
            changed = true;
        }
    }

    changed
}

/// Try each recognizer in order on one named program.
fn recognize(name: &str, program: &Program) -> Option<Instruction> {
    check_multiply(name, program)
        .or_else(|| check_divide(name, program))
        .or_else(|| check_mod_equal(name, program))
        .or_else(|| check_equal_zero(program))
        .or_else(|| check_not(program))
        .or_else(|| check_equal(program))
}

/// `f { - f +×k | }` → `Mul(k)`; the two-instruction form with no trailing
/// adds is `Mul(0)`.
fn check_multiply(name: &str, program: &Program) -> Option<Instruction> {
    let [recurse, base] = program.branches() else {
        return None;
    };
    if !base.is_empty() {
        return None;
    }

    match recurse.instructions() {
        [Instruction::Sub(one), Instruction::Call(callee)]
            if one.is_one() && callee == name =>
        {
            Some(Instruction::Mul(BigUint::zero()))
        }
        [Instruction::Sub(one), Instruction::Call(callee), Instruction::Add(k)]
            if one.is_one() && callee == name =>
        {
            Some(Instruction::Mul(k.clone()))
        }
        _ => None,
    }
}

/// `f { -×k f + | * }` → `Div(k, Floor)`; with `=` as the base case instead
/// of `*`, the division fails on a remainder: `Div(k, Fail)`.
fn check_divide(name: &str, program: &Program) -> Option<Instruction> {
    let [recurse, base] = program.branches() else {
        return None;
    };

    let k = match recurse.instructions() {
        [Instruction::Sub(k), Instruction::Call(callee), Instruction::Add(one)]
            if one.is_one() && callee == name =>
        {
            k
        }
        _ => return None,
    };

    match base.instructions() {
        [Instruction::Mul(zero)] if zero.is_zero() => {
            Some(Instruction::Div(k.clone(), DivMode::Floor))
        }
        [Instruction::Equal(zero)] if zero.is_zero() => {
            Some(Instruction::Div(k.clone(), DivMode::Fail))
        }
        _ => None,
    }
}

/// `f { -×m f +×m | equal(r) }` → `ModEqual(r, m)`: succeeds (leaving the
/// counter untouched) exactly when the counter is congruent to r mod m.
fn check_mod_equal(name: &str, program: &Program) -> Option<Instruction> {
    let [recurse, base] = program.branches() else {
        return None;
    };

    let modulus = match recurse.instructions() {
        [Instruction::Sub(m), Instruction::Call(callee), Instruction::Add(back)]
            if callee == name && back == m =>
        {
            m
        }
        _ => return None,
    };

    match base.instructions() {
        [Instruction::Equal(rem)] => {
            Some(Instruction::ModEqual(rem.clone(), modulus.clone()))
        }
        _ => None,
    }
}

/// `{ not - }` condensed: `[Not, Sub(1)]` → `Equal(0)`.
fn check_equal_zero(program: &Program) -> Option<Instruction> {
    let [only] = program.branches() else {
        return None;
    };
    match only.instructions() {
        [Instruction::Not, Instruction::Sub(one)] if one.is_one() => {
            Some(Instruction::Equal(BigUint::zero()))
        }
        _ => None,
    }
}

/// `f { - * | + }` → `Not`.
fn check_not(program: &Program) -> Option<Instruction> {
    let [nonzero, zero] = program.branches() else {
        return None;
    };

    let nonzero_matches = matches!(
        nonzero.instructions(),
        [Instruction::Sub(one), Instruction::Mul(z)] if one.is_one() && z.is_zero()
    );
    let zero_matches = matches!(
        zero.instructions(),
        [Instruction::Add(one)] if one.is_one()
    );

    (nonzero_matches && zero_matches).then_some(Instruction::Not)
}

/// `[Sub(n), Equal(0), Add(n)]` → `Equal(n)`: both fail exactly when the
/// counter differs from n, and both leave n behind on success.
fn check_equal(program: &Program) -> Option<Instruction> {
    let [only] = program.branches() else {
        return None;
    };
    match only.instructions() {
        [Instruction::Sub(n), Instruction::Equal(zero), Instruction::Add(back)]
            if zero.is_zero() && back == n =>
        {
            Some(Instruction::Equal(n.clone()))
        }
        _ => None,
    }
}
