//! Program, branch and instruction definitions.

use std::fmt;

use indexmap::IndexMap;
use num_bigint::BigUint;

/// Mapping from function name to program.
///
/// An `IndexMap` keeps iteration deterministic for a given build history,
/// which the compiler relies on for reproducible bytecode layout. Anonymous
/// programs use a decimal index followed by a space as their name, which can
/// never collide with user identifiers (spaces delimit tokens).
pub type ProgramMap = IndexMap<String, Program>;

/// Division behavior when the divisor does not evenly divide the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DivMode {
    /// Truncate toward zero.
    Floor,
    /// Fail (⊥) unless the division is exact.
    Fail,
}

/// A single IR instruction.
///
/// `Add`, `Sub` and `Call` are what the parser produces (via the `+`, `-`
/// primitives and bare words); the remaining arithmetic variants only come
/// into existence through optimization. Constants are arbitrary-precision
/// non-negative integers.
///
/// `Sub`, `Equal`, `ModEqual` and `Div(_, Fail)` are the only variants that
/// can fail; all others always succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Add a constant to the counter. The constant is ≥ 1.
    Add(BigUint),
    /// Subtract a constant, failing if the counter is smaller. The constant
    /// is ≥ 1.
    Sub(BigUint),
    /// Multiply the counter by a constant (which may be 0).
    Mul(BigUint),
    /// Divide the counter by a constant ≥ 1, truncating or failing per the
    /// mode.
    Div(BigUint, DivMode),
    /// Fail unless the counter equals the constant.
    Equal(BigUint),
    /// Fail unless the counter is congruent to the remainder modulo the
    /// modulus. Fields are (remainder, modulus).
    ModEqual(BigUint, BigUint),
    /// Replace the counter with 1 if it is 0, with 0 otherwise.
    Not,
    /// Print the counter to the debug sink.
    DebugPrint,
    /// Call the named program.
    Call(String),
}

impl Instruction {
    /// Whether executing this instruction can ever produce ⊥.
    ///
    /// For `Call` this is a conservative `true`; the compiler's can-fail
    /// analysis refines call sites using the callee's branches.
    pub fn can_fail(&self) -> bool {
        matches!(
            self,
            Instruction::Sub(_)
                | Instruction::Equal(_)
                | Instruction::ModEqual(_, _)
                | Instruction::Div(_, DivMode::Fail)
                | Instruction::Call(_)
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Add(n) => write!(f, "add({n})"),
            Instruction::Sub(n) => write!(f, "sub({n})"),
            Instruction::Mul(n) => write!(f, "mul({n})"),
            Instruction::Div(n, DivMode::Floor) => write!(f, "div({n})"),
            Instruction::Div(n, DivMode::Fail) => write!(f, "div_exact({n})"),
            Instruction::Equal(n) => write!(f, "equal({n})"),
            Instruction::ModEqual(r, m) => write!(f, "mod_equal({r}, {m})"),
            Instruction::Not => write!(f, "not"),
            Instruction::DebugPrint => write!(f, "print"),
            Instruction::Call(name) => write!(f, "call({name})"),
        }
    }
}

/// An ordered instruction sequence, executed left to right.
///
/// If any instruction fails, the branch as a whole fails and control moves
/// to the next alternative of the enclosing program with the counter
/// restored to the value the program was entered with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Branch {
    instructions: Vec<Instruction>,
}

impl Branch {
    /// Create a branch from its instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// The instructions, in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// True when the branch contains no instructions (always succeeds,
    /// leaving the counter untouched).
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// A program: one or more alternative branches, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    branches: Vec<Branch>,
}

impl Program {
    /// Create a program from its branches.
    ///
    /// # Panics
    ///
    /// Panics if `branches` is empty; every program has at least one branch
    /// (the parser produces an empty branch for an empty group).
    pub fn new(branches: Vec<Branch>) -> Self {
        assert!(!branches.is_empty(), "a program needs at least one branch");
        Self { branches }
    }

    /// Convenience constructor for a single-branch program.
    pub fn single(instructions: Vec<Instruction>) -> Self {
        Self::new(vec![Branch::new(instructions)])
    }

    /// The alternative branches, in trial order.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn test_can_fail_classification() {
        let one = BigUint::one();
        assert!(Instruction::Sub(one.clone()).can_fail());
        assert!(Instruction::Equal(one.clone()).can_fail());
        assert!(Instruction::Div(one.clone(), DivMode::Fail).can_fail());
        assert!(Instruction::ModEqual(one.clone(), one.clone()).can_fail());
        assert!(Instruction::Call("f".to_string()).can_fail());

        assert!(!Instruction::Add(one.clone()).can_fail());
        assert!(!Instruction::Mul(one.clone()).can_fail());
        assert!(!Instruction::Div(one, DivMode::Floor).can_fail());
        assert!(!Instruction::Not.can_fail());
        assert!(!Instruction::DebugPrint.can_fail());
    }

    #[test]
    #[should_panic(expected = "at least one branch")]
    fn test_empty_program_rejected() {
        let _ = Program::new(vec![]);
    }
}
