//! Algebraic condensation of primitive arithmetic runs.
//!
//! Within a branch, consecutive `Add`/`Sub`/`Mul`/`Div` instructions are
//! folded into four accumulators representing the pending computation
//! `((x - sub) / div) * mul + add`. Any non-arithmetic instruction (or the
//! end of the branch) flushes the accumulators in the order
//! **sub → div → mul → add**: the potentially-failing subtraction first,
//! then the multiplicative scaling, then the additive offset.
//!
//! The accumulators maintain two invariants:
//!
//! - at most one of `add`/`sub` is nonzero;
//! - while `sub` is nonzero, `mul` and `div` are neutral (a subtraction
//!   cannot commute across scaling, so scaling is flushed first).
//!
//! Neutral values are elided on flush: no `Add(0)`, `Sub(0)`, `Mul(1)` or
//! `Div(1, _)` is ever emitted.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use unarian_ast::{Branch, DivMode, Instruction, Program, ProgramMap};

/// Condense every branch of every program. Returns true when anything
/// changed.
pub fn condense_programs(programs: &mut ProgramMap) -> bool {
    let mut changed = false;
    for (_, program) in programs.iter_mut() {
        let condensed = condense_program(program);
        if condensed != *program {
            *program = condensed;
            changed = true;
        }
    }
    changed
}

fn condense_program(program: &Program) -> Program {
    Program::new(program.branches().iter().map(condense_branch).collect())
}

fn condense_branch(branch: &Branch) -> Branch {
    let mut out = Vec::new();
    let mut acc = Accumulators::new();

    for inst in branch.instructions() {
        match inst {
            Instruction::Add(n) => acc.add(n, &mut out),
            Instruction::Sub(n) => acc.sub(n, &mut out),
            Instruction::Mul(n) => acc.mul(n, &mut out),
            Instruction::Div(n, mode) => acc.div(n, *mode, &mut out),
            other => {
                acc.flush(&mut out);
                out.push(other.clone());
            }
        }
    }

    acc.flush(&mut out);
    Branch::new(out)
}

/// The pending computation `((x - sub) / div) * mul + add`.
struct Accumulators {
    add: BigUint,
    sub: BigUint,
    mul: BigUint,
    div: BigUint,
    /// Mode of the pending division; meaningless while `div` is 1.
    div_mode: DivMode,
}

impl Accumulators {
    fn new() -> Self {
        Self {
            add: BigUint::zero(),
            sub: BigUint::zero(),
            mul: BigUint::one(),
            div: BigUint::one(),
            div_mode: DivMode::Floor,
        }
    }

    fn add(&mut self, n: &BigUint, out: &mut Vec<Instruction>) {
        // An addition cannot cancel against a pending subtraction: the
        // subtraction fails first. Flush and start over.
        if !self.sub.is_zero() {
            self.flush(out);
        }
        self.add += n;
    }

    fn sub(&mut self, n: &BigUint, out: &mut Vec<Instruction>) {
        if *n <= self.add {
            // x + add - n never dips below zero while add covers n.
            self.add -= n;
            return;
        }
        // The subtrahend outgrows the additive offset. Scaling cannot stay
        // pending across a subtraction, so emit it; the leftover offset is
        // folded into the subtrahend (x + add - n ≡ x - (n - add), both
        // failing exactly when x < n - add).
        let rest = n - &self.add;
        self.add.set_zero();
        self.flush_div(out);
        self.flush_mul(out);
        self.sub += rest;
    }

    fn mul(&mut self, n: &BigUint, out: &mut Vec<Instruction>) {
        self.flush_sub(out);
        if n.is_zero() {
            // The result is pinned to zero no matter what came before, but a
            // pending exact division still has to fail first. A pending
            // floor division is dead.
            if self.div_mode == DivMode::Fail {
                self.flush_div(out);
            } else {
                self.div.set_one();
            }
            self.add.set_zero();
            self.mul.set_zero();
        } else {
            self.flush_div(out);
            self.mul *= n;
            self.add *= n;
        }
    }

    fn div(&mut self, n: &BigUint, mode: DivMode, out: &mut Vec<Instruction>) {
        if !self.sub.is_zero() || !self.mul.is_one() || !self.add.is_zero() {
            // Anything pending after the division point blocks the merge.
            self.flush(out);
        } else if !self.div.is_one() && self.div_mode != mode {
            self.flush_div(out);
        }
        self.div *= n;
        self.div_mode = mode;
    }

    /// Emit the pending computation in the order sub → div → mul → add.
    fn flush(&mut self, out: &mut Vec<Instruction>) {
        self.flush_sub(out);
        self.flush_div(out);
        self.flush_mul(out);
        self.flush_add(out);
    }

    fn flush_sub(&mut self, out: &mut Vec<Instruction>) {
        if !self.sub.is_zero() {
            out.push(Instruction::Sub(std::mem::take(&mut self.sub)));
        }
    }

    fn flush_div(&mut self, out: &mut Vec<Instruction>) {
        if !self.div.is_one() {
            let div = std::mem::replace(&mut self.div, BigUint::one());
            out.push(Instruction::Div(div, self.div_mode));
        }
    }

    fn flush_mul(&mut self, out: &mut Vec<Instruction>) {
        if !self.mul.is_one() {
            let mul = std::mem::replace(&mut self.mul, BigUint::one());
            out.push(Instruction::Mul(mul));
        }
    }

    fn flush_add(&mut self, out: &mut Vec<Instruction>) {
        if !self.add.is_zero() {
            out.push(Instruction::Add(std::mem::take(&mut self.add)));
        }
    }
}
