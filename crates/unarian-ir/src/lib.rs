// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Optimization passes over the Unarian IR.
//!
//! The optimizer recovers closed-form arithmetic from the unary-only surface
//! syntax. It runs three passes to a fixed point:
//!
//! 1. **Inlining** ([`inline`]) — programs with a single branch and no calls
//!    are spliced into their call sites.
//! 2. **Math condensation** ([`condense`]) — runs of primitive arithmetic
//!    within a branch are folded algebraically into single instructions.
//! 3. **Pattern recognition** ([`patterns`]) — whole functions whose shape
//!    matches a known recursive idiom (multiply, divide, modulo check,
//!    equality, boolean not) are replaced by one closed-form instruction.
//!
//! The passes feed each other: recognition turns a recursive function into a
//! single instruction, which makes it inlinable, which exposes new runs for
//! condensation, which exposes new shapes for recognition. The fixed point
//! terminates because every inlining removes a call site or a function name
//! and the other passes are idempotent.
//!
//! The optimizer is total: it cannot fail, and it preserves observable
//! behavior (final counter or ⊥, plus the debug-print sequence) for every
//! input.

pub mod condense;
pub mod inline;
pub mod patterns;

use tracing::debug;
use unarian_ast::ProgramMap;

/// Optimize a whole program map.
///
/// `entry` names the entry-point program, which is never inlined away (the
/// compiler must still be able to address it); its branches are still
/// rewritten like any other program's.
pub fn optimize_programs(mut programs: ProgramMap, entry: &str) -> ProgramMap {
    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut changed = inline::inline_programs(&mut programs, entry);
        changed |= condense::condense_programs(&mut programs);
        changed |= patterns::simplify_programs(&mut programs);
        if !changed {
            break;
        }
    }
    debug!(passes, functions = programs.len(), "optimizer reached fixed point");
    programs
}

#[cfg(test)]
mod tests;
