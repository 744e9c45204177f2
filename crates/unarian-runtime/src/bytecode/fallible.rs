//! Can-fail analysis over the program map.

use std::collections::HashMap;

use unarian_ast::{Branch, Instruction, Program, ProgramMap};

/// Memoized "can this function fail?" predicate.
///
/// A branch can fail iff it contains a failing primitive or a call to a
/// failing function; a function can fail iff *every* branch can — one safe
/// branch is a fallback that always succeeds, so the function as a whole
/// cannot produce ⊥.
///
/// Recursion is broken by tentatively recording "can fail" for the function
/// under analysis. The tentative answer only ever over-approximates: a
/// branch judged safe under it stays safe once the answer is downgraded, so
/// the downgrade is valid, and an over-approximation elsewhere merely emits
/// a failure check that never fires.
pub(crate) struct Fallibility<'a> {
    programs: &'a ProgramMap,
    memo: HashMap<String, bool>,
}

impl<'a> Fallibility<'a> {
    pub fn new(programs: &'a ProgramMap) -> Self {
        Self {
            programs,
            memo: HashMap::new(),
        }
    }

    /// Whether a call to `name` can produce ⊥.
    ///
    /// Unknown names are reported as fallible; the compiler surfaces the
    /// missing definition as an error when it patches the call site.
    pub fn can_fail(&mut self, name: &str) -> bool {
        if let Some(&known) = self.memo.get(name) {
            return known;
        }
        let programs = self.programs;
        let Some(program) = programs.get(name) else {
            return true;
        };

        self.memo.insert(name.to_string(), true);
        let result = self.program_can_fail(program);
        self.memo.insert(name.to_string(), result);
        result
    }

    fn program_can_fail(&mut self, program: &Program) -> bool {
        program
            .branches()
            .iter()
            .all(|branch| self.branch_can_fail(branch))
    }

    fn branch_can_fail(&mut self, branch: &Branch) -> bool {
        branch.instructions().iter().any(|inst| match inst {
            Instruction::Call(callee) => self.can_fail(callee),
            other => other.can_fail(),
        })
    }
}
