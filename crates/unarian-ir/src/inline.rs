//! Call-site inlining for single-branch, call-free programs.

use unarian_ast::{Branch, Instruction, Program, ProgramMap};

/// Whether a program can be spliced textually into its call sites: exactly
/// one branch, containing no calls.
///
/// A single call-free branch cannot backtrack, so substitution preserves
/// both the counter arithmetic and the failure behavior.
fn can_inline(program: &Program) -> bool {
    match program.branches() {
        [only] => only
            .instructions()
            .iter()
            .all(|inst| !matches!(inst, Instruction::Call(_))),
        _ => false,
    }
}

/// Run one inlining pass over the map.
///
/// Inlinable programs (never the entry) are moved into a side map, every
/// remaining branch is rewritten with their bodies spliced in place of the
/// calls, and the side map is restored afterwards so pattern recognition can
/// still see the inlined functions. Returns true when at least one call was
/// rewritten.
pub fn inline_programs(programs: &mut ProgramMap, entry: &str) -> bool {
    let inlinable_names: Vec<String> = programs
        .iter()
        .filter(|(name, program)| name.as_str() != entry && can_inline(program))
        .map(|(name, _)| name.clone())
        .collect();

    let mut inlinable = ProgramMap::new();
    for name in inlinable_names {
        let program = programs
            .shift_remove(&name)
            .expect("inlinable name was just listed");
        inlinable.insert(name, program);
    }

    let mut rewrote = false;
    for (_, program) in programs.iter_mut() {
        *program = inline_program(program, &inlinable, &mut rewrote);
    }

    // Restore the separated programs; they stay addressable and recognizable.
    for (name, program) in inlinable {
        programs.insert(name, program);
    }

    rewrote
}

/// Rewrite one program, splicing inlinable callees into each branch.
fn inline_program(program: &Program, inlinable: &ProgramMap, rewrote: &mut bool) -> Program {
    let branches = program
        .branches()
        .iter()
        .map(|branch| inline_branch(branch, inlinable, rewrote))
        .collect();
    Program::new(branches)
}

fn inline_branch(branch: &Branch, inlinable: &ProgramMap, rewrote: &mut bool) -> Branch {
    let mut instructions = Vec::with_capacity(branch.instructions().len());

    for inst in branch.instructions() {
        match inst {
            Instruction::Call(name) => match inlinable.get(name) {
                Some(target) => {
                    instructions.extend_from_slice(target.branches()[0].instructions());
                    *rewrote = true;
                }
                None => instructions.push(inst.clone()),
            },
            other => instructions.push(other.clone()),
        }
    }

    Branch::new(instructions)
}
