//! IR → bytecode lowering.
//!
//! # Emission strategy
//!
//! The entry program is emitted first, at offset 0, followed by every other
//! program in ascending name order (so layout does not depend on how the
//! map was built). Call targets are emitted as 4-byte placeholders and
//! recorded as unresolved references; once every program's start offset is
//! known, the placeholders are patched.
//!
//! # Failure checks
//!
//! A program of k branches becomes k blocks, each ending in `Ret`. After
//! every potentially-failing operation the compiler places exactly one
//! check:
//!
//! - `JumpOnFailure <next branch>` when a later branch can still run (the
//!   target is patched once the current branch is fully emitted);
//! - `RetOnFailure` in the last branch, except after the very last
//!   instruction, where the following `Ret` already propagates ⊥.
//!
//! # Tail calls
//!
//! A call in final position becomes `TailCall` when the callee cannot fail
//! or no later branch needs the current frame's saved counter restored
//! (i.e. this is the last branch). `TailCall` reuses the frame, so
//! unbounded recursion in final position runs in constant stack space.

use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::One;
use tracing::debug;
use unarian_ast::{Branch, DivMode, Instruction, Program, ProgramMap};

use crate::bytecode::fallible::Fallibility;
use crate::bytecode::module::BytecodeModule;
use crate::bytecode::opcode::OpCode;
use crate::bytecode::pool::ConstantPool;

/// Compilation error.
///
/// Both variants are internal-invariant violations: the parser guarantees
/// resolvable names, and real programs get nowhere near 65536 distinct
/// constants. They are surfaced as errors rather than panics all the same.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A call site references a name the map does not define.
    #[error("call to undefined function {name}")]
    UnknownFunction { name: String },

    /// More distinct constants than a 16-bit pool index can address.
    #[error("constant pool exhausted")]
    PoolOverflow,
}

/// Lower an optimized program map to bytecode.
///
/// # Errors
///
/// Returns a [`CompileError`] when `entry` or a call target is not in the
/// map, or the constant pool overflows.
pub fn compile(programs: &ProgramMap, entry: &str) -> Result<BytecodeModule, CompileError> {
    Compiler::new(programs).compile(entry)
}

/// An emitted 4-byte address slot awaiting its callee's start offset.
struct CallSite<'a> {
    patch_at: usize,
    callee: &'a str,
}

struct Compiler<'a> {
    programs: &'a ProgramMap,
    code: Vec<u8>,
    constants: ConstantPool,
    fallible: Fallibility<'a>,
    call_sites: Vec<CallSite<'a>>,
    starts: HashMap<&'a str, u32>,
}

impl<'a> Compiler<'a> {
    fn new(programs: &'a ProgramMap) -> Self {
        Self {
            programs,
            code: Vec::new(),
            constants: ConstantPool::new(),
            fallible: Fallibility::new(programs),
            call_sites: Vec::new(),
            starts: HashMap::new(),
        }
    }

    fn compile(mut self, entry: &str) -> Result<BytecodeModule, CompileError> {
        let programs = self.programs;

        let Some((entry_name, entry_program)) = programs.get_key_value(entry) else {
            return Err(CompileError::UnknownFunction {
                name: entry.to_string(),
            });
        };
        self.starts.insert(entry_name, 0);
        self.emit_program(entry_program)?;

        let mut names: Vec<&'a String> = programs
            .keys()
            .filter(|name| name.as_str() != entry)
            .collect();
        names.sort();

        for name in names {
            self.starts.insert(name, self.code.len() as u32);
            self.emit_program(&programs[name.as_str()])?;
        }

        let call_sites = std::mem::take(&mut self.call_sites);
        for site in call_sites {
            let Some(&target) = self.starts.get(site.callee) else {
                return Err(CompileError::UnknownFunction {
                    name: site.callee.to_string(),
                });
            };
            self.patch_addr(site.patch_at, target);
        }

        debug!(
            bytes = self.code.len(),
            constants = self.constants.len(),
            functions = programs.len(),
            "lowered program map to bytecode"
        );
        Ok(BytecodeModule::new(self.code, self.constants))
    }

    fn emit_program(&mut self, program: &'a Program) -> Result<(), CompileError> {
        let branches = program.branches();
        for (i, branch) in branches.iter().enumerate() {
            self.emit_branch(branch, i + 1 == branches.len())?;
        }
        Ok(())
    }

    fn emit_branch(&mut self, branch: &'a Branch, last_branch: bool) -> Result<(), CompileError> {
        let mut next_branch_refs: Vec<usize> = Vec::new();
        let instructions = branch.instructions();

        for (i, inst) in instructions.iter().enumerate() {
            let last_inst = i + 1 == instructions.len();

            match inst {
                Instruction::Add(n) => {
                    if n.is_one() {
                        self.emit_op(OpCode::Inc);
                    } else {
                        self.emit_op(OpCode::Add);
                        self.emit_const(n)?;
                    }
                }
                Instruction::Sub(n) => {
                    if n.is_one() {
                        self.emit_op(OpCode::Dec);
                    } else {
                        self.emit_op(OpCode::Sub);
                        self.emit_const(n)?;
                    }
                    self.emit_failure_check(last_branch, last_inst, &mut next_branch_refs);
                }
                Instruction::Mul(n) => {
                    self.emit_op(OpCode::Mult);
                    self.emit_const(n)?;
                }
                Instruction::Div(n, DivMode::Floor) => {
                    self.emit_op(OpCode::DivFloor);
                    self.emit_const(n)?;
                }
                Instruction::Div(n, DivMode::Fail) => {
                    self.emit_op(OpCode::DivFail);
                    self.emit_const(n)?;
                    self.emit_failure_check(last_branch, last_inst, &mut next_branch_refs);
                }
                Instruction::Equal(n) => {
                    self.emit_op(OpCode::Equal);
                    self.emit_const(n)?;
                    self.emit_failure_check(last_branch, last_inst, &mut next_branch_refs);
                }
                Instruction::ModEqual(rem, modulus) => {
                    self.emit_op(OpCode::ModEqual);
                    self.emit_const(rem)?;
                    self.emit_const(modulus)?;
                    self.emit_failure_check(last_branch, last_inst, &mut next_branch_refs);
                }
                Instruction::Not => self.emit_op(OpCode::Not),
                Instruction::DebugPrint => self.emit_op(OpCode::Print),
                Instruction::Call(name) => {
                    let fallible = self.fallible.can_fail(name);
                    if last_inst && (!fallible || last_branch) {
                        self.emit_op(OpCode::TailCall);
                        self.record_call_site(name);
                    } else {
                        self.emit_op(OpCode::Call);
                        self.record_call_site(name);
                        if fallible {
                            self.emit_failure_check(last_branch, last_inst, &mut next_branch_refs);
                        }
                    }
                }
            }
        }

        self.emit_op(OpCode::Ret);

        let next_branch = self.code.len() as u32;
        for at in next_branch_refs {
            self.patch_addr(at, next_branch);
        }
        Ok(())
    }

    /// Place the single failure check that follows a fallible operation.
    fn emit_failure_check(
        &mut self,
        last_branch: bool,
        last_inst: bool,
        next_branch_refs: &mut Vec<usize>,
    ) {
        if !last_branch {
            self.emit_op(OpCode::JumpOnFailure);
            let at = self.emit_placeholder_addr();
            next_branch_refs.push(at);
        } else if !last_inst {
            self.emit_op(OpCode::RetOnFailure);
        }
        // At the very end of the last branch, Ret propagates ⊥ by itself.
    }

    fn emit_op(&mut self, op: OpCode) {
        self.code.push(op as u8);
    }

    fn emit_const(&mut self, value: &BigUint) -> Result<(), CompileError> {
        let index = self
            .constants
            .intern(value)
            .ok_or(CompileError::PoolOverflow)?;
        self.code.extend_from_slice(&index.to_be_bytes());
        Ok(())
    }

    fn emit_placeholder_addr(&mut self) -> usize {
        let at = self.code.len();
        self.code.extend_from_slice(&[0xFF; 4]);
        at
    }

    fn record_call_site(&mut self, callee: &'a str) {
        let patch_at = self.emit_placeholder_addr();
        self.call_sites.push(CallSite { patch_at, callee });
    }

    fn patch_addr(&mut self, at: usize, target: u32) {
        self.code[at..at + 4].copy_from_slice(&target.to_be_bytes());
    }
}
