// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Bytecode compiler and virtual machine for Unarian.
//!
//! The optimized IR is lowered into a flat byte stream with a constant pool
//! ([`bytecode::compile`]), which a stack-based VM ([`bytecode::Vm`])
//! executes against an initial counter. Failure (⊥) is a first-class
//! outcome, not an error: the VM returns `Ok(None)` for it.
//!
//! Counter arithmetic is abstracted behind the [`Counter`] trait so the same
//! bytecode runs with arbitrary-precision integers (the default) or with
//! 64-bit fixed-width integers.

pub mod bytecode;
pub mod counter;

pub use bytecode::{compile, disassemble, BytecodeModule, CompileError, ExecError, OpCode, Vm};
pub use counter::Counter;
