// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! IR types for the Unarian interpreter.
//!
//! This crate defines the program representation shared by the parser, the
//! optimizer and the bytecode compiler:
//!
//! - [`Instruction`] — a tagged variant over the primitive and condensed
//!   arithmetic operations
//! - [`Branch`] — an ordered instruction sequence, executed left to right
//! - [`Program`] — an ordered sequence of alternative branches
//! - [`ProgramMap`] — the name → program table for a whole source file
//!
//! The IR is immutable once built: the parser produces it, the optimizer
//! rewrites it into a fresh map, and the compiler consumes it.

pub mod program;

pub use program::{Branch, DivMode, Instruction, Program, ProgramMap};
