//! Bytecode representation, compilation and execution.
//!
//! The compiler lowers an optimized [`ProgramMap`](unarian_ast::ProgramMap)
//! into a [`BytecodeModule`]: a flat byte stream of opcodes and operands
//! plus an interned constant pool. The module is an in-memory artifact; the
//! only external view of it is the human-facing [`disassemble`] dump.
//!
//! Layout: opcodes are single bytes; constant-pool indices are 16-bit
//! big-endian; jump and call targets are 32-bit big-endian byte offsets into
//! the instruction stream.

pub mod compiler;
pub mod disasm;
mod fallible;
pub mod module;
pub mod opcode;
pub mod pool;

mod executor;

pub use compiler::{compile, CompileError};
pub use disasm::disassemble;
pub use executor::{ExecError, Vm};
pub use module::BytecodeModule;
pub use opcode::OpCode;
pub use pool::ConstantPool;
