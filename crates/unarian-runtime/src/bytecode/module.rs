//! The compiled bytecode artifact.

use crate::bytecode::pool::ConstantPool;

/// A compiled program: the flat instruction stream plus its constant pool.
///
/// The module is logically immutable once built. It owns no execution
/// state, so one module can be replayed against any number of initial
/// counters.
#[derive(Debug, Clone, PartialEq)]
pub struct BytecodeModule {
    instructions: Vec<u8>,
    constants: ConstantPool,
}

impl BytecodeModule {
    pub(crate) fn new(instructions: Vec<u8>, constants: ConstantPool) -> Self {
        Self {
            instructions,
            constants,
        }
    }

    /// The instruction stream. Execution starts at offset 0.
    pub fn instructions(&self) -> &[u8] {
        &self.instructions
    }

    /// The interned constants referenced by the instruction stream.
    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }
}
