//! Integration test harness for Unarian.
//!
//! This crate provides utilities for end-to-end testing of the full
//! pipeline: Parse → Optimize → Compile → Execute → Verify.

use num_bigint::BigUint;
use unarian_ast::ProgramMap;
use unarian_runtime::{compile, disassemble, BytecodeModule, Vm};

/// Test harness for evaluating Unarian expressions against a source file.
pub struct TestHarness {
    module: BytecodeModule,
    optimized: ProgramMap,
    entry: String,
}

impl TestHarness {
    /// Build a harness from source and an entry expression, running the
    /// whole compilation pipeline.
    ///
    /// # Panics
    ///
    /// Panics if parsing or compilation fails.
    pub fn from_source(source: &str, expr: &str) -> Self {
        Self::build(source, expr, false)
    }

    /// Like [`from_source`](TestHarness::from_source) with debug printing
    /// enabled (`!` prints the counter).
    pub fn with_debug(source: &str, expr: &str) -> Self {
        Self::build(source, expr, true)
    }

    fn build(source: &str, expr: &str, debug: bool) -> Self {
        let mut programs = match unarian_parser::parse_file(source, debug) {
            Ok(programs) => programs,
            Err(errors) => panic!("File parse failed: {errors:?}"),
        };
        let entry = match unarian_parser::parse_expression(expr, &mut programs) {
            Ok(entry) => entry,
            Err(errors) => panic!("Expression parse failed: {errors:?}"),
        };

        let optimized = unarian_ir::optimize_programs(programs, &entry);
        let module = compile(&optimized, &entry).expect("compilation failed");

        Self {
            module,
            optimized,
            entry,
        }
    }

    /// Evaluate the entry expression against one input. `None` is ⊥.
    pub fn eval(&self, input: u64) -> Option<u64> {
        let vm: Vm<BigUint> = Vm::new(&self.module).expect("VM construction failed");
        let mut out = Vec::new();
        vm.run(BigUint::from(input), &mut out)
            .expect("execution failed")
            .map(|n| u64::try_from(&n).expect("result exceeds u64"))
    }

    /// Evaluate with arbitrary-precision input and output.
    pub fn eval_big(&self, input: BigUint) -> Option<BigUint> {
        let vm: Vm<BigUint> = Vm::new(&self.module).expect("VM construction failed");
        let mut out = Vec::new();
        vm.run(input, &mut out).expect("execution failed")
    }

    /// Evaluate in fixed (64-bit) precision.
    pub fn eval_fixed(&self, input: u64) -> Option<u64> {
        let vm: Vm<u64> = Vm::new(&self.module).expect("VM construction failed");
        let mut out = Vec::new();
        vm.run(input, &mut out).expect("execution failed")
    }

    /// Evaluate and capture the debug-print stream alongside the result.
    pub fn eval_with_output(&self, input: u64) -> (Option<u64>, String) {
        let vm: Vm<BigUint> = Vm::new(&self.module).expect("VM construction failed");
        let mut out = Vec::new();
        let result = vm
            .run(BigUint::from(input), &mut out)
            .expect("execution failed")
            .map(|n| u64::try_from(&n).expect("result exceeds u64"));
        (result, String::from_utf8(out).expect("non-UTF8 debug output"))
    }

    /// The optimized program map, for asserting on recognized shapes.
    pub fn optimized(&self) -> &ProgramMap {
        &self.optimized
    }

    /// The entry program's generated name.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// The compiled module.
    pub fn module(&self) -> &BytecodeModule {
        &self.module
    }

    /// The bytecode dump.
    pub fn disassembly(&self) -> String {
        disassemble(&self.module)
    }
}
