//! Stack-based virtual machine.
//!
//! A single `match`-dispatched loop over the instruction stream. The
//! machine's whole state is one current counter (or ⊥), the saved initial
//! input, an instruction pointer, and a call stack of (saved counter,
//! return address) frames.
//!
//! # Backtracking
//!
//! Failure is local to the enclosing call: when `JumpOnFailure` fires, the
//! counter is restored to the value the current function was entered with —
//! the top frame's saved counter, or the initial input at the outermost
//! level — and the next alternative branch runs. `TailCall` keeps this
//! working without frame growth by overwriting the top frame's saved
//! counter in place.
//!
//! Divergent programs run until the process is terminated; the machine
//! imposes no step limit.

use std::io::Write;

use crate::bytecode::module::BytecodeModule;
use crate::bytecode::opcode::OpCode;
use crate::counter::Counter;

/// Execution error.
///
/// Reaching any of these means the bytecode is corrupt or the module was
/// paired with the wrong counter width; a well-formed module never produces
/// them. Runtime failure (⊥) is not an error — it is the `Ok(None)` result.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The instruction pointer ran off the end of the stream.
    #[error("truncated instruction stream at offset {offset}")]
    TruncatedStream { offset: usize },

    /// An undefined opcode byte.
    #[error("invalid opcode {byte:#04x} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },

    /// A constant index past the end of the pool.
    #[error("constant index {index} out of range")]
    InvalidConstant { index: u16 },

    /// An arithmetic opcode ran while the counter was ⊥, which the
    /// compiler's failure-check placement rules out.
    #[error("operation on a failed counter at offset {offset}")]
    FailedCounter { offset: usize },

    /// A pool constant does not fit the fixed-width counter type.
    #[error("pool constant does not fit the fixed-width counter")]
    ConstantOverflow,

    /// Writing debug output failed.
    #[error("debug print failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A call frame: the counter at function entry and where to resume.
struct Frame<C> {
    saved: C,
    return_ip: usize,
}

/// The virtual machine for one bytecode module.
///
/// Construction converts the constant pool into the chosen counter
/// representation once; the module can then be replayed against any number
/// of initial inputs.
pub struct Vm<'m, C: Counter> {
    code: &'m [u8],
    constants: Vec<C>,
}

struct Outcome<C> {
    result: Option<C>,
    max_depth: usize,
}

impl<'m, C: Counter> Vm<'m, C> {
    /// Bind a module to a counter representation.
    ///
    /// # Errors
    ///
    /// Fails when a pool constant does not fit (only possible in fixed
    /// precision mode).
    pub fn new(module: &'m BytecodeModule) -> Result<Self, ExecError> {
        let constants = module
            .constants()
            .values()
            .iter()
            .map(C::from_const)
            .collect::<Option<Vec<_>>>()
            .ok_or(ExecError::ConstantOverflow)?;
        Ok(Self {
            code: module.instructions(),
            constants,
        })
    }

    /// Run the module against an initial counter.
    ///
    /// Returns `Ok(Some(final))` on success, `Ok(None)` for ⊥. Debug prints
    /// go to `out`.
    ///
    /// # Errors
    ///
    /// Only for corrupt bytecode or a failed write to `out`.
    pub fn run<W: Write>(&self, initial: C, out: &mut W) -> Result<Option<C>, ExecError> {
        self.execute(initial, out).map(|outcome| outcome.result)
    }

    /// Test hook: like [`run`](Vm::run), also reporting the high-water call
    /// stack depth.
    #[cfg(test)]
    pub(crate) fn run_with_depth<W: Write>(
        &self,
        initial: C,
        out: &mut W,
    ) -> Result<(Option<C>, usize), ExecError> {
        self.execute(initial, out)
            .map(|outcome| (outcome.result, outcome.max_depth))
    }

    fn execute<W: Write>(&self, initial: C, out: &mut W) -> Result<Outcome<C>, ExecError> {
        let mut initial = initial;
        let mut val: Option<C> = Some(initial.clone());
        let mut ip = 0usize;
        let mut stack: Vec<Frame<C>> = Vec::new();
        let mut max_depth = 0usize;

        loop {
            let at = ip;
            match self.fetch_op(&mut ip)? {
                OpCode::Inc => live(&mut val, at)?.increment(),
                OpCode::Dec => {
                    if !live(&mut val, at)?.decrement() {
                        val = None;
                    }
                }
                OpCode::Add => {
                    let c = self.fetch_const(&mut ip)?;
                    live(&mut val, at)?.add(c);
                }
                OpCode::Sub => {
                    let c = self.fetch_const(&mut ip)?;
                    if !live(&mut val, at)?.sub_checked(c) {
                        val = None;
                    }
                }
                OpCode::Mult => {
                    let c = self.fetch_const(&mut ip)?;
                    live(&mut val, at)?.mul(c);
                }
                OpCode::DivFloor => {
                    let c = self.fetch_const(&mut ip)?;
                    live(&mut val, at)?.div_floor(c);
                }
                OpCode::DivFail => {
                    let c = self.fetch_const(&mut ip)?;
                    if !live(&mut val, at)?.div_exact(c) {
                        val = None;
                    }
                }
                OpCode::Equal => {
                    let c = self.fetch_const(&mut ip)?;
                    if *live(&mut val, at)? != *c {
                        val = None;
                    }
                }
                OpCode::ModEqual => {
                    let rem = self.fetch_const(&mut ip)?;
                    let modulus = self.fetch_const(&mut ip)?;
                    if !live(&mut val, at)?.mod_equals(rem, modulus) {
                        val = None;
                    }
                }
                OpCode::Not => {
                    let v = live(&mut val, at)?;
                    *v = if v.is_zero() { C::one() } else { C::zero() };
                }
                OpCode::Print => {
                    let v = live(&mut val, at)?;
                    writeln!(out, "{v}")?;
                }
                OpCode::Call => {
                    let target = self.fetch_addr(&mut ip)?;
                    let v = live(&mut val, at)?;
                    stack.push(Frame {
                        saved: v.clone(),
                        return_ip: ip,
                    });
                    max_depth = max_depth.max(stack.len());
                    ip = target;
                }
                OpCode::TailCall => {
                    let target = self.fetch_addr(&mut ip)?;
                    let v = live(&mut val, at)?;
                    match stack.last_mut() {
                        Some(frame) => frame.saved = v.clone(),
                        None => initial = v.clone(),
                    }
                    ip = target;
                }
                OpCode::Ret => match stack.pop() {
                    Some(frame) => ip = frame.return_ip,
                    None => {
                        return Ok(Outcome {
                            result: val,
                            max_depth,
                        })
                    }
                },
                OpCode::JumpOnFailure => {
                    let target = self.fetch_addr(&mut ip)?;
                    if val.is_none() {
                        let restored = match stack.last() {
                            Some(frame) => frame.saved.clone(),
                            None => initial.clone(),
                        };
                        val = Some(restored);
                        ip = target;
                    }
                }
                OpCode::RetOnFailure => {
                    if val.is_none() {
                        match stack.pop() {
                            Some(frame) => ip = frame.return_ip,
                            None => {
                                return Ok(Outcome {
                                    result: None,
                                    max_depth,
                                })
                            }
                        }
                    }
                }
            }
        }
    }

    fn fetch_op(&self, ip: &mut usize) -> Result<OpCode, ExecError> {
        let offset = *ip;
        let byte = *self
            .code
            .get(offset)
            .ok_or(ExecError::TruncatedStream { offset })?;
        *ip += 1;
        OpCode::from_byte(byte).ok_or(ExecError::InvalidOpcode { byte, offset })
    }

    fn fetch_const(&self, ip: &mut usize) -> Result<&C, ExecError> {
        let offset = *ip;
        let bytes = self
            .code
            .get(offset..offset + 2)
            .ok_or(ExecError::TruncatedStream { offset })?;
        *ip += 2;
        let index = u16::from_be_bytes([bytes[0], bytes[1]]);
        self.constants
            .get(index as usize)
            .ok_or(ExecError::InvalidConstant { index })
    }

    fn fetch_addr(&self, ip: &mut usize) -> Result<usize, ExecError> {
        let offset = *ip;
        let bytes = self
            .code
            .get(offset..offset + 4)
            .ok_or(ExecError::TruncatedStream { offset })?;
        *ip += 4;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
    }
}

/// The current counter, or the corrupt-bytecode error for an arithmetic
/// opcode reached with ⊥.
fn live<C: Counter>(val: &mut Option<C>, offset: usize) -> Result<&mut C, ExecError> {
    val.as_mut().ok_or(ExecError::FailedCounter { offset })
}
