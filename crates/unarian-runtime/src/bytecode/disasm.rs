//! Human-facing bytecode dump.
//!
//! Purely for inspection (`-b` in the CLI); the format is not parsed by
//! anything and is not a stable interchange format.

use crate::bytecode::module::BytecodeModule;
use crate::bytecode::opcode::{OpCode, OperandKind};

/// Render the instruction stream one opcode per line, as
/// `offset: MNEMONIC operand …`.
///
/// Constant operands print their pooled value rather than the pool index;
/// address operands print as decimal byte offsets.
pub fn disassemble(module: &BytecodeModule) -> String {
    let code = module.instructions();
    let mut out = String::new();
    let mut i = 0;

    while i < code.len() {
        out.push_str(&format!("{i}: "));

        let Some(op) = OpCode::from_byte(code[i]) else {
            out.push_str("ERROR\n");
            i += 1;
            continue;
        };
        out.push_str(op.mnemonic());
        i += 1;

        for operand in op.operands() {
            match operand {
                OperandKind::Const => {
                    let Some(bytes) = code.get(i..i + 2) else {
                        out.push_str(" <truncated>");
                        i = code.len();
                        break;
                    };
                    let index = u16::from_be_bytes([bytes[0], bytes[1]]);
                    i += 2;
                    match module.constants().get(index) {
                        Some(value) => out.push_str(&format!(" {value}")),
                        None => out.push_str(&format!(" <constant {index}?>")),
                    }
                }
                OperandKind::Addr => {
                    let Some(bytes) = code.get(i..i + 4) else {
                        out.push_str(" <truncated>");
                        i = code.len();
                        break;
                    };
                    let target = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    i += 4;
                    out.push_str(&format!(" {target}"));
                }
            }
        }

        out.push('\n');
    }

    out
}
