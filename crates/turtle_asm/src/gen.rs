//! Pass 2: resolve label references left by [`crate::parse`] and encode each
//! instruction into its 2-byte little-endian word, mirroring the bit layout
//! the decoder reads.

use turtle_util::BitSet;

use crate::ins::{AddressOperand, Function, ParsedInstruction};
use crate::parse::ParsedSource;
use crate::Error;

/// Builds one 16-bit instruction word field-by-field.
#[derive(Clone, Copy)]
struct InsBuilder(u16);

impl InsBuilder {
    fn branch(condition: u16) -> Self {
        Self(0u16.set_bit(0, true).set_bit_range(1, 3, condition))
    }

    fn op(opcode: u16) -> Self {
        Self(0u16.set_bit_range(1, 3, opcode))
    }

    fn function(self, func: u16) -> Self {
        Self(self.0.set_bit_range(4, 7, func))
    }

    fn register(self, reg: u16) -> Self {
        Self(self.0.set_bit_range(8, 11, reg))
    }

    fn data_immediate(self, value: u16) -> Self {
        Self(self.0.set_bit_range(8, 15, value))
    }

    fn address_immediate(self, value: u16) -> Self {
        Self(self.0.set_bit_range(4, 15, value))
    }

    fn bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

/// Resolve labels and encode every parsed instruction in source order.
pub(crate) fn encode(parsed: &ParsedSource) -> Result<Vec<u8>, Error> {
    let mut code = Vec::with_capacity(parsed.instructions.len() * 2);
    for ins in &parsed.instructions {
        let word = encode_instruction(ins, parsed)?;
        code.extend_from_slice(&word.bytes());
    }
    Ok(code)
}

fn resolve_address_immediate(
    ins: &ParsedInstruction,
    parsed: &ParsedSource,
    missing_message: &str,
) -> Result<i64, Error> {
    match ins.address_immediate.as_ref() {
        Some(AddressOperand::Immediate(value)) => Ok(*value),
        Some(AddressOperand::LabelRef(name)) => match parsed.labels.get(name) {
            Some(target) => Ok(*target as i64 - ins.address as i64),
            None => Err(Error::new(ins.line, format!("undefined label '{name}'"))),
        },
        None => Err(Error::new(ins.line, missing_message)),
    }
}

fn encode_instruction(ins: &ParsedInstruction, parsed: &ParsedSource) -> Result<InsBuilder, Error> {
    if ins.conditional_branch {
        let condition = ins
            .branch_condition
            .ok_or_else(|| Error::new(ins.line, "missing branch condition"))?;
        let offset = resolve_address_immediate(ins, parsed, "missing address immediate for conditional branch")?;
        return Ok(InsBuilder::branch(condition as u16).address_immediate(offset as u16));
    }

    use turtle_isa::Opcode::*;
    let word = match ins.opcode {
        ArithLogic => {
            let func = match ins.function {
                Some(Function::ArithLogic(f)) => f,
                _ => return Err(Error::new(ins.line, "missing ALU function")),
            };
            let builder = InsBuilder::op(ArithLogic as u16).function(func as u16);
            if func == turtle_isa::ArithLogicFunction::Inv {
                builder
            } else {
                let reg = ins
                    .register
                    .ok_or_else(|| Error::new(ins.line, "missing register for ALU instruction"))?;
                builder.register(reg.bits() as u16)
            }
        }
        ArithLogicImm => {
            let func = match ins.function {
                Some(Function::ArithLogic(f)) => f,
                _ => return Err(Error::new(ins.line, "missing ALU function")),
            };
            let imm = ins
                .data_immediate
                .ok_or_else(|| Error::new(ins.line, "missing data immediate for ARITH_LOGIC_IMM"))?;
            InsBuilder::op(ArithLogicImm as u16).function(func as u16).data_immediate(imm as u16)
        }
        RegMemory => {
            let func = match ins.function {
                Some(Function::RegMemory(f)) => f,
                _ => return Err(Error::new(ins.line, "missing register/memory function")),
            };
            let builder = InsBuilder::op(RegMemory as u16).function(func as u16);
            use turtle_isa::RegMemoryFunction::*;
            match func {
                Get | Put => {
                    let reg = ins
                        .register
                        .ok_or_else(|| Error::new(ins.line, "missing register for GET/PUT"))?;
                    builder.register(reg.bits() as u16)
                }
                Set => {
                    let imm = ins
                        .data_immediate
                        .ok_or_else(|| Error::new(ins.line, "missing data immediate for SET"))?;
                    builder.data_immediate(imm as u16)
                }
                Load | Store => builder,
            }
        }
        JumpImm => {
            let offset = resolve_address_immediate(ins, parsed, "missing address immediate for JUMP_IMM")?;
            InsBuilder::op(JumpImm as u16).address_immediate(offset as u16)
        }
        JumpReg => {
            let func = match ins.function {
                Some(Function::Jump(f)) => f,
                _ => return Err(Error::new(ins.line, "missing jump function for JUMP_REG")),
            };
            InsBuilder::op(JumpReg as u16).function(func as u16)
        }
    };

    Ok(word)
}
