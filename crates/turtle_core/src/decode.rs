//! Instruction decode (§4.6): a pure function from a 16-bit word to a
//! [`DecodedInstruction`]. Carries no state and touches no bus.

use turtle_isa::{ArithLogicFunction, BranchCondition, InvalidField, JumpFunction, Opcode, RegMemoryFunction, RegisterIndex};
use turtle_util::{Bit, BitSet};

/// Halt is encoded as `JMPI 0`: an absolute jump back to the instruction's
/// own address, recognized by the driver rather than carried as its own bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedOp {
    ArithLogic { function: ArithLogicFunction, register: Option<RegisterIndex> },
    ArithLogicImm { function: ArithLogicFunction, immediate: u8 },
    RegisterFile { function: RegMemoryFunction, register: Option<RegisterIndex>, immediate: Option<u8> },
    JumpImm { offset: i32 },
    JumpReg { function: JumpFunction },
    Branch { condition: BranchCondition, offset: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub op: DecodedOp,
}

/// Sign-extend a 12-bit field into an `i32`.
fn sign_extend_12(raw: u16) -> i32 {
    if raw.bit(11) {
        raw as i32 - 0x1000
    } else {
        raw as i32
    }
}

pub fn decode(word: u16) -> Result<DecodedInstruction, InvalidField> {
    if word.bit(0) {
        let condition = BranchCondition::try_from(word.bit_range(1, 3) as u8)?;
        let offset = sign_extend_12(word.bit_range(4, 15));
        return Ok(DecodedInstruction { op: DecodedOp::Branch { condition, offset } });
    }

    let opcode = Opcode::try_from(word.bit_range(1, 3) as u8)?;
    let op = match opcode {
        Opcode::ArithLogic => {
            let function = ArithLogicFunction::try_from(word.bit_range(4, 7) as u8)?;
            let register = if function == ArithLogicFunction::Inv {
                None
            } else {
                Some(RegisterIndex::try_from(word.bit_range(8, 11) as u8)?)
            };
            DecodedOp::ArithLogic { function, register }
        }
        Opcode::ArithLogicImm => {
            let function = ArithLogicFunction::try_from(word.bit_range(4, 7) as u8)?;
            let immediate = word.bit_range(8, 15) as u8;
            DecodedOp::ArithLogicImm { function, immediate }
        }
        Opcode::RegMemory => {
            let function = RegMemoryFunction::try_from(word.bit_range(4, 7) as u8)?;
            use RegMemoryFunction::*;
            let (register, immediate) = match function {
                Get | Put => (Some(RegisterIndex::try_from(word.bit_range(8, 11) as u8)?), None),
                Set => (None, Some(word.bit_range(8, 15) as u8)),
                Load | Store => (None, None),
            };
            DecodedOp::RegisterFile { function, register, immediate }
        }
        Opcode::JumpImm => {
            let offset = sign_extend_12(word.bit_range(4, 15));
            DecodedOp::JumpImm { offset }
        }
        Opcode::JumpReg => {
            let function = JumpFunction::try_from(word.bit_range(4, 7) as u8)?;
            DecodedOp::JumpReg { function }
        }
    };
    Ok(DecodedInstruction { op })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_addi(value: u16) -> u16 {
        0u16.set_bit_range(1, 3, Opcode::ArithLogicImm as u16)
            .set_bit_range(4, 7, ArithLogicFunction::Add as u16)
            .set_bit_range(8, 15, value)
    }

    #[test]
    fn decodes_addi() {
        let word = encode_addi(7);
        let decoded = decode(word).unwrap();
        assert_eq!(
            decoded.op,
            DecodedOp::ArithLogicImm { function: ArithLogicFunction::Add, immediate: 7 }
        );
    }

    #[test]
    fn inv_decodes_without_a_register() {
        let word = 0u16
            .set_bit_range(1, 3, Opcode::ArithLogic as u16)
            .set_bit_range(4, 7, ArithLogicFunction::Inv as u16);
        let decoded = decode(word).unwrap();
        assert_eq!(decoded.op, DecodedOp::ArithLogic { function: ArithLogicFunction::Inv, register: None });
    }

    #[test]
    fn negative_offset_sign_extends() {
        let word = 0u16.set_bit_range(1, 3, Opcode::JumpImm as u16).set_bit_range(4, 15, 0xFFE);
        let decoded = decode(word).unwrap();
        assert_eq!(decoded.op, DecodedOp::JumpImm { offset: -2 });
    }

    #[test]
    fn branch_flag_takes_priority_over_opcode_bits() {
        let word = 0u16.set_bit(0, true).set_bit_range(1, 3, BranchCondition::CarrySet as u16);
        let decoded = decode(word).unwrap();
        assert!(matches!(decoded.op, DecodedOp::Branch { condition: BranchCondition::CarrySet, .. }));
    }

    #[test]
    fn invalid_opcode_bits_are_rejected() {
        let word = 0u16.set_bit_range(1, 3, 0b011);
        assert!(decode(word).is_err());
    }

    #[test]
    fn decoding_an_assembled_program_matches_the_intended_operations() {
        let image = turtle_asm::assemble("SET 5\nPUT R0\nADD R0\nSTORE\nLOAD\nBCS 2\nHALT\n").unwrap();
        let words: Vec<u16> = image.chunks(2).map(|b| u16::from_le_bytes([b[0], b[1]])).collect();
        let decoded: Vec<DecodedOp> = words.iter().map(|&w| decode(w).unwrap().op).collect();

        assert_eq!(decoded[0], DecodedOp::RegisterFile { function: RegMemoryFunction::Set, register: None, immediate: Some(5) });
        assert_eq!(decoded[1], DecodedOp::RegisterFile { function: RegMemoryFunction::Put, register: Some(RegisterIndex::R0), immediate: None });
        assert_eq!(decoded[2], DecodedOp::ArithLogic { function: ArithLogicFunction::Add, register: Some(RegisterIndex::R0) });
        assert_eq!(decoded[3], DecodedOp::RegisterFile { function: RegMemoryFunction::Store, register: None, immediate: None });
        assert_eq!(decoded[4], DecodedOp::RegisterFile { function: RegMemoryFunction::Load, register: None, immediate: None });
        assert!(matches!(decoded[5], DecodedOp::Branch { condition: BranchCondition::CarrySet, .. }));
        assert_eq!(decoded[6], DecodedOp::JumpImm { offset: 0 });
    }
}
