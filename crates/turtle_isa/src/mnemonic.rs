//! Mnemonic → ISA-enum tables shared by the assembler's parser and any
//! disassembly/debugging code that wants the inverse mapping.

use crate::opcode::{ArithLogicFunction, BranchCondition, JumpFunction, RegMemoryFunction};

/// The operand an instruction's mnemonic expects, independent of which
/// specific function/condition it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    None,
    Register,
    DataImmediate,
    AddressImmediate,
}

/// What a recognized mnemonic means and what operand it takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnemonicKind {
    /// ADD/SUB/AND/OR/XOR — register operand.
    ArithLogicReg(ArithLogicFunction),
    /// INV — no operand.
    ArithLogicNoOperand(ArithLogicFunction),
    /// ADDI/SUBI/ANDI/ORI/XORI — data-immediate operand.
    ArithLogicImm(ArithLogicFunction),
    /// GET/PUT — register operand.
    RegisterFileReg(RegMemoryFunction),
    /// SET — data-immediate operand.
    RegisterFileImm(RegMemoryFunction),
    /// LOAD/STORE — no operand.
    Memory(RegMemoryFunction),
    /// JMPI — address-immediate operand.
    JumpImm,
    /// JMPR/JMP — no operand (offset/address comes from IMAR at runtime).
    JumpReg(JumpFunction),
    /// BZ/BNZ/BP/BN/BCS/BCC/BOS/BOC — address-immediate operand.
    Branch(BranchCondition),
    /// NOP — expands to `ADDI 0`; rejects an operand.
    NopMacro,
    /// HALT — expands to `JMPI 0`; rejects an operand.
    HaltMacro,
}

impl MnemonicKind {
    pub fn operand_shape(self) -> OperandShape {
        use MnemonicKind::*;
        match self {
            ArithLogicReg(_) | RegisterFileReg(_) => OperandShape::Register,
            ArithLogicNoOperand(_) | Memory(_) | JumpReg(_) | NopMacro | HaltMacro => {
                OperandShape::None
            }
            ArithLogicImm(_) | RegisterFileImm(_) => OperandShape::DataImmediate,
            JumpImm | Branch(_) => OperandShape::AddressImmediate,
        }
    }
}

/// Classify a mnemonic token, case-insensitively.
pub fn classify(mnemonic: &str) -> Option<MnemonicKind> {
    use ArithLogicFunction as Alu;
    use BranchCondition as Bc;
    use JumpFunction as Jf;
    use RegMemoryFunction as Rm;

    Some(match mnemonic.to_ascii_uppercase().as_str() {
        "ADD" => MnemonicKind::ArithLogicReg(Alu::Add),
        "SUB" => MnemonicKind::ArithLogicReg(Alu::Sub),
        "AND" => MnemonicKind::ArithLogicReg(Alu::And),
        "OR" => MnemonicKind::ArithLogicReg(Alu::Or),
        "XOR" => MnemonicKind::ArithLogicReg(Alu::Xor),
        "INV" => MnemonicKind::ArithLogicNoOperand(Alu::Inv),

        "ADDI" => MnemonicKind::ArithLogicImm(Alu::Add),
        "SUBI" => MnemonicKind::ArithLogicImm(Alu::Sub),
        "ANDI" => MnemonicKind::ArithLogicImm(Alu::And),
        "ORI" => MnemonicKind::ArithLogicImm(Alu::Or),
        "XORI" => MnemonicKind::ArithLogicImm(Alu::Xor),

        "GET" => MnemonicKind::RegisterFileReg(Rm::Get),
        "PUT" => MnemonicKind::RegisterFileReg(Rm::Put),
        "SET" => MnemonicKind::RegisterFileImm(Rm::Set),
        "LOAD" => MnemonicKind::Memory(Rm::Load),
        "STORE" => MnemonicKind::Memory(Rm::Store),

        "JMPI" => MnemonicKind::JumpImm,
        "JMPR" => MnemonicKind::JumpReg(Jf::JumpRelative),
        "JMP" => MnemonicKind::JumpReg(Jf::JumpAbsolute),

        "BZ" => MnemonicKind::Branch(Bc::Zero),
        "BNZ" => MnemonicKind::Branch(Bc::NotZero),
        "BP" => MnemonicKind::Branch(Bc::Positive),
        "BN" => MnemonicKind::Branch(Bc::Negative),
        "BCS" => MnemonicKind::Branch(Bc::CarrySet),
        "BCC" => MnemonicKind::Branch(Bc::CarryCleared),
        "BOS" => MnemonicKind::Branch(Bc::OverflowSet),
        "BOC" => MnemonicKind::Branch(Bc::OverflowCleared),

        "NOP" => MnemonicKind::NopMacro,
        "HALT" => MnemonicKind::HaltMacro,

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_case_insensitively() {
        assert_eq!(classify("addi"), classify("ADDI"));
        assert!(classify("addi").is_some());
    }

    #[test]
    fn unknown_mnemonic_is_none() {
        assert_eq!(classify("NOTAREALOP"), None);
    }

    #[test]
    fn operand_shapes_match_taxonomy() {
        assert_eq!(classify("ADD").unwrap().operand_shape(), OperandShape::Register);
        assert_eq!(classify("INV").unwrap().operand_shape(), OperandShape::None);
        assert_eq!(classify("ADDI").unwrap().operand_shape(), OperandShape::DataImmediate);
        assert_eq!(classify("SET").unwrap().operand_shape(), OperandShape::DataImmediate);
        assert_eq!(classify("JMPI").unwrap().operand_shape(), OperandShape::AddressImmediate);
        assert_eq!(classify("BZ").unwrap().operand_shape(), OperandShape::AddressImmediate);
        assert_eq!(classify("LOAD").unwrap().operand_shape(), OperandShape::None);
        assert_eq!(classify("JMP").unwrap().operand_shape(), OperandShape::None);
        assert_eq!(classify("NOP").unwrap().operand_shape(), OperandShape::None);
        assert_eq!(classify("HALT").unwrap().operand_shape(), OperandShape::None);
    }
}
