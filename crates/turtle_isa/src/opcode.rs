use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} field value {value:#x} is not a valid {kind}")]
pub struct InvalidField {
    pub kind: &'static str,
    pub value: u8,
}

/// The 3-bit opcode, present when the instruction's branch flag is clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    ArithLogicImm = 0b000,
    ArithLogic = 0b001,
    RegMemory = 0b010,
    JumpImm = 0b100,
    JumpReg = 0b111,
}

impl TryFrom<u8> for Opcode {
    type Error = InvalidField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b000 => Ok(Opcode::ArithLogicImm),
            0b001 => Ok(Opcode::ArithLogic),
            0b010 => Ok(Opcode::RegMemory),
            0b100 => Ok(Opcode::JumpImm),
            0b111 => Ok(Opcode::JumpReg),
            value => Err(InvalidField { kind: "opcode", value }),
        }
    }
}

/// The 4-bit ALU function, valid when [`Opcode::ArithLogicImm`] or [`Opcode::ArithLogic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithLogicFunction {
    Add = 0b0000,
    Sub = 0b0001,
    And = 0b0010,
    Or = 0b0100,
    Xor = 0b0101,
    Inv = 0b0111,
}

impl TryFrom<u8> for ArithLogicFunction {
    type Error = InvalidField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b0000 => Ok(ArithLogicFunction::Add),
            0b0001 => Ok(ArithLogicFunction::Sub),
            0b0010 => Ok(ArithLogicFunction::And),
            0b0100 => Ok(ArithLogicFunction::Or),
            0b0101 => Ok(ArithLogicFunction::Xor),
            0b0111 => Ok(ArithLogicFunction::Inv),
            value => Err(InvalidField { kind: "ALU function", value }),
        }
    }
}

impl fmt::Display for ArithLogicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArithLogicFunction::Add => "ADD",
            ArithLogicFunction::Sub => "SUB",
            ArithLogicFunction::And => "AND",
            ArithLogicFunction::Or => "OR",
            ArithLogicFunction::Xor => "XOR",
            ArithLogicFunction::Inv => "INV",
        };
        f.write_str(name)
    }
}

/// The 4-bit register/memory function, valid when [`Opcode::RegMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegMemoryFunction {
    Load = 0b0000,
    Store = 0b0001,
    Get = 0b0010,
    Put = 0b0011,
    Set = 0b0100,
}

impl TryFrom<u8> for RegMemoryFunction {
    type Error = InvalidField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b0000 => Ok(RegMemoryFunction::Load),
            0b0001 => Ok(RegMemoryFunction::Store),
            0b0010 => Ok(RegMemoryFunction::Get),
            0b0011 => Ok(RegMemoryFunction::Put),
            0b0100 => Ok(RegMemoryFunction::Set),
            value => Err(InvalidField { kind: "register/memory function", value }),
        }
    }
}

/// The 2-bit jump function, valid when [`Opcode::JumpReg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpFunction {
    JumpRelative = 0b0000,
    JumpAbsolute = 0b0001,
}

impl TryFrom<u8> for JumpFunction {
    type Error = InvalidField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b0000 => Ok(JumpFunction::JumpRelative),
            0b0001 => Ok(JumpFunction::JumpAbsolute),
            value => Err(InvalidField { kind: "jump function", value }),
        }
    }
}

/// The 3-bit branch condition, present when the instruction's branch flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCondition {
    Zero = 0b000,
    NotZero = 0b001,
    Positive = 0b010,
    Negative = 0b011,
    CarrySet = 0b100,
    CarryCleared = 0b101,
    OverflowSet = 0b110,
    OverflowCleared = 0b111,
}

impl TryFrom<u8> for BranchCondition {
    type Error = InvalidField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b000 => Ok(BranchCondition::Zero),
            0b001 => Ok(BranchCondition::NotZero),
            0b010 => Ok(BranchCondition::Positive),
            0b011 => Ok(BranchCondition::Negative),
            0b100 => Ok(BranchCondition::CarrySet),
            0b101 => Ok(BranchCondition::CarryCleared),
            0b110 => Ok(BranchCondition::OverflowSet),
            0b111 => Ok(BranchCondition::OverflowCleared),
            // All 8 values of a 3-bit field are covered above; unreachable in practice.
            value => Err(InvalidField { kind: "branch condition", value }),
        }
    }
}
