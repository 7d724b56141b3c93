pub mod mnemonic;
pub mod opcode;
pub mod register;

pub use mnemonic::{classify, MnemonicKind, OperandShape};
pub use opcode::{
    ArithLogicFunction, BranchCondition, InvalidField, JumpFunction, Opcode, RegMemoryFunction,
};
pub use register::RegisterIndex;
