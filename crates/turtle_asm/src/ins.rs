use turtle_isa::{ArithLogicFunction, BranchCondition, JumpFunction, Opcode, RegMemoryFunction, RegisterIndex};

/// The instruction's function field, whose meaning is discriminated by opcode
/// (an ALU function for `ARITH_LOGIC[_IMM]`, a register/memory function for
/// `REG_MEMORY`, a jump function for `JUMP_REG`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    ArithLogic(ArithLogicFunction),
    RegMemory(RegMemoryFunction),
    Jump(JumpFunction),
}

/// The operand of a branch or `JMPI`, before label references are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressOperand {
    Immediate(i64),
    LabelRef(String),
}

/// An instruction parsed from source, not yet encoded. Mirrors the bit layout
/// of the encoded word field for field, with unresolved label references left
/// as [`AddressOperand::LabelRef`] until pass 2.
#[derive(Debug, Clone)]
pub struct ParsedInstruction {
    pub line: usize,
    pub address: u32,
    pub conditional_branch: bool,
    pub branch_condition: Option<BranchCondition>,
    pub opcode: Opcode,
    pub function: Option<Function>,
    pub register: Option<RegisterIndex>,
    pub data_immediate: Option<i64>,
    pub address_immediate: Option<AddressOperand>,
}

impl ParsedInstruction {
    pub(crate) fn new(line: usize, address: u32, opcode: Opcode) -> Self {
        Self {
            line,
            address,
            conditional_branch: false,
            branch_condition: None,
            opcode,
            function: None,
            register: None,
            data_immediate: None,
            address_immediate: None,
        }
    }
}
