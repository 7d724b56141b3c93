use std::collections::HashMap;

use turtle_isa::{mnemonic, MnemonicKind, OperandShape, Opcode, RegisterIndex};

use crate::ins::{AddressOperand, Function, ParsedInstruction};
use crate::lex::{tokenize, Tok, TokTy};
use crate::Error;

const INSTRUCTION_BYTES: u32 = 2;

pub(crate) struct ParsedSource {
    pub instructions: Vec<ParsedInstruction>,
    pub labels: HashMap<String, u32>,
}

/// Pass 1: walk the token stream, recording label addresses and parsing each
/// instruction. Address-immediate operands that aren't numeric literals are
/// recorded as [`AddressOperand::LabelRef`] directly by the lexer's own token
/// typing (`Num` vs `Id`) rather than by attempting a numeric parse and
/// catching failure.
pub(crate) fn parse(source: &str) -> Result<ParsedSource, Error> {
    let tokens: Vec<Tok<'_>> = tokenize(source).collect::<Result<_, _>>()?;

    let mut labels = HashMap::new();
    let mut instructions = Vec::new();
    let mut address: u32 = 0;

    for line in tokens.split(|t| t.ty == TokTy::Newline) {
        let mut line = line.iter().peekable();

        if let Some(Tok { ty: TokTy::Label(name), .. }) = line.peek() {
            labels.insert(name.to_ascii_uppercase(), address);
            line.next();
        }

        let Some(mnemonic_tok) = line.next() else {
            continue;
        };
        let TokTy::Id(mnemonic) = mnemonic_tok.ty else {
            return Err(Error::new(mnemonic_tok.line, format!("expected a mnemonic, found {:?}", mnemonic_tok.ty)));
        };
        let line_no = mnemonic_tok.line;

        let operand = line.next();
        if let Some(extra) = line.next() {
            return Err(Error::new(extra.line, "unexpected extra token after operand"));
        }

        let instruction = parse_instruction(line_no, address, mnemonic, operand)?;
        instructions.push(instruction);
        address += INSTRUCTION_BYTES;
    }

    Ok(ParsedSource { instructions, labels })
}

fn parse_instruction(
    line: usize,
    address: u32,
    mnemonic: &str,
    operand: Option<&Tok<'_>>,
) -> Result<ParsedInstruction, Error> {
    let Some(kind) = mnemonic::classify(mnemonic) else {
        return Err(Error::new(line, format!("unknown mnemonic '{mnemonic}'")));
    };

    if let Some(expanded) = expand_macro(line, address, mnemonic, kind, operand)? {
        return Ok(expanded);
    }

    let shape = kind.operand_shape();
    match (shape, operand) {
        (OperandShape::None, Some(tok)) => {
            return Err(Error::new(tok.line, format!("{mnemonic} does not take an operand")))
        }
        (OperandShape::None, None) => {}
        (_, None) => return Err(Error::new(line, format!("{mnemonic} requires an operand"))),
        _ => {}
    }

    let mut ins = ParsedInstruction::new(line, address, Opcode::ArithLogicImm);

    use MnemonicKind::*;
    match kind {
        ArithLogicReg(f) => {
            ins.opcode = Opcode::ArithLogic;
            ins.function = Some(Function::ArithLogic(f));
            ins.register = Some(operand_register(operand.unwrap())?);
        }
        ArithLogicNoOperand(f) => {
            ins.opcode = Opcode::ArithLogic;
            ins.function = Some(Function::ArithLogic(f));
        }
        ArithLogicImm(f) => {
            ins.opcode = Opcode::ArithLogicImm;
            ins.function = Some(Function::ArithLogic(f));
            ins.data_immediate = Some(operand_number(operand.unwrap())?);
        }
        RegisterFileReg(f) => {
            ins.opcode = Opcode::RegMemory;
            ins.function = Some(Function::RegMemory(f));
            ins.register = Some(operand_register(operand.unwrap())?);
        }
        RegisterFileImm(f) => {
            ins.opcode = Opcode::RegMemory;
            ins.function = Some(Function::RegMemory(f));
            ins.data_immediate = Some(operand_number(operand.unwrap())?);
        }
        Memory(f) => {
            ins.opcode = Opcode::RegMemory;
            ins.function = Some(Function::RegMemory(f));
        }
        JumpImm => {
            ins.opcode = Opcode::JumpImm;
            ins.address_immediate = Some(operand_address(operand.unwrap()));
        }
        JumpReg(f) => {
            ins.opcode = Opcode::JumpReg;
            ins.function = Some(Function::Jump(f));
        }
        Branch(cond) => {
            ins.conditional_branch = true;
            ins.branch_condition = Some(cond);
            ins.address_immediate = Some(operand_address(operand.unwrap()));
        }
        NopMacro | HaltMacro => unreachable!("macros are expanded before this match"),
    }

    Ok(ins)
}

/// `NOP` and `HALT` are sugar for `ADDI 0` and `JMPI 0`; both reject an
/// operand of their own. Expanding them here, with their synthetic operand
/// built in directly, means the rest of the parser never has to think about
/// macros again.
fn expand_macro(
    line: usize,
    address: u32,
    mnemonic: &str,
    kind: MnemonicKind,
    operand: Option<&Tok<'_>>,
) -> Result<Option<ParsedInstruction>, Error> {
    if !matches!(kind, MnemonicKind::NopMacro | MnemonicKind::HaltMacro) {
        return Ok(None);
    }
    if operand.is_some() {
        return Err(Error::new(line, format!("{mnemonic} does not take an operand")));
    }

    let mut ins = ParsedInstruction::new(line, address, Opcode::ArithLogicImm);
    match kind {
        MnemonicKind::NopMacro => {
            ins.function = Some(Function::ArithLogic(turtle_isa::ArithLogicFunction::Add));
            ins.data_immediate = Some(0);
        }
        MnemonicKind::HaltMacro => {
            ins.opcode = Opcode::JumpImm;
            ins.address_immediate = Some(AddressOperand::Immediate(0));
        }
        _ => unreachable!(),
    }
    Ok(Some(ins))
}

fn operand_register(tok: &Tok<'_>) -> Result<RegisterIndex, Error> {
    match &tok.ty {
        TokTy::Id(name) => name
            .parse::<RegisterIndex>()
            .map_err(|_| Error::new(tok.line, format!("invalid register '{name}'"))),
        other => Err(Error::new(tok.line, format!("expected a register, found {other:?}"))),
    }
}

fn operand_number(tok: &Tok<'_>) -> Result<i64, Error> {
    match tok.ty {
        TokTy::Num(n) => Ok(n),
        ref other => Err(Error::new(tok.line, format!("expected an immediate, found {other:?}"))),
    }
}

/// Either a numeric literal or a label reference, by token type alone - this
/// is the explicit `{Immediate | LabelRef}` split, not a parse-then-catch.
fn operand_address(tok: &Tok<'_>) -> AddressOperand {
    match &tok.ty {
        TokTy::Num(n) => AddressOperand::Immediate(*n),
        TokTy::Id(name) => AddressOperand::LabelRef(name.to_ascii_uppercase()),
        TokTy::Label(_) | TokTy::Newline | TokTy::Eof => unreachable!("not a valid operand token"),
    }
}
