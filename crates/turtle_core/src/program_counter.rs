//! The program counter and its two-phase schedule/commit protocol (§4.5).

use turtle_isa::BranchCondition;
use turtle_util::{Bit, InstructionAddressBusValue};

use crate::error::ProgramCounterError;

#[derive(Debug, Clone)]
pub struct ProgramCounter {
    value: InstructionAddressBusValue,
    next_value: Option<InstructionAddressBusValue>,
    stall: bool,
}

impl ProgramCounter {
    pub fn new() -> Self {
        Self {
            value: InstructionAddressBusValue::from_unsigned(0),
            next_value: None,
            stall: false,
        }
    }

    pub fn value(&self) -> InstructionAddressBusValue {
        self.value
    }

    pub fn is_stalled(&self) -> bool {
        self.stall
    }

    /// Advances by `INSTRUCTION_BYTES` (2): the instruction address bus is
    /// byte-addressed, matching the assembler's label and offset arithmetic.
    pub fn increment(&mut self) {
        let stride = InstructionAddressBusValue::from_unsigned(2);
        self.next_value = Some(self.value + stride);
    }

    /// Two's-complement wraparound relative jump: `offset` is a sign-extended
    /// 12-bit immediate, applied mod 2^16.
    pub fn jump_relative(&mut self, offset: i32) {
        self.next_value = Some(self.relative_target(offset));
    }

    /// The address `offset` cycles away from the current value, wrapped mod
    /// 2^16, without scheduling it. Shared by [`Self::jump_relative`] and the
    /// driver's conditional-branch target computation.
    pub fn relative_target(&self, offset: i32) -> InstructionAddressBusValue {
        let target = (self.value.unsigned() as i64 + offset as i64) as u32 & InstructionAddressBusValue::MAX_UNSIGNED;
        InstructionAddressBusValue::from_unsigned(target)
    }

    pub fn jump_absolute(&mut self, address: InstructionAddressBusValue) {
        self.next_value = Some(address);
    }

    /// Branch to `target` iff `condition` reads true in `status`; otherwise
    /// behave like [`Self::increment`].
    pub fn conditionally_branch(
        &mut self,
        condition: BranchCondition,
        status: u32,
        target: InstructionAddressBusValue,
    ) {
        let taken = match condition {
            BranchCondition::Zero => status.bit(0),
            BranchCondition::NotZero => !status.bit(0),
            BranchCondition::Positive => status.bit(1),
            BranchCondition::Negative => !status.bit(1),
            BranchCondition::CarrySet => status.bit(2),
            BranchCondition::CarryCleared => !status.bit(2),
            BranchCondition::OverflowSet => status.bit(3),
            BranchCondition::OverflowCleared => !status.bit(3),
        };
        if taken {
            self.next_value = Some(target);
        } else {
            self.increment();
        }
    }

    pub fn set_stall(&mut self, stall: bool) {
        self.stall = stall;
    }

    /// True iff a next value is scheduled but not yet committed.
    pub fn has_pending(&self) -> bool {
        self.next_value.is_some()
    }

    /// While stalled, drop any pending value and keep the current one. While
    /// not stalled, a pending value must exist.
    pub fn commit(&mut self) -> Result<(), ProgramCounterError> {
        if self.stall {
            self.next_value = None;
            return Ok(());
        }
        match self.next_value.take() {
            Some(next) => {
                self.value = next;
                Ok(())
            }
            None => Err(ProgramCounterError::MissingPendingValue),
        }
    }
}

impl Default for ProgramCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_advances_by_two_on_commit() {
        let mut pc = ProgramCounter::new();
        pc.increment();
        pc.commit().unwrap();
        assert_eq!(pc.value().unsigned(), 2);
    }

    #[test]
    fn relative_jump_wraps_backward_from_zero() {
        let mut pc = ProgramCounter::new();
        pc.jump_relative(-2);
        pc.commit().unwrap();
        assert_eq!(pc.value().unsigned(), 0xFFFE);
    }

    #[test]
    fn stalled_commit_keeps_current_value_and_drops_pending() {
        let mut pc = ProgramCounter::new();
        pc.increment();
        pc.set_stall(true);
        pc.commit().unwrap();
        assert_eq!(pc.value().unsigned(), 0);
    }

    #[test]
    fn commit_without_pending_value_while_not_stalled_is_an_error() {
        let mut pc = ProgramCounter::new();
        assert!(pc.commit().is_err());
    }

    #[test]
    fn branch_not_taken_behaves_like_increment() {
        let mut pc = ProgramCounter::new();
        let target = InstructionAddressBusValue::from_unsigned(50);
        pc.conditionally_branch(BranchCondition::Zero, 0b0000_0000, target);
        pc.commit().unwrap();
        assert_eq!(pc.value().unsigned(), 2);
    }

    #[test]
    fn branch_taken_jumps_to_target() {
        let mut pc = ProgramCounter::new();
        let target = InstructionAddressBusValue::from_unsigned(50);
        pc.conditionally_branch(BranchCondition::Zero, 0b0000_0001, target);
        pc.commit().unwrap();
        assert_eq!(pc.value().unsigned(), 50);
    }
}
