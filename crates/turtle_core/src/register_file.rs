//! Named registers, the derived wide address views, and the two-phase
//! schedule/commit write protocol (§4.3).

use std::collections::HashMap;

use turtle_isa::RegisterIndex;
use turtle_util::{BitSet, DataAddressBusValue, DataBusValue, InstructionAddressBusValue};

use crate::error::RegisterFileError;

const STATUS_ZERO_BIT: usize = 0;
const STATUS_POSITIVE_BIT: usize = 1;
const STATUS_CARRY_BIT: usize = 2;
const STATUS_OVERFLOW_BIT: usize = 3;

#[derive(Debug, Clone)]
pub struct RegisterFile {
    general: HashMap<RegisterIndex, DataBusValue>,
    acc: DataBusValue,
    status: DataBusValue,
    pending: HashMap<RegisterIndex, DataBusValue>,
    pending_acc: Option<DataBusValue>,
    pending_status_flags: Option<(bool, bool)>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            general: HashMap::new(),
            acc: DataBusValue::from_unsigned(0),
            status: DataBusValue::from_unsigned(0u32.set_bit(STATUS_ZERO_BIT, true).set_bit(STATUS_POSITIVE_BIT, true)),
            pending: HashMap::new(),
            pending_acc: None,
            pending_status_flags: None,
        }
    }

    /// Current committed value of any addressable register, ACC, or STATUS.
    pub fn get(&self, reg: RegisterIndex) -> DataBusValue {
        match reg {
            RegisterIndex::Acc => self.acc,
            RegisterIndex::Status => self.status,
            other => self.general.get(&other).copied().unwrap_or_else(|| DataBusValue::from_unsigned(0)),
        }
    }

    pub fn get_acc(&self) -> DataBusValue {
        self.acc
    }

    pub fn get_status(&self) -> DataBusValue {
        self.status
    }

    /// DMAR = `(DBAR << DATA_WIDTH) | DOFF`.
    pub fn get_dmar(&self) -> DataAddressBusValue {
        wide_address(self.get(RegisterIndex::Dbar), self.get(RegisterIndex::Doff))
    }

    /// IMAR = `(IBAR << DATA_WIDTH) | IOFF`.
    pub fn get_imar(&self) -> InstructionAddressBusValue {
        let high = self.get(RegisterIndex::Ibar).unsigned() << DataBusValue::WIDTH;
        let low = self.get(RegisterIndex::Ioff).unsigned();
        InstructionAddressBusValue::from_unsigned(high | low)
    }

    /// Schedule a write to any register except ACC/STATUS, which have their
    /// own dedicated channels below.
    pub fn set_next(&mut self, reg: RegisterIndex, value: DataBusValue) -> Result<(), RegisterFileError> {
        if matches!(reg, RegisterIndex::Acc | RegisterIndex::Status) {
            return Err(RegisterFileError::GenericWriteToAccOrStatus);
        }
        self.pending.insert(reg, value);
        Ok(())
    }

    pub fn set_next_acc(&mut self, value: DataBusValue) {
        self.pending_acc = Some(value);
    }

    pub fn set_next_status_flags(&mut self, carry: bool, overflow: bool) {
        self.pending_status_flags = Some((carry, overflow));
    }

    /// True iff any write is scheduled but not yet committed.
    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty() || self.pending_acc.is_some() || self.pending_status_flags.is_some()
    }

    /// Apply every pending write atomically. Zero/positive are updated iff a
    /// next-ACC write is pending, based on presence of the scheduled write,
    /// not its truthiness - a scheduled ACC write of zero still updates them.
    pub fn commit(&mut self) {
        for (reg, value) in self.pending.drain() {
            self.general.insert(reg, value);
        }

        let mut status = self.status.unsigned();
        if let Some(next_acc) = self.pending_acc {
            status = status.set_bit(STATUS_ZERO_BIT, next_acc.unsigned() == 0);
            status = status.set_bit(STATUS_POSITIVE_BIT, next_acc.signed() >= 0);
        }
        if let Some((carry, overflow)) = self.pending_status_flags.take() {
            status = status.set_bit(STATUS_CARRY_BIT, carry);
            status = status.set_bit(STATUS_OVERFLOW_BIT, overflow);
        }
        self.status = DataBusValue::from_unsigned(status);

        if let Some(next_acc) = self.pending_acc.take() {
            self.acc = next_acc;
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

fn wide_address(bar: DataBusValue, off: DataBusValue) -> DataAddressBusValue {
    let high = bar.unsigned() << DataBusValue::WIDTH;
    let low = off.unsigned();
    DataAddressBusValue::from_unsigned(high | low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_resets_to_zero_and_positive() {
        let regs = RegisterFile::new();
        assert_eq!(regs.get_status().unsigned(), 0b0000_0011);
    }

    #[test]
    fn put_is_rejected_against_acc_and_status() {
        let mut regs = RegisterFile::new();
        assert!(regs.set_next(RegisterIndex::Acc, DataBusValue::from_unsigned(1)).is_err());
        assert!(regs.set_next(RegisterIndex::Status, DataBusValue::from_unsigned(1)).is_err());
    }

    #[test]
    fn pending_write_is_invisible_until_commit() {
        let mut regs = RegisterFile::new();
        regs.set_next(RegisterIndex::R0, DataBusValue::from_unsigned(7)).unwrap();
        assert_eq!(regs.get(RegisterIndex::R0).unsigned(), 0);
        regs.commit();
        assert_eq!(regs.get(RegisterIndex::R0).unsigned(), 7);
    }

    #[test]
    fn acc_write_of_zero_still_updates_zero_and_positive_flags() {
        let mut regs = RegisterFile::new();
        regs.set_next_acc(DataBusValue::from_unsigned(5));
        regs.commit();
        assert_eq!(regs.get_status().unsigned() & 1, 0);

        regs.set_next_acc(DataBusValue::from_unsigned(0));
        regs.commit();
        assert_eq!(regs.get_status().unsigned() & 1, 1);
    }

    #[test]
    fn dmar_combines_dbar_and_doff() {
        let mut regs = RegisterFile::new();
        regs.set_next(RegisterIndex::Dbar, DataBusValue::from_unsigned(0x12)).unwrap();
        regs.set_next(RegisterIndex::Doff, DataBusValue::from_unsigned(0x34)).unwrap();
        regs.commit();
        assert_eq!(regs.get_dmar().unsigned(), 0x1234);
    }
}
