use thiserror::Error;

use turtle_isa::InvalidField;
use turtle_util::BusValueError;

/// Protocol violations on a memory module (§4.4).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("conflicting memory operation: a different address or value is already outstanding")]
    ConflictingOperation,
    #[error("segmentation fault: address {address:#x} was never written")]
    Segfault { address: u32 },
    #[error("no completed operation to retrieve a result from")]
    NoPendingResult,
}

/// Protocol violations on the register file (§4.3).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFileError {
    #[error("ACC and STATUS must be written through their dedicated channels, not the generic one")]
    GenericWriteToAccOrStatus,
}

/// Protocol violations on the program counter (§4.5).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramCounterError {
    #[error("commit with no pending next value while not stalled")]
    MissingPendingValue,
}

/// Everything that can go wrong while running a cycle of the simulator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    RegisterFile(#[from] RegisterFileError),
    #[error(transparent)]
    ProgramCounter(#[from] ProgramCounterError),
    #[error(transparent)]
    BusValue(#[from] BusValueError),
    #[error("invalid instruction field: {0}")]
    Decode(#[from] InvalidField),
    #[error("simulation did not halt within {cycles} cycles")]
    Timeout { cycles: u64 },
}
