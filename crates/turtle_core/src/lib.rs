//! Cycle-accurate simulator for the Turtle CPU: ALU, register file, separate
//! instruction/data memories with configurable latency, program counter, and
//! the decoder that ties a fetched word to the operation it names.

#[macro_use]
extern crate log;

mod alu;
mod decode;
mod driver;
mod error;
mod memory;
mod program_counter;
mod register_file;

pub use alu::AluOutput;
pub use decode::{decode, DecodedInstruction, DecodedOp};
pub use driver::Simulator;
pub use error::{MemoryError, ProgramCounterError, RegisterFileError, SimulationError};
pub use memory::{DataMemory, InstructionMemory};
pub use program_counter::ProgramCounter;
pub use register_file::RegisterFile;
