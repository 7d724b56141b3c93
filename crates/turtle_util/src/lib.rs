pub mod bit;
pub mod bus;

pub use bit::{Bit, BitSet};
pub use bus::{BusValueError, DataAddressBusValue, DataBusValue, InstructionAddressBusValue};
