//! Memory modules with a fixed request/complete/tick latency protocol (§4.4).
//! Backing storage is sparse: reading an address that was never written is a
//! segfault rather than an implicit zero.

use std::collections::HashMap;

use turtle_util::{DataAddressBusValue, DataBusValue, InstructionAddressBusValue};

use crate::error::MemoryError;

trait MemoryAddress: Copy + Eq + std::hash::Hash {
    fn raw(self) -> u32;
}

impl MemoryAddress for DataAddressBusValue {
    fn raw(self) -> u32 {
        self.unsigned()
    }
}

impl MemoryAddress for InstructionAddressBusValue {
    fn raw(self) -> u32 {
        self.unsigned()
    }
}

#[derive(Debug, Clone, Copy)]
enum Request<A, V> {
    Read { address: A },
    Write { address: A, value: V },
}

impl<A: MemoryAddress, V: PartialEq + Copy> Request<A, V> {
    fn matches(&self, other: &Request<A, V>) -> bool {
        self == other
    }
}

impl<A: PartialEq, V: PartialEq> PartialEq for Request<A, V>
where
    A: Copy,
    V: Copy,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Request::Read { address: a }, Request::Read { address: b }) => a == b,
            (Request::Write { address: a, value: v1 }, Request::Write { address: b, value: v2 }) => {
                a == b && v1 == v2
            }
            _ => false,
        }
    }
}
impl<A: PartialEq + Copy, V: PartialEq + Copy> Eq for Request<A, V> {}

/// Shared engine behind [`DataMemory`] and [`InstructionMemory`]: a sparse
/// store plus a single in-flight request with a fixed countdown latency.
struct MemoryEngine<A, V> {
    store: HashMap<A, V>,
    latency_cycles: u32,
    pending: Option<(Request<A, V>, u32)>,
    completed: Option<Request<A, V>>,
}

impl<A: MemoryAddress, V: PartialEq + Copy> MemoryEngine<A, V> {
    fn new(latency_cycles: u32) -> Self {
        Self {
            store: HashMap::new(),
            latency_cycles,
            pending: None,
            completed: None,
        }
    }

    fn request(&mut self, request: Request<A, V>) -> Result<(), MemoryError> {
        if let Some(done) = &self.completed {
            if !done.matches(&request) {
                return Err(MemoryError::ConflictingOperation);
            }
            return Ok(());
        }
        match &self.pending {
            Some((existing, _)) if !existing.matches(&request) => Err(MemoryError::ConflictingOperation),
            Some(_) => Ok(()),
            None => {
                if self.latency_cycles == 0 {
                    self.completed = Some(request);
                } else {
                    self.pending = Some((request, self.latency_cycles));
                }
                Ok(())
            }
        }
    }

    fn operation_complete(&self) -> bool {
        self.completed.is_some()
    }

    fn tick(&mut self) {
        if let Some((request, remaining)) = self.pending.take() {
            if remaining <= 1 {
                self.completed = Some(request);
            } else {
                self.pending = Some((request, remaining - 1));
            }
        }
    }

    fn take_read_result(&mut self) -> Result<V, MemoryError> {
        match self.completed.take() {
            Some(Request::Read { address }) => self
                .store
                .get(&address)
                .copied()
                .ok_or(MemoryError::Segfault { address: address.raw() }),
            Some(other) => {
                self.completed = Some(other);
                Err(MemoryError::NoPendingResult)
            }
            None => Err(MemoryError::NoPendingResult),
        }
    }

    fn complete_write(&mut self) -> Result<(), MemoryError> {
        match self.completed.take() {
            Some(Request::Write { address, value }) => {
                self.store.insert(address, value);
                Ok(())
            }
            Some(other) => {
                self.completed = Some(other);
                Err(MemoryError::NoPendingResult)
            }
            None => Err(MemoryError::NoPendingResult),
        }
    }

    fn load_raw(&mut self, address: A, value: V) {
        self.store.insert(address, value);
    }

    fn is_idle(&self) -> bool {
        self.pending.is_none() && self.completed.is_none()
    }
}

/// The separate data memory bus, addressed by DMAR.
pub struct DataMemory {
    engine: MemoryEngine<DataAddressBusValue, DataBusValue>,
}

impl DataMemory {
    pub fn new(latency_cycles: u32) -> Self {
        Self { engine: MemoryEngine::new(latency_cycles) }
    }

    pub fn request_load(&mut self, address: DataAddressBusValue) -> Result<(), MemoryError> {
        self.engine.request(Request::Read { address })
    }

    pub fn request_store(&mut self, address: DataAddressBusValue, value: DataBusValue) -> Result<(), MemoryError> {
        self.engine.request(Request::Write { address, value })
    }

    pub fn operation_complete(&self) -> bool {
        self.engine.operation_complete()
    }

    pub fn take_load_result(&mut self) -> Result<DataBusValue, MemoryError> {
        self.engine.take_read_result()
    }

    pub fn complete_store(&mut self) -> Result<(), MemoryError> {
        self.engine.complete_write()
    }

    pub fn tick(&mut self) {
        self.engine.tick();
    }

    pub fn poke(&mut self, address: DataAddressBusValue, value: DataBusValue) {
        self.engine.load_raw(address, value);
    }

    /// True iff there is no in-flight or completed-but-uncollected operation.
    pub fn is_idle(&self) -> bool {
        self.engine.is_idle()
    }
}

/// The instruction memory bus, addressed by IMAR. Read-only from the
/// simulator's point of view once [`InstructionMemory::load_binary`] has run.
pub struct InstructionMemory {
    engine: MemoryEngine<InstructionAddressBusValue, u16>,
}

impl InstructionMemory {
    pub fn new(latency_cycles: u32) -> Self {
        Self { engine: MemoryEngine::new(latency_cycles) }
    }

    /// Load an assembled image as consecutive 2-byte little-endian words,
    /// keyed by byte address (stride 2) starting at zero, matching the
    /// assembler's own byte-addressed labels and jump/branch offsets.
    pub fn load_binary(&mut self, image: &[u8]) {
        for (index, word) in image.chunks(2).enumerate() {
            let bytes = [word[0], *word.get(1).unwrap_or(&0)];
            let address = InstructionAddressBusValue::from_unsigned(index as u32 * 2);
            self.engine.load_raw(address, u16::from_le_bytes(bytes));
        }
    }

    pub fn request_fetch(&mut self, address: InstructionAddressBusValue) -> Result<(), MemoryError> {
        self.engine.request(Request::Read { address })
    }

    pub fn operation_complete(&self) -> bool {
        self.engine.operation_complete()
    }

    pub fn take_fetch_result(&mut self) -> Result<u16, MemoryError> {
        self.engine.take_read_result()
    }

    pub fn tick(&mut self) {
        self.engine.tick();
    }

    /// True iff there is no in-flight or completed-but-uncollected operation.
    pub fn is_idle(&self) -> bool {
        self.engine.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u32) -> DataAddressBusValue {
        DataAddressBusValue::from_unsigned(n)
    }

    fn val(n: u32) -> DataBusValue {
        DataBusValue::from_unsigned(n)
    }

    #[test]
    fn zero_latency_completes_immediately() {
        let mut mem = DataMemory::new(0);
        mem.poke(addr(4), val(9));
        mem.request_load(addr(4)).unwrap();
        assert!(mem.operation_complete());
        assert_eq!(mem.take_load_result().unwrap().unsigned(), 9);
    }

    #[test]
    fn nonzero_latency_needs_ticks() {
        let mut mem = DataMemory::new(3);
        mem.poke(addr(0), val(1));
        mem.request_load(addr(0)).unwrap();
        assert!(!mem.operation_complete());
        mem.tick();
        assert!(!mem.operation_complete());
        mem.tick();
        assert!(!mem.operation_complete());
        mem.tick();
        assert!(mem.operation_complete());
    }

    #[test]
    fn repeating_the_same_request_is_not_a_conflict() {
        let mut mem = DataMemory::new(2);
        mem.request_load(addr(1)).unwrap();
        assert!(mem.request_load(addr(1)).is_ok());
    }

    #[test]
    fn a_different_request_mid_flight_is_a_conflict() {
        let mut mem = DataMemory::new(2);
        mem.request_load(addr(1)).unwrap();
        assert!(mem.request_load(addr(2)).is_err());
    }

    #[test]
    fn reading_an_unwritten_address_is_a_segfault() {
        let mut mem = DataMemory::new(0);
        mem.request_load(addr(5)).unwrap();
        assert!(matches!(mem.take_load_result(), Err(MemoryError::Segfault { address: 5 })));
    }

    #[test]
    fn store_then_load_round_trips() {
        let mut mem = DataMemory::new(0);
        mem.request_store(addr(2), val(42)).unwrap();
        mem.complete_store().unwrap();
        mem.request_load(addr(2)).unwrap();
        assert_eq!(mem.take_load_result().unwrap().unsigned(), 42);
    }

    #[test]
    fn instruction_memory_loads_little_endian_words_keyed_by_byte_address() {
        let mut imem = InstructionMemory::new(0);
        imem.load_binary(&[0x34, 0x12, 0xff, 0x00]);
        imem.request_fetch(InstructionAddressBusValue::from_unsigned(0)).unwrap();
        assert_eq!(imem.take_fetch_result().unwrap(), 0x1234);
        imem.request_fetch(InstructionAddressBusValue::from_unsigned(2)).unwrap();
        assert_eq!(imem.take_fetch_result().unwrap(), 0x00ff);
    }
}
