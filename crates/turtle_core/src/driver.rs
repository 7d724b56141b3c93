//! Per-cycle pipeline orchestrator (§4.8): fetch, decode, execute, memory,
//! then a program-counter update, with a separate commit pass that lands
//! every stage's pending writes at once.

use turtle_isa::{ArithLogicFunction, JumpFunction, RegMemoryFunction};
use turtle_util::DataBusValue;

use crate::alu;
use crate::decode::{decode, DecodedInstruction, DecodedOp};
use crate::error::SimulationError;
use crate::memory::{DataMemory, InstructionMemory};
use crate::program_counter::ProgramCounter;
use crate::register_file::RegisterFile;

pub struct Simulator {
    registers: RegisterFile,
    instruction_memory: InstructionMemory,
    data_memory: DataMemory,
    pc: ProgramCounter,
    cycle_count: u64,
    halted: bool,
    /// A decoded instruction stashed across a stalling memory stage so the
    /// next cycle resumes execution instead of re-fetching at the same PC,
    /// which would otherwise restart the instruction memory's latency
    /// countdown every cycle the stall persists.
    pending_instruction: Option<DecodedInstruction>,
    instruction_fetch_latency_cycles: u32,
}

impl Simulator {
    pub fn new(instruction_fetch_latency_cycles: u32, data_memory_latency_cycles: u32) -> Self {
        Self {
            registers: RegisterFile::new(),
            instruction_memory: InstructionMemory::new(instruction_fetch_latency_cycles),
            data_memory: DataMemory::new(data_memory_latency_cycles),
            pc: ProgramCounter::new(),
            cycle_count: 0,
            halted: false,
            pending_instruction: None,
            instruction_fetch_latency_cycles,
        }
    }

    /// Replaces instruction memory with a freshly loaded image, clearing any
    /// previously loaded program.
    pub fn load_binary(&mut self, image: &[u8]) {
        self.instruction_memory = InstructionMemory::new(self.instruction_fetch_latency_cycles);
        self.instruction_memory.load_binary(image);
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn data_memory(&self) -> &DataMemory {
        &self.data_memory
    }

    pub fn execute_cycle(&mut self) -> Result<(), SimulationError> {
        if self.halted {
            self.commit_all()?;
            return Ok(());
        }
        self.cycle_count += 1;

        let decoded = match self.pending_instruction.take() {
            Some(decoded) => decoded,
            None => match self.fetch_and_decode()? {
                Some(decoded) => decoded,
                None => {
                    trace!("cycle {}: stalled on fetch", self.cycle_count);
                    self.commit_all()?;
                    return Ok(());
                }
            },
        };
        self.pc.set_stall(false);

        if matches!(decoded.op, DecodedOp::JumpImm { offset: 0 }) {
            self.halted = true;
            info!("cycle {}: halted", self.cycle_count);
            self.commit_all()?;
            return Ok(());
        }

        self.execute_stage(&decoded)?;

        if self.memory_stage(&decoded)?.is_some() {
            debug!("cycle {}: stalled in memory stage", self.cycle_count);
            self.pending_instruction = Some(decoded);
            self.pc.set_stall(true);
            self.commit_all()?;
            return Ok(());
        }

        self.pc_update_stage(&decoded)?;
        self.commit_all()?;
        Ok(())
    }

    fn fetch_and_decode(&mut self) -> Result<Option<DecodedInstruction>, SimulationError> {
        let pc_value = self.pc.value();
        self.instruction_memory.request_fetch(pc_value)?;
        if !self.instruction_memory.operation_complete() {
            self.pc.set_stall(true);
            return Ok(None);
        }
        let word = self.instruction_memory.take_fetch_result()?;
        Ok(Some(decode(word)?))
    }

    fn execute_stage(&mut self, decoded: &DecodedInstruction) -> Result<(), SimulationError> {
        match decoded.op {
            DecodedOp::ArithLogic { function, register } => {
                let b = match register {
                    Some(reg) => self.registers.get(reg),
                    None => DataBusValue::from_unsigned(0),
                };
                self.run_alu(function, b);
            }
            DecodedOp::ArithLogicImm { function, immediate } => {
                let b = DataBusValue::from_unsigned(immediate as u32);
                self.run_alu(function, b);
            }
            DecodedOp::RegisterFile { function, register, immediate } => match function {
                RegMemoryFunction::Set => {
                    let imm = immediate.expect("SET always carries an immediate");
                    self.registers.set_next_acc(DataBusValue::from_unsigned(imm as u32));
                }
                RegMemoryFunction::Get => {
                    let reg = register.expect("GET always carries a register");
                    let value = self.registers.get(reg);
                    self.registers.set_next_acc(value);
                }
                RegMemoryFunction::Put => {
                    let reg = register.expect("PUT always carries a register");
                    let acc = self.registers.get_acc();
                    self.registers.set_next(reg, acc)?;
                }
                RegMemoryFunction::Load | RegMemoryFunction::Store => {}
            },
            DecodedOp::JumpImm { .. } | DecodedOp::JumpReg { .. } | DecodedOp::Branch { .. } => {}
        }
        Ok(())
    }

    fn run_alu(&mut self, function: ArithLogicFunction, b: DataBusValue) {
        let acc = self.registers.get_acc();
        let out = alu::execute(acc, b, function);
        self.registers.set_next_acc(out.result);
        self.registers.set_next_status_flags(out.carry, out.overflow);
    }

    /// Returns `Ok(Some(()))` on a memory stall, `Ok(None)` otherwise.
    fn memory_stage(&mut self, decoded: &DecodedInstruction) -> Result<Option<()>, SimulationError> {
        let DecodedOp::RegisterFile { function, .. } = decoded.op else {
            return Ok(None);
        };
        let dmar = self.registers.get_dmar();
        match function {
            RegMemoryFunction::Load => {
                self.data_memory.request_load(dmar)?;
                if !self.data_memory.operation_complete() {
                    return Ok(Some(()));
                }
                let value = self.data_memory.take_load_result()?;
                self.registers.set_next_acc(value);
                Ok(None)
            }
            RegMemoryFunction::Store => {
                self.data_memory.request_store(dmar, self.registers.get_acc())?;
                if !self.data_memory.operation_complete() {
                    return Ok(Some(()));
                }
                self.data_memory.complete_store()?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn pc_update_stage(&mut self, decoded: &DecodedInstruction) -> Result<(), SimulationError> {
        match decoded.op {
            DecodedOp::Branch { condition, offset } => {
                let status = self.registers.get_status().unsigned();
                let target = self.pc.relative_target(offset);
                self.pc.conditionally_branch(condition, status, target);
            }
            DecodedOp::JumpImm { offset } => self.pc.jump_relative(offset),
            DecodedOp::JumpReg { function } => {
                let imar = self.registers.get_imar();
                match function {
                    JumpFunction::JumpRelative => self.pc.jump_relative(imar.unsigned() as i32),
                    JumpFunction::JumpAbsolute => self.pc.jump_absolute(imar),
                }
            }
            _ => self.pc.increment(),
        }
        Ok(())
    }

    fn commit_all(&mut self) -> Result<(), SimulationError> {
        self.registers.commit();
        self.instruction_memory.tick();
        self.data_memory.tick();
        self.pc.commit()?;
        Ok(())
    }

    pub fn run_until_halt(&mut self, max_cycles: Option<u64>) -> Result<(), SimulationError> {
        loop {
            self.execute_cycle()?;
            if self.halted {
                return Ok(());
            }
            if let Some(max) = max_cycles {
                if self.cycle_count >= max {
                    return Err(SimulationError::Timeout { cycles: self.cycle_count });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turtle_isa::RegisterIndex;

    fn run(source: &str, max_cycles: Option<u64>) -> Simulator {
        let image = turtle_asm::assemble(source).unwrap();
        let mut sim = Simulator::new(0, 0);
        sim.load_binary(&image);
        sim.run_until_halt(max_cycles).unwrap();
        sim
    }

    #[test]
    fn set_and_add_immediate() {
        let sim = run("SET 1\nADDI 2\nHALT\n", None);
        assert_eq!(sim.registers().get_acc().unsigned(), 3);
    }

    #[test]
    fn put_then_add_register() {
        let sim = run("SET 1\nPUT R0\nSET 2\nADD R0\nHALT\n", None);
        assert_eq!(sim.registers().get_acc().unsigned(), 3);
        assert_eq!(sim.registers().get(RegisterIndex::R0).unsigned(), 1);
    }

    #[test]
    fn inv_complements_acc() {
        let sim = run("SET 0x0F\nINV\nHALT\n", None);
        assert_eq!(sim.registers().get_acc().unsigned(), 0xF0);
    }

    #[test]
    fn branch_taken_on_carry() {
        let sim = run("SET 0xFF\nADDI 6\nBCS 4\nSET 0\nHALT\n", None);
        assert_eq!(sim.registers().get_acc().unsigned(), 5);
    }

    #[test]
    fn store_then_load_round_trips_through_dmar_zero() {
        let sim = run("SET 1\nSTORE\nSET 0\nLOAD\nHALT\n", None);
        assert_eq!(sim.registers().get_acc().unsigned(), 1);
    }

    #[test]
    fn a_genuine_infinite_loop_times_out() {
        // A two-instruction bounce never produces the self-jump bit pattern
        // (address_immediate == 0) that means halt, so it runs forever.
        let source = "A:\nJMPI B\nB:\nJMPI A\n";
        let image = turtle_asm::assemble(source).unwrap();
        let mut sim = Simulator::new(0, 0);
        sim.load_binary(&image);
        let err = sim.run_until_halt(Some(10)).unwrap_err();
        assert!(matches!(err, SimulationError::Timeout { cycles: 10 }));
    }

    #[test]
    fn no_module_has_pending_state_once_halted() {
        let sim = run("SET 1\nSTORE\nSET 0\nLOAD\nADDI 2\nHALT\n", None);
        assert!(!sim.registers().has_pending_writes());
        assert!(!sim.pc.has_pending());
        assert!(sim.data_memory().is_idle());
        assert!(sim.instruction_memory.is_idle());
    }

    #[test]
    fn run_until_halt_is_idempotent_under_watchdog_widening() {
        let source = "SET 1\nPUT R0\nSET 2\nADD R0\nHALT\n";

        let image = turtle_asm::assemble(source).unwrap();
        let mut exact = Simulator::new(0, 0);
        exact.load_binary(&image);
        exact.run_until_halt(Some(exact_cycle_count(source))).unwrap();

        let mut unbounded = Simulator::new(0, 0);
        unbounded.load_binary(&image);
        unbounded.run_until_halt(None).unwrap();

        assert_eq!(exact.registers().get_acc().unsigned(), unbounded.registers().get_acc().unsigned());
        assert_eq!(exact.registers().get(RegisterIndex::R0).unsigned(), unbounded.registers().get(RegisterIndex::R0).unsigned());
        assert_eq!(exact.cycle_count(), unbounded.cycle_count());
    }

    fn exact_cycle_count(source: &str) -> u64 {
        let image = turtle_asm::assemble(source).unwrap();
        let mut sim = Simulator::new(0, 0);
        sim.load_binary(&image);
        sim.run_until_halt(None).unwrap();
        sim.cycle_count()
    }

    #[test]
    fn cycle_count_equals_number_of_non_halted_execute_cycle_calls() {
        let image = turtle_asm::assemble("SET 1\nADDI 2\nHALT\n").unwrap();
        let mut sim = Simulator::new(0, 0);
        sim.load_binary(&image);

        let mut manual_count = 0u64;
        while !sim.is_halted() {
            manual_count += 1;
            sim.execute_cycle().unwrap();
        }
        assert_eq!(sim.cycle_count(), manual_count);
    }
}
