use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::VmError;
use crate::program::Program;
use crate::vm::VmManager;

/// General-purpose registers. Register 0 always reads as zero.
pub const NUM_REGS: usize = 32;
/// Register receiving the return address of a `call`.
pub const LINK_REGISTER: usize = 31;

/// Errors from loading or running a program on the simulated machine.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("memory access failed: {0}")]
    Memory(#[from] VmError),

    #[error("illegal instruction at pc {pc}: opcode {opcode}")]
    IllegalInstruction { pc: u32, opcode: u32 },

    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("cannot read {}: {source}", path.display())]
    File { path: PathBuf, source: io::Error },
}

impl MachineError {
    /// Shorthand for a `Parse` error at the given source line.
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        MachineError::Parse {
            line,
            msg: msg.into(),
        }
    }
}

/// The instruction set, with its wire encoding values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Add = 0,
    Addi = 1,
    Sub = 2,
    Subi = 3,
    Sge = 4,
    Sgt = 5,
    Seq = 6,
    Bt = 7,
    Bf = 8,
    Ba = 9,
    St = 10,
    Ld = 11,
    Call = 12,
    Jmp = 13,
    Mul = 14,
    Seqi = 15,
    Halt = 16,
}

impl Opcode {
    /// Decode an opcode field.
    pub fn from_raw(raw: u32) -> Option<Opcode> {
        match raw {
            0 => Some(Opcode::Add),
            1 => Some(Opcode::Addi),
            2 => Some(Opcode::Sub),
            3 => Some(Opcode::Subi),
            4 => Some(Opcode::Sge),
            5 => Some(Opcode::Sgt),
            6 => Some(Opcode::Seq),
            7 => Some(Opcode::Bt),
            8 => Some(Opcode::Bf),
            9 => Some(Opcode::Ba),
            10 => Some(Opcode::St),
            11 => Some(Opcode::Ld),
            12 => Some(Opcode::Call),
            13 => Some(Opcode::Jmp),
            14 => Some(Opcode::Mul),
            15 => Some(Opcode::Seqi),
            16 => Some(Opcode::Halt),
            _ => None,
        }
    }

    /// Look up an assembly mnemonic.
    pub fn from_mnemonic(text: &str) -> Option<Opcode> {
        match text {
            "add" => Some(Opcode::Add),
            "addi" => Some(Opcode::Addi),
            "sub" => Some(Opcode::Sub),
            "subi" => Some(Opcode::Subi),
            "sge" => Some(Opcode::Sge),
            "sgt" => Some(Opcode::Sgt),
            "seq" => Some(Opcode::Seq),
            "bt" => Some(Opcode::Bt),
            "bf" => Some(Opcode::Bf),
            "ba" => Some(Opcode::Ba),
            "st" => Some(Opcode::St),
            "ld" => Some(Opcode::Ld),
            "call" => Some(Opcode::Call),
            "jmp" => Some(Opcode::Jmp),
            "mul" => Some(Opcode::Mul),
            "seqi" => Some(Opcode::Seqi),
            "halt" => Some(Opcode::Halt),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Addi => "addi",
            Opcode::Sub => "sub",
            Opcode::Subi => "subi",
            Opcode::Sge => "sge",
            Opcode::Sgt => "sgt",
            Opcode::Seq => "seq",
            Opcode::Bt => "bt",
            Opcode::Bf => "bf",
            Opcode::Ba => "ba",
            Opcode::St => "st",
            Opcode::Ld => "ld",
            Opcode::Call => "call",
            Opcode::Jmp => "jmp",
            Opcode::Mul => "mul",
            Opcode::Seqi => "seqi",
            Opcode::Halt => "halt",
        }
    }
}

/// One encoded machine word:
/// `opcode << 26 | dest << 21 | src1 << 16 | imm & 0xffff`.
///
/// The immediate decodes sign-extended from 16 bits; its low five bits double
/// as the second source register index for the register-register forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr(u32);

impl Instr {
    pub fn new(op: Opcode, dest: u32, src1: u32, imm: i32) -> Self {
        Instr(
            ((op as u32) << 26)
                | ((dest & 0x1f) << 21)
                | ((src1 & 0x1f) << 16)
                | (imm as u32 & 0xffff),
        )
    }

    pub fn from_raw(raw: u32) -> Self {
        Instr(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn opcode(self) -> Option<Opcode> {
        Opcode::from_raw(self.opcode_raw())
    }

    pub fn opcode_raw(self) -> u32 {
        self.0 >> 26
    }

    pub fn dest(self) -> usize {
        ((self.0 >> 21) & 0x1f) as usize
    }

    pub fn src1(self) -> usize {
        ((self.0 >> 16) & 0x1f) as usize
    }

    pub fn imm(self) -> i32 {
        i32::from((self.0 & 0xffff) as u16 as i16)
    }
}

/// Register file and program counter.
#[derive(Debug, Clone)]
pub struct Cpu {
    pub pc: u32,
    pub reg: [u32; NUM_REGS],
}

impl Cpu {
    /// A fresh CPU: all registers zero, execution starting at address 0.
    pub fn new() -> Self {
        Cpu {
            pc: 0,
            reg: [0; NUM_REGS],
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Cpu {
    /// The register grid, four per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.reg.chunks(4).enumerate() {
            for (col, value) in chunk.iter().enumerate() {
                if col > 0 {
                    write!(f, "| ")?;
                }
                write!(f, "R{:02} = {:<12}", row * 4 + col, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Whether execution should continue after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halt,
}

/// A CPU wired to a demand-paged memory. Instruction fetches, loads, and
/// stores all cross the translation boundary, so running a program exercises
/// the paging machinery with no extra plumbing.
pub struct Machine {
    pub cpu: Cpu,
    pub vm: VmManager,
}

impl Machine {
    pub fn new(vm: VmManager) -> Self {
        Machine {
            cpu: Cpu::new(),
            vm,
        }
    }

    /// Place a program at address 0 by storing each word through the virtual
    /// memory, so loading itself demand-pages (and its faults are counted).
    pub fn load_program(&mut self, program: &Program) -> Result<(), MachineError> {
        for (address, instr) in program.instructions().iter().enumerate() {
            self.vm.write(address, instr.raw())?;
        }
        Ok(())
    }

    /// Fetch, decode, and execute one instruction.
    pub fn step(&mut self) -> Result<StepOutcome, MachineError> {
        let instr = Instr::from_raw(self.vm.read(self.cpu.pc as usize)?);
        let opcode = instr.opcode().ok_or(MachineError::IllegalInstruction {
            pc: self.cpu.pc,
            opcode: instr.opcode_raw(),
        })?;

        let mut dest_reg = instr.dest();
        let imm = instr.imm();
        // Operands are signed; the register file stores raw 32-bit words.
        let src1 = self.cpu.reg[instr.src1()] as i32;
        let src2 = self.cpu.reg[(imm & 0x1f) as usize] as i32;

        let mut dest_value = 0i32;
        let mut writeback = true;
        let mut increment_pc = true;
        let mut outcome = StepOutcome::Continue;

        match opcode {
            Opcode::Add => dest_value = src1.wrapping_add(src2),
            Opcode::Addi => dest_value = src1.wrapping_add(imm),
            Opcode::Sub => dest_value = src1.wrapping_sub(src2),
            Opcode::Subi => dest_value = src1.wrapping_sub(imm),
            Opcode::Mul => dest_value = src1.wrapping_mul(src2),
            Opcode::Sge => dest_value = i32::from(src1 >= src2),
            Opcode::Sgt => dest_value = i32::from(src1 > src2),
            Opcode::Seq => dest_value = i32::from(src1 == src2),
            Opcode::Seqi => dest_value = i32::from(src1 == imm),
            Opcode::Bt => {
                writeback = false;
                if src1 != 0 {
                    self.cpu.pc = imm as u32;
                    increment_pc = false;
                }
            }
            Opcode::Bf => {
                writeback = false;
                if src1 == 0 {
                    self.cpu.pc = imm as u32;
                    increment_pc = false;
                }
            }
            Opcode::Ba => {
                writeback = false;
                increment_pc = false;
                self.cpu.pc = imm as u32;
            }
            Opcode::Ld => {
                let address = src1.wrapping_add(imm) as u32;
                dest_value = self.vm.read(address as usize)? as i32;
            }
            Opcode::St => {
                let address = src1.wrapping_add(imm) as u32;
                let value = self.cpu.reg[dest_reg];
                self.vm.write(address as usize, value)?;
                writeback = false;
            }
            Opcode::Call => {
                increment_pc = false;
                dest_value = self.cpu.pc.wrapping_add(1) as i32;
                dest_reg = LINK_REGISTER;
                self.cpu.pc = imm as u32;
            }
            Opcode::Jmp => {
                increment_pc = false;
                writeback = false;
                self.cpu.pc = src1 as u32;
            }
            Opcode::Halt => {
                increment_pc = false;
                writeback = false;
                outcome = StepOutcome::Halt;
            }
        }

        if writeback && dest_reg != 0 {
            self.cpu.reg[dest_reg] = dest_value as u32;
        }
        if increment_pc {
            self.cpu.pc = self.cpu.pc.wrapping_add(1);
        }

        Ok(outcome)
    }

    /// Run until the program halts or an error surfaces.
    pub fn run(&mut self) -> Result<(), MachineError> {
        while self.step()? == StepOutcome::Continue {}
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VmConfig;

    fn machine() -> Machine {
        Machine::new(VmManager::new(VmConfig::default()))
    }

    fn run_program(source: &str) -> Machine {
        let program = Program::parse(source).unwrap();
        let mut machine = machine();
        machine.load_program(&program).unwrap();
        machine.run().unwrap();
        machine
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    #[test]
    fn test_instr_field_layout() {
        let instr = Instr::new(Opcode::Addi, 1, 2, -3);

        // 1 << 26 | 1 << 21 | 2 << 16 | 0xfffd
        assert_eq!(instr.raw(), 0x0422_fffd);
        assert_eq!(instr.opcode(), Some(Opcode::Addi));
        assert_eq!(instr.dest(), 1);
        assert_eq!(instr.src1(), 2);
        assert_eq!(instr.imm(), -3);
    }

    #[test]
    fn test_imm_sign_extension() {
        assert_eq!(Instr::new(Opcode::Addi, 0, 0, -1).imm(), -1);
        assert_eq!(Instr::new(Opcode::Addi, 0, 0, 32767).imm(), 32767);
        assert_eq!(Instr::new(Opcode::Addi, 0, 0, -32768).imm(), -32768);
        assert_eq!(Instr::new(Opcode::Addi, 0, 0, 0).imm(), 0);
    }

    #[test]
    fn test_opcode_roundtrip() {
        for raw in 0..=16 {
            let op = Opcode::from_raw(raw).unwrap();
            assert_eq!(op as u32, raw);
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
        assert_eq!(Opcode::from_raw(17), None);
        assert_eq!(Opcode::from_raw(63), None);
        assert_eq!(Opcode::from_mnemonic("nop"), None);
    }

    // =========================================================================
    // Execution
    // =========================================================================

    #[test]
    fn test_arithmetic_and_register_operand() {
        let machine = run_program(
            "addi 1,0,5\n\
             addi 2,0,7\n\
             add 3,1,2\n\
             mul 4,3,2\n\
             sub 5,3,1\n\
             halt 0,0,0\n",
        );

        assert_eq!(machine.cpu.reg[3], 12);
        assert_eq!(machine.cpu.reg[4], 84);
        assert_eq!(machine.cpu.reg[5], 7);
    }

    #[test]
    fn test_register_zero_is_never_written() {
        let machine = run_program("addi 0,0,99\nhalt 0,0,0\n");
        assert_eq!(machine.cpu.reg[0], 0);
    }

    #[test]
    fn test_signed_comparisons() {
        let machine = run_program(
            "addi 1,0,-1\n\
             addi 2,0,1\n\
             sge 3,1,2\n\
             sgt 4,2,1\n\
             seq 5,1,1\n\
             seqi 6,1,-1\n\
             halt 0,0,0\n",
        );

        assert_eq!(machine.cpu.reg[3], 0); // -1 >= 1 is false, signed
        assert_eq!(machine.cpu.reg[4], 1);
        assert_eq!(machine.cpu.reg[5], 1);
        assert_eq!(machine.cpu.reg[6], 1);
    }

    #[test]
    fn test_branches() {
        // bt taken skips the addi; bf not taken falls through
        let machine = run_program(
            "addi 1,0,1\n\
             bt 0,1,3\n\
             addi 2,0,55\n\
             bf 0,1,5\n\
             addi 3,0,66\n\
             halt 0,0,0\n",
        );

        assert_eq!(machine.cpu.reg[2], 0); // skipped by bt
        assert_eq!(machine.cpu.reg[3], 66); // bf on a truthy register falls through
    }

    #[test]
    fn test_loop_sums_to_halt() {
        // Sum 1..=10 into r2
        let machine = run_program(
            "addi 1,0,10\n\
             addi 2,0,0\n\
             bf 0,1,6\n\
             add 2,2,1\n\
             subi 1,1,1\n\
             ba 0,0,2\n\
             halt 0,0,0\n",
        );

        assert_eq!(machine.cpu.reg[1], 0);
        assert_eq!(machine.cpu.reg[2], 55);
    }

    #[test]
    fn test_load_store() {
        let machine = run_program(
            "addi 1,0,100\n\
             addi 2,0,42\n\
             st 2,1,0\n\
             ld 3,1,4\n\
             ld 4,1,0\n\
             halt 0,0,0\n",
        );

        assert_eq!(machine.cpu.reg[4], 42);
        assert_eq!(machine.cpu.reg[3], 0); // untouched word reads zero
    }

    #[test]
    fn test_call_links_and_jmp_returns() {
        let machine = run_program(
            "call 0,0,3\n\
             halt 0,0,0\n\
             halt 0,0,0\n\
             addi 1,0,9\n\
             jmp 0,31,0\n",
        );

        // call from address 0 linked address 1, the subroutine ran, and jmp
        // through the link register came back to the halt
        assert_eq!(machine.cpu.reg[LINK_REGISTER], 1);
        assert_eq!(machine.cpu.reg[1], 9);
        assert_eq!(machine.cpu.pc, 1);
    }

    #[test]
    fn test_halt_leaves_pc_in_place() {
        let machine = run_program("addi 1,0,4\nhalt 0,0,0\n");
        assert_eq!(machine.cpu.pc, 1);
    }

    #[test]
    fn test_illegal_instruction() {
        let mut machine = machine();
        machine.vm.write(0, 17 << 26).unwrap();

        let err = machine.step().unwrap_err();
        match err {
            MachineError::IllegalInstruction { pc, opcode } => {
                assert_eq!(pc, 0);
                assert_eq!(opcode, 17);
            }
            other => panic!("expected illegal instruction, got {other:?}"),
        }
    }

    #[test]
    fn test_load_faults_are_counted() {
        // One page of instructions: loading faults once, running adds none
        let program = Program::parse("addi 1,0,1\naddi 2,0,2\nhalt 0,0,0\n").unwrap();
        let mut machine = machine();
        machine.load_program(&program).unwrap();
        assert_eq!(machine.vm.stats().page_faults, 1);

        machine.run().unwrap();
        assert_eq!(machine.vm.stats().page_faults, 1);
    }

    #[test]
    fn test_register_grid_format() {
        let mut cpu = Cpu::new();
        cpu.reg[1] = 55;
        let grid = cpu.to_string();

        assert!(grid.contains("R00 = 0"));
        assert!(grid.contains("| R01 = 55"));
        assert!(grid.contains("R31 = 0"));
        assert_eq!(grid.lines().count(), 8);
    }
}
