use std::fs;
use std::path::Path;

use crate::cpu::{Instr, MachineError, Opcode};

/// A parsed program, ready to be loaded at address 0.
///
/// The source format is one instruction per line: a mnemonic followed by
/// three comma-separated integer operands (`dest,src1,imm`). A `;` starts a
/// comment running to the end of the line; blank lines are skipped. Only
/// instruction lines consume addresses, so comments never shift branch
/// targets.
#[derive(Debug, Clone)]
pub struct Program {
    instructions: Vec<Instr>,
}

impl Program {
    /// Parse assembly source into encoded instructions.
    pub fn parse(source: &str) -> Result<Program, MachineError> {
        let mut instructions = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let number = index + 1;
            let code = match line.split_once(';') {
                Some((code, _comment)) => code,
                None => line,
            };
            let code = code.trim();
            if code.is_empty() {
                continue;
            }

            let (mnemonic, operands) = code
                .split_once(char::is_whitespace)
                .ok_or_else(|| MachineError::parse(number, "missing operands"))?;
            let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
                MachineError::parse(number, format!("unknown instruction `{mnemonic}`"))
            })?;

            let fields: Vec<&str> = operands.split(',').collect();
            if fields.len() != 3 {
                return Err(MachineError::parse(
                    number,
                    format!("expected 3 operands, found {}", fields.len()),
                ));
            }
            let dest = parse_operand(fields[0], number)?;
            let src1 = parse_operand(fields[1], number)?;
            let imm = parse_operand(fields[2], number)?;

            instructions.push(Instr::new(opcode, dest as u32, src1 as u32, imm));
        }

        Ok(Program { instructions })
    }

    /// Read and parse a program from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Program, MachineError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| MachineError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Program::parse(&source)
    }

    pub fn instructions(&self) -> &[Instr] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

fn parse_operand(field: &str, line: usize) -> Result<i32, MachineError> {
    field
        .trim()
        .parse()
        .map_err(|_| MachineError::parse(line, format!("bad operand `{}`", field.trim())))
}
