//! Two-pass assembler and disassembler.
//!
//! First pass walks the text once to resolve every label to a byte
//! address; the second pass re-walks it to emit one encoded word per
//! instruction, now free to resolve forward references. Errors are
//! collected per line rather than raised eagerly, so a caller sees
//! every mistake in a source file in one pass instead of one at a
//! time.

use std::collections::HashMap;

pub use crate::common::AssembleError;
use crate::core::control;

/// The implicit stack pointer used by PUSH/POP. Distinct from
/// `control::LINK_REG`; PUSH/POP do not auto-adjust it -- callers
/// manage it explicitly with ADDI, the same as any other register.
pub const SP_REG: u8 = 29;

struct Line<'a> {
    number: usize,
    label: Option<&'a str>,
    instruction: Option<&'a str>,
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn split_label(line: &str) -> (Option<&str>, Option<&str>) {
    let line = line.trim();
    if let Some(colon) = line.find(':') {
        let label = line[..colon].trim();
        let rest = line[colon + 1..].trim();
        let rest = if rest.is_empty() { None } else { Some(rest) };
        (Some(label), rest)
    } else {
        (None, Some(line))
    }
}

fn parse_lines(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let stripped = strip_comment(raw).trim();
            if stripped.is_empty() {
                return None;
            }
            let (label, instruction) = split_label(stripped);
            Some(Line {
                number: i + 1,
                label,
                instruction,
            })
        })
        .collect()
}

fn parse_register(tok: &str) -> Result<u8, String> {
    let tok = tok.trim();
    if tok.len() < 2 || !tok.as_bytes()[0].eq_ignore_ascii_case(&b'r') {
        return Err(format!("expected a register, found '{}'", tok));
    }
    tok[1..]
        .parse::<u32>()
        .ok()
        .filter(|n| *n < 32)
        .map(|n| n as u8)
        .ok_or_else(|| format!("invalid register '{}'", tok))
}

fn parse_literal(tok: &str) -> Result<i64, String> {
    let tok = tok.trim().trim_start_matches('#');
    let (negative, tok) = match tok.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, tok),
    };
    let value = if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = tok.strip_prefix("0b").or_else(|| tok.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else {
        tok.parse::<i64>()
    }
    .map_err(|_| format!("invalid numeric literal '{}'", tok))?;
    Ok(if negative { -value } else { value })
}

/// Parses a literal-or-label operand into a sign-extendable value,
/// resolving the label against `symbols` if present, relative to
/// `current_address`. Resolves to the encoded word-displacement
/// `(target - current) >> 2` for a symbol, or the literal value
/// unchanged otherwise.
fn parse_branch_operand(
    tok: &str,
    symbols: &HashMap<String, u32>,
    current_address: u32,
) -> Result<i64, String> {
    let tok = tok.trim();
    if let Some(&target) = symbols.get(tok) {
        Ok((target as i64 - current_address as i64) >> 2)
    } else if tok.chars().next().map(|c| c.is_ascii_digit() || c == '#' || c == '-').unwrap_or(false) {
        parse_literal(tok)
    } else {
        Err(format!("undefined label '{}'", tok))
    }
}

fn split_operands(rest: &str) -> Vec<&str> {
    rest.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Parses the bracketed `[Rs1 + imm]` / `[Rs1]` memory operand.
fn parse_memory_operand(tok: &str) -> Result<(u8, i64), String> {
    let tok = tok.trim();
    let inner = tok
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("expected '[Rs1 + imm]', found '{}'", tok))?;
    match inner.split_once('+') {
        Some((base, imm)) => Ok((parse_register(base)?, parse_literal(imm)?)),
        None => Ok((parse_register(inner)?, 0)),
    }
}

fn encode_reg(opcode: u8, dest: u8, src1: u8, src2: u8) -> u32 {
    (opcode as u32) << 24 | (dest as u32) << 16 | (src1 as u32) << 8 | src2 as u32
}

fn encode_imm(opcode: u8, dest: u8, src1: u8, imm: i64) -> u32 {
    (opcode as u32) << 24 | (dest as u32) << 16 | (src1 as u32) << 8 | (imm as u8 as u32)
}

fn assemble_instruction(
    text: &str,
    symbols: &HashMap<String, u32>,
    current_address: u32,
) -> Result<u32, String> {
    let mut parts = text.splitn(2, char::is_whitespace);
    let mnemonic = parts.next().unwrap_or("").to_ascii_uppercase();
    let rest = parts.next().unwrap_or("").trim();
    let operands = split_operands(rest);

    if mnemonic == "MOV" {
        if operands.len() != 2 {
            return Err("MOV expects 2 operands".into());
        }
        let dest = parse_register(operands[0])?;
        let src = parse_register(operands[1])?;
        return Ok(encode_reg(control::ADD, dest, src, 0));
    }

    let opcode = control::opcode_of(&mnemonic).ok_or_else(|| format!("unknown opcode '{}'", mnemonic))?;

    use control::*;
    match opcode {
        ADD..=DIV => {
            if operands.len() != 3 {
                return Err(format!("{} expects 3 operands", mnemonic));
            }
            let dest = parse_register(operands[0])?;
            let src1 = parse_register(operands[1])?;
            let src2 = parse_register(operands[2])?;
            Ok(encode_reg(opcode, dest, src1, src2))
        }
        ADDI..=SLTI => {
            if operands.len() != 3 {
                return Err(format!("{} expects 3 operands", mnemonic));
            }
            let dest = parse_register(operands[0])?;
            let src1 = parse_register(operands[1])?;
            let imm = parse_literal(operands[2])?;
            Ok(encode_imm(opcode, dest, src1, imm))
        }
        MOVI => {
            if operands.len() != 2 {
                return Err("MOVI expects 2 operands".into());
            }
            let dest = parse_register(operands[0])?;
            let imm = parse_literal(operands[1])?;
            Ok(encode_imm(opcode, dest, 0, imm))
        }
        LOAD | POP => {
            if operands.len() != 2 {
                return Err(format!("{} expects 2 operands", mnemonic));
            }
            let dest = parse_register(operands[0])?;
            let (base, imm) = if opcode == POP {
                (SP_REG, 0)
            } else {
                parse_memory_operand(operands[1])?
            };
            Ok(encode_imm(opcode, dest, base, imm))
        }
        STORE => {
            if operands.len() != 2 {
                return Err("STORE expects 2 operands".into());
            }
            let value = parse_register(operands[0])?;
            let (base, imm) = parse_memory_operand(operands[1])?;
            Ok(encode_imm(opcode, value, base, imm))
        }
        PUSH => {
            if operands.len() != 1 {
                return Err("PUSH expects 1 operand".into());
            }
            let value = parse_register(operands[0])?;
            Ok(encode_imm(opcode, value, SP_REG, 0))
        }
        JMP | CALL => {
            if operands.len() != 1 {
                return Err(format!("{} expects 1 operand", mnemonic));
            }
            let disp = parse_branch_operand(operands[0], symbols, current_address)?;
            Ok(encode_imm(opcode, 0, 0, disp))
        }
        BEQ | BNE | BLT | BGE => {
            if operands.len() != 3 {
                return Err(format!("{} expects 3 operands", mnemonic));
            }
            let rs1 = parse_register(operands[0])?;
            let rs2 = parse_register(operands[1])?;
            let disp = parse_branch_operand(operands[2], symbols, current_address)?;
            Ok(encode_imm(opcode, rs1, rs2, disp))
        }
        RET | HALT => {
            if !operands.is_empty() {
                return Err(format!("{} takes no operands", mnemonic));
            }
            Ok(encode_reg(opcode, 0, 0, 0))
        }
        IO_READ => {
            if operands.len() != 2 {
                return Err("IO_READ expects 2 operands".into());
            }
            let dest = parse_register(operands[0])?;
            let port = parse_literal(operands[1])?;
            Ok(encode_imm(opcode, dest, 0, port))
        }
        IO_WRITE => {
            if operands.len() != 2 {
                return Err("IO_WRITE expects 2 operands".into());
            }
            let value = parse_register(operands[0])?;
            let port = parse_literal(operands[1])?;
            Ok(encode_imm(opcode, value, 0, port))
        }
        _ => Err(format!("unsupported opcode '{}'", mnemonic)),
    }
}

/// Assembles `text` into a sequence of 32-bit words, or a batch of
/// line-tagged errors if any line fails. No partial machine code is
/// emitted on error.
pub fn assemble(text: &str) -> Result<Vec<u32>, Vec<AssembleError>> {
    let lines = parse_lines(text);

    let mut symbols = HashMap::new();
    let mut address = 0u32;
    for line in &lines {
        if let Some(label) = line.label {
            symbols.insert(label.to_string(), address);
        }
        if line.instruction.is_some() {
            address += 4;
        }
    }

    let mut words = Vec::new();
    let mut errors = Vec::new();
    let mut address = 0u32;
    for line in &lines {
        let Some(instruction) = line.instruction else {
            continue;
        };
        match assemble_instruction(instruction, &symbols, address) {
            Ok(word) => words.push(word),
            Err(message) => errors.push(AssembleError {
                line: line.number,
                message,
            }),
        }
        address += 4;
    }

    if errors.is_empty() {
        Ok(words)
    } else {
        Err(errors)
    }
}

/// Disassembles one 32-bit word into its textual form. Unknown
/// opcodes render as a raw hex comment.
pub fn disassemble(word: u32) -> String {
    let d = control::decode(word);
    use control::*;
    let Some(mnemonic) = control::mnemonic(d.opcode) else {
        return format!("; unknown opcode {:#04x}", d.opcode);
    };

    match d.opcode {
        ADD..=DIV => format!("{} R{}, R{}, R{}", mnemonic, d.dest, d.src1, d.src2),
        ADDI..=SLTI => format!("{} R{}, R{}, #{}", mnemonic, d.dest, d.src1, d.immediate),
        MOVI => format!("MOVI R{}, #{}", d.dest, d.immediate),
        LOAD => format!("LOAD R{}, [R{} + {}]", d.dest, d.src1, d.immediate),
        STORE => format!("STORE R{}, [R{} + {}]", d.dest, d.src1, d.immediate),
        POP => format!("POP R{}", d.dest),
        PUSH => format!("PUSH R{}", d.dest),
        JMP | CALL => format!("{} {}", mnemonic, d.immediate),
        BEQ | BNE | BLT | BGE => {
            format!("{} R{}, R{}, {}", mnemonic, d.dest, d.src1, d.immediate)
        }
        RET | HALT => mnemonic.to_string(),
        IO_READ => format!("IO_READ R{}, {}", d.dest, d.immediate),
        IO_WRITE => format!("IO_WRITE R{}, {}", d.dest, d.immediate),
        _ => format!("; unsupported opcode {:#04x}", d.opcode),
    }
}
