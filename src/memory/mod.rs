//! Segmented, word-addressable memory with memory-mapped I/O.
//!
//! Four logical segments (TEXT, DATA, HEAP, STACK) are folded into one
//! 1 MiB backing buffer by an address-translation function; addresses
//! at or above `0xFFFF_0000` are I/O and bypass the buffer entirely.
//! This is modelled, per the source's own re-architecture notes, as a
//! function returning either an in-bounds backing index or an error,
//! rather than letting callers poke at the buffer directly.

pub mod device;
pub mod devices;

use crate::common::SimError;
pub use device::Device;

pub const BACKING_SIZE: usize = 1024 * 1024;

pub const TEXT_BASE: u32 = 0x0000_0000;
pub const DATA_BASE: u32 = 0x1000_0000;
pub const HEAP_BASE: u32 = 0x2000_0000;
pub const STACK_BASE: u32 = 0x3000_0000;

pub const IO_BASE: u32 = 0xFFFF_0000;

/// Each logical segment's pre-baked offset inside the shared backing
/// buffer, and the portion of the buffer reserved for it.
const TEXT_SPAN: u32 = 256 * 1024;
const DATA_SPAN: u32 = 256 * 1024;
const HEAP_SPAN: u32 = 256 * 1024;
const STACK_SPAN: u32 = 256 * 1024;

const TEXT_OFFSET: u32 = 0;
const DATA_OFFSET: u32 = TEXT_OFFSET + TEXT_SPAN;
const HEAP_OFFSET: u32 = DATA_OFFSET + DATA_SPAN;
const STACK_OFFSET: u32 = HEAP_OFFSET + HEAP_SPAN;

fn translate(addr: u32) -> Result<usize, SimError> {
    let (base, span, offset) = if addr >= STACK_BASE && addr < STACK_BASE + STACK_SPAN {
        (STACK_BASE, STACK_SPAN, STACK_OFFSET)
    } else if addr >= HEAP_BASE && addr < HEAP_BASE + HEAP_SPAN {
        (HEAP_BASE, HEAP_SPAN, HEAP_OFFSET)
    } else if addr >= DATA_BASE && addr < DATA_BASE + DATA_SPAN {
        (DATA_BASE, DATA_SPAN, DATA_OFFSET)
    } else if addr < TEXT_BASE + TEXT_SPAN {
        (TEXT_BASE, TEXT_SPAN, TEXT_OFFSET)
    } else {
        return Err(SimError::Address { addr });
    };
    let physical = offset + (addr - base);
    if physical >= offset + span {
        return Err(SimError::Address { addr });
    }
    Ok(physical as usize)
}

/// Segmented memory plus memory-mapped I/O devices.
pub struct Memory {
    backing: Vec<u8>,
    devices: Vec<Box<dyn Device>>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            backing: vec![0u8; BACKING_SIZE],
            devices: devices::default_devices(),
        }
    }

    fn is_io(addr: u32) -> bool {
        addr >= IO_BASE
    }

    fn find_device(&mut self, addr: u32) -> Option<(&mut Box<dyn Device>, u32)> {
        self.devices.iter_mut().find_map(|d| {
            let (base, size) = d.address_range();
            if addr >= base && addr < base + size {
                Some((d, addr - base))
            } else {
                None
            }
        })
    }

    /// Registers the console-output sink ("console_out") or the
    /// interrupt callback ("interrupt") on the device named "io",
    /// wherever it sits in `devices`.
    pub fn register_io_callback(&mut self, which: &str, callback: Box<dyn FnMut(u32)>) {
        let mut callback = Some(callback);
        for d in &mut self.devices {
            if d.name() != "io" {
                continue;
            }
            if let Some(cb) = callback.take() {
                match which {
                    "console_out" => d.set_output_callback(cb),
                    "interrupt" => d.set_interrupt_callback(cb),
                    _ => {}
                }
            }
            break;
        }
    }

    pub fn add_console_input(&mut self, byte: u8) {
        for d in &mut self.devices {
            d.push_console_input(byte);
        }
    }

    pub fn add_keyboard_input(&mut self, code: u32) {
        for d in &mut self.devices {
            d.push_keyboard_input(code);
        }
    }

    pub fn update_timer(&mut self, delta_ms: u32) {
        for d in &mut self.devices {
            d.tick(delta_ms);
        }
    }

    /// Reads a byte. Goes through the same segment translation as word
    /// access (the source's byte path bypassed translation -- treated
    /// here as a bug, not preserved behavior).
    pub fn read_byte(&mut self, addr: u32) -> Result<u8, SimError> {
        if Self::is_io(addr) {
            let word = self.io_read_word(addr & !0x3)?;
            let shift = (addr & 0x3) * 8;
            return Ok((word >> shift) as u8);
        }
        let idx = translate(addr)?;
        Ok(self.backing[idx])
    }

    pub fn write_byte(&mut self, addr: u32, val: u8) -> Result<(), SimError> {
        if Self::is_io(addr) {
            return Ok(());
        }
        let idx = translate(addr)?;
        self.backing[idx] = val;
        Ok(())
    }

    /// Reads a little-endian word. 4-byte alignment is required.
    pub fn read_word(&mut self, addr: u32) -> Result<u32, SimError> {
        if addr % 4 != 0 {
            return Err(SimError::Alignment { addr });
        }
        if Self::is_io(addr) {
            return self.io_read_word(addr);
        }
        let idx = translate(addr)?;
        if idx + 4 > self.backing.len() {
            return Err(SimError::Address { addr });
        }
        let bytes = [
            self.backing[idx],
            self.backing[idx + 1],
            self.backing[idx + 2],
            self.backing[idx + 3],
        ];
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn write_word(&mut self, addr: u32, val: u32) -> Result<(), SimError> {
        if addr % 4 != 0 {
            return Err(SimError::Alignment { addr });
        }
        if Self::is_io(addr) {
            return self.io_write_word(addr, val);
        }
        let idx = translate(addr)?;
        if idx + 4 > self.backing.len() {
            return Err(SimError::Address { addr });
        }
        let bytes = val.to_le_bytes();
        self.backing[idx..idx + 4].copy_from_slice(&bytes);
        Ok(())
    }

    fn io_read_word(&mut self, addr: u32) -> Result<u32, SimError> {
        match self.find_device(addr) {
            Some((dev, offset)) => Ok(dev.read(offset)),
            None => Err(SimError::UnknownIoAddress { addr }),
        }
    }

    fn io_write_word(&mut self, addr: u32, val: u32) -> Result<(), SimError> {
        match self.find_device(addr) {
            Some((dev, offset)) => {
                dev.write(offset, val);
                Ok(())
            }
            None => Err(SimError::UnknownIoAddress { addr }),
        }
    }

    /// Loads a sequence of words starting at `base`, word-aligned.
    pub fn load_program(&mut self, words: &[u32], base: u32) -> Result<(), SimError> {
        for (i, word) in words.iter().enumerate() {
            self.write_word(base + (i as u32) * 4, *word)?;
        }
        Ok(())
    }

    /// Returns `(addr, word, ascii)` tuples for `len` words starting at
    /// `addr`, the ascii column rendering each byte as a printable
    /// character or `.`.
    pub fn dump(&mut self, addr: u32, len: usize) -> Vec<(u32, u32, String)> {
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let a = addr + (i as u32) * 4;
            let word = self.read_word(a).unwrap_or(0);
            let ascii: String = word
                .to_le_bytes()
                .iter()
                .map(|b| {
                    if b.is_ascii_graphic() || *b == b' ' {
                        *b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            out.push((a, word, ascii));
        }
        out
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
