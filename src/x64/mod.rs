//! Native x86-64 lowering.
//!
//! This is the code-generating form of specialization: a chain becomes one
//! machine-code function with every operand an immediate and every
//! continuation simply the next instruction.
//!
//! - Instruction encoding using iced-x86 (`encoder`)
//! - ELF relocatable object emission using `object` (`elf`)
//!
//! # ABI
//!
//! ```text
//! extern "sysv64" fn brainfly_main(pointer: i64, tape: *mut u8, io: *const NativeIo) -> i64
//! ```
//!
//! The function returns the final pointer, also when a read reports end of
//! input (the callback returns a negative value), which halts the program.
//! Native code does **not** bounds-check the tape: the caller guarantees the
//! program keeps the pointer inside it.

use std::ffi::c_void;
use std::fmt::Write as _;

use iced_x86::{Decoder, DecoderOptions, Formatter, IntelFormatter};

use crate::chain::Chain;
use crate::core::error::CompileResult;

pub mod encoder;
pub mod elf;

pub use encoder::ChainEncoder;

/// Name of the emitted function symbol.
pub const ENTRY_SYMBOL: &str = "brainfly_main";

/// Callback table passed as the third argument of the native function.
#[repr(C)]
pub struct NativeIo {
    /// Opaque context handed back to both callbacks.
    pub ctx: *mut c_void,
    /// Next input byte, or a negative value at end of input.
    pub read: extern "C" fn(ctx: *mut c_void) -> i32,
    /// Write one output byte.
    pub write: extern "C" fn(ctx: *mut c_void, byte: u8),
}

/// Machine code for one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCode {
    bytes: Vec<u8>,
}

impl NativeCode {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Intel-syntax listing, one instruction per line, offsets in hex.
    pub fn disassemble(&self) -> String {
        let mut decoder = Decoder::with_ip(64, &self.bytes, 0, DecoderOptions::NONE);
        let mut formatter = IntelFormatter::new();
        let mut listing = String::new();
        let mut line = String::new();
        for instruction in &mut decoder {
            line.clear();
            formatter.format(&instruction, &mut line);
            let _ = writeln!(listing, "{:06X}  {}", instruction.ip(), line);
        }
        listing
    }

    /// Wrap the code in an ELF x86-64 relocatable object.
    pub fn to_object(&self) -> CompileResult<Vec<u8>> {
        elf::write_object(&self.bytes)
    }
}

/// Lower `chain` to a native function.
pub fn lower(chain: &Chain) -> CompileResult<NativeCode> {
    let bytes = ChainEncoder::new()?.encode(chain)?;
    Ok(NativeCode { bytes })
}
