//! ELF relocatable object emission.
//!
//! The object holds a single `.text` section with one global function symbol,
//! [`ENTRY_SYMBOL`](super::ENTRY_SYMBOL). The code has no relocations: all
//! calls go through the callback table passed in at run time.

use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};

use super::ENTRY_SYMBOL;
use crate::core::error::{CompileError, CompileResult};

/// Function alignment within `.text`.
const FUNCTION_ALIGN: u64 = 16;

pub fn write_object(code: &[u8]) -> CompileResult<Vec<u8>> {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text = obj.section_id(StandardSection::Text);

    let symbol = obj.add_symbol(Symbol {
        name: ENTRY_SYMBOL.as_bytes().to_vec(),
        value: 0,
        size: 0,
        kind: SymbolKind::Text,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Undefined,
        flags: SymbolFlags::None,
    });
    obj.add_symbol_data(symbol, text, code, FUNCTION_ALIGN);

    obj.write().map_err(|e| CompileError::Object {
        reason: e.to_string(),
    })
}
