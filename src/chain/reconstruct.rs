//! Reconstruction of chains from their canonical rendering.
//!
//! Names resolve against a fixed [`Registry`] built once on first use and
//! never modified afterwards. The registry is versioned: an artifact written
//! against a different node or digit set fails with `UnknownSymbol` rather
//! than being silently misread.

use std::sync::OnceLock;

use hashbrown::HashMap;
use log::trace;

use super::{Chain, Interner, NodeKind};
use crate::core::error::{CompileError, CompileResult};
use crate::operand::{Hex, Operand, OPERAND_DIGITS, OPERAND_NAME};

/// Version of the name table below.
pub const REGISTRY_VERSION: u32 = 1;

/// What a registered name stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Node(NodeKind),
    Operand,
    Digit(Hex),
}

/// Closed lookup table from canonical names to node and digit kinds.
#[derive(Debug)]
pub struct Registry {
    version: u32,
    symbols: HashMap<&'static str, Symbol>,
}

impl Registry {
    fn new() -> Self {
        let mut symbols = HashMap::new();
        for kind in NodeKind::ALL {
            symbols.insert(kind.name(), Symbol::Node(kind));
        }
        symbols.insert(OPERAND_NAME, Symbol::Operand);
        for digit in Hex::ALL {
            symbols.insert(digit.name(), Symbol::Digit(digit));
        }
        Self {
            version: REGISTRY_VERSION,
            symbols,
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::new)
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Rebuild a chain from its canonical rendering.
pub fn reconstruct(text: &str) -> CompileResult<Chain> {
    let mut interner = Interner::new();
    reconstruct_with(&mut interner, text)
}

/// Rebuild a chain, sharing nodes through `interner`.
pub fn reconstruct_with(interner: &mut Interner, text: &str) -> CompileResult<Chain> {
    let mut reader = Reader {
        text,
        pos: 0,
        registry: Registry::global(),
        interner,
    };
    let chain = reader.parse_chain()?;
    reader.skip_whitespace();
    if !reader.is_eof() {
        return Err(reader.malformed("trailing input after chain"));
    }
    trace!("Reconstructed chain of {} nodes from {} bytes", chain.len(), text.len());
    Ok(chain)
}

/// A node whose arguments are still being read.
enum Pending {
    /// `Loop<` read; the body comes next.
    LoopBody,
    /// Body read; the continuation comes next.
    LoopNext(Chain),
    AddPointer(Operand),
    AddData(Operand),
    Output,
    Input,
}

struct Reader<'a, 'i> {
    text: &'a str,
    pos: usize,
    registry: &'static Registry,
    interner: &'i mut Interner,
}

impl<'a> Reader<'a, '_> {
    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> CompileError {
        CompileError::MalformedArtifact {
            position: self.pos,
            reason: reason.into(),
        }
    }

    fn try_read(&mut self, ch: u8) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: u8) -> CompileResult<()> {
        if !self.try_read(ch) {
            let found = match self.peek() {
                Some(b) => format!("'{}'", b as char),
                None => "end of input".to_string(),
            };
            return Err(self.malformed(format!("expected '{}' but found {found}", ch as char)));
        }
        Ok(())
    }

    fn read_name(&mut self) -> CompileResult<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.malformed("expected a name"));
        }
        Ok(&self.text[start..self.pos])
    }

    fn resolve(&mut self) -> CompileResult<(Symbol, &'a str)> {
        let name = self.read_name()?;
        match self.registry.lookup(name) {
            Some(symbol) => Ok((symbol, name)),
            None => Err(CompileError::UnknownSymbol { name: name.to_string() }),
        }
    }

    /// Parse one chain without recursing: nodes whose arguments are still
    /// being read wait on an explicit stack, so nesting depth is bounded by
    /// memory rather than by the thread's stack.
    fn parse_chain(&mut self) -> CompileResult<Chain> {
        let mut pending: Vec<Pending> = Vec::new();
        loop {
            let kind = match self.resolve()? {
                (Symbol::Node(kind), _) => kind,
                (_, name) => return Err(self.malformed(format!("expected a node but found '{name}'"))),
            };

            match kind {
                NodeKind::Stop => {
                    if self.try_read(b'<') {
                        return Err(self.malformed(format!("{kind} takes no arguments")));
                    }
                }
                NodeKind::Loop => {
                    self.expect(b'<')?;
                    pending.push(Pending::LoopBody);
                    continue;
                }
                NodeKind::AddPointer | NodeKind::AddData => {
                    self.expect(b'<')?;
                    let operand = self.parse_operand()?;
                    self.expect(b',')?;
                    pending.push(if kind == NodeKind::AddPointer {
                        Pending::AddPointer(operand)
                    } else {
                        Pending::AddData(operand)
                    });
                    continue;
                }
                NodeKind::Output | NodeKind::Input => {
                    self.expect(b'<')?;
                    pending.push(if kind == NodeKind::Output { Pending::Output } else { Pending::Input });
                    continue;
                }
            }

            // A complete chain was read; fold it into the nodes waiting on it.
            let mut done = self.interner.stop();
            loop {
                done = match pending.pop() {
                    None => return Ok(done),
                    Some(Pending::LoopBody) => {
                        self.expect(b',')?;
                        pending.push(Pending::LoopNext(done));
                        break;
                    }
                    Some(Pending::LoopNext(body)) => {
                        self.expect(b'>')?;
                        self.interner.make_loop(body, done)
                    }
                    Some(Pending::AddPointer(offset)) => {
                        self.expect(b'>')?;
                        self.interner.add_pointer(offset, done)
                    }
                    Some(Pending::AddData(delta)) => {
                        self.expect(b'>')?;
                        self.interner.add_data(delta, done)
                    }
                    Some(Pending::Output) => {
                        self.expect(b'>')?;
                        self.interner.output(done)
                    }
                    Some(Pending::Input) => {
                        self.expect(b'>')?;
                        self.interner.input(done)
                    }
                };
            }
        }
    }

    fn parse_operand(&mut self) -> CompileResult<Operand> {
        match self.resolve()? {
            (Symbol::Operand, _) => {}
            (_, name) => return Err(self.malformed(format!("expected an operand but found '{name}'"))),
        }
        self.expect(b'<')?;
        let mut digits = [Hex::Hex0; OPERAND_DIGITS];
        for (i, digit) in digits.iter_mut().enumerate() {
            if i > 0 {
                self.expect(b',')?;
            }
            *digit = match self.resolve()? {
                (Symbol::Digit(hex), _) => hex,
                (_, name) => return Err(self.malformed(format!("expected a digit but found '{name}'"))),
            };
        }
        self.expect(b'>')?;
        Ok(Operand::from_digits(digits))
    }
}
