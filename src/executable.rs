// This module wraps a specialized chain into something that can be run. The first run binds
// a single entry point: the chain is specialized into a tree of closures in which every
// operand is captured as a constant and every continuation is captured as the closure that
// evaluates it, so running performs no dispatch on node kinds. The binding is memoized in a
// OnceLock for the lifetime of the executable and sub-chains shared by the interner are
// specialized only once. Runs never mutate the executable, so one executable can serve any
// number of runs, from any number of threads, each with its own tape and streams.

//! Executables and entry-point binding.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use log::{debug, trace};

use crate::chain::{reconstruct, Chain, Friendly, Node};
use crate::core::error::CompileResult;
use crate::typed::{read_byte, Halt, Step};

/// A bound entry point: `(pointer, tape, input, output) -> step`.
pub(crate) type EntryPoint =
    Arc<dyn Fn(i32, &mut [u8], &mut dyn Read, &mut dyn Write) -> Step + Send + Sync>;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The program reached its final `Stop`.
    Finished(i32),
    /// A read found the input exhausted; the whole program halted there.
    InputExhausted(i32),
}

impl Outcome {
    /// Final pointer, however the run ended.
    pub fn pointer(self) -> i32 {
        match self {
            Outcome::Finished(pointer) | Outcome::InputExhausted(pointer) => pointer,
        }
    }

    pub fn is_halted(self) -> bool {
        matches!(self, Outcome::InputExhausted(_))
    }
}

/// A compiled program ready to run.
///
/// # Tape contract
///
/// The tape is indexed with ordinary bounds checks: a program that moves the
/// pointer outside `[0, tape.len())` and then touches the tape panics. Callers
/// that cannot rule this out should run on a thread they can recover from.
///
/// A program that never terminates runs forever; there is no timeout.
pub struct Executable {
    chain: Chain,
    binding: OnceLock<Binding>,
}

impl Executable {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            binding: OnceLock::new(),
        }
    }

    /// Build an executable from the canonical rendering of its chain.
    pub fn from_artifact(text: &str) -> CompileResult<Self> {
        Ok(Self::new(reconstruct(text)?))
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// True once the entry point has been bound.
    pub fn is_bound(&self) -> bool {
        self.binding.get().is_some()
    }

    fn entry_point(&self) -> &EntryPoint {
        &self
            .binding
            .get_or_init(|| {
                let binding = Specializer::default().bind(&self.chain);
                debug!(
                    "Bound entry point: {} closures for {} chain nodes",
                    binding.closures.len(),
                    self.chain.len()
                );
                binding
            })
            .entry
    }

    /// Run from pointer 0 and report how the run ended.
    ///
    /// Only failures of the host streams are errors; running out of input is
    /// the [`Outcome::InputExhausted`] halt.
    pub fn execute(
        &self,
        tape: &mut [u8],
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> io::Result<Outcome> {
        let entry = self.entry_point();
        match entry(0, tape, input, output) {
            Ok(pointer) => Ok(Outcome::Finished(pointer)),
            Err(Halt::InputExhausted(pointer)) => {
                debug!("Input exhausted at pointer {pointer}, halting");
                Ok(Outcome::InputExhausted(pointer))
            }
            Err(Halt::Io(e)) => Err(e),
        }
    }

    /// Run from pointer 0 and return the final pointer.
    pub fn run(&self, tape: &mut [u8], input: &mut dyn Read, output: &mut dyn Write) -> io::Result<i32> {
        self.execute(tape, input, output).map(Outcome::pointer)
    }

    /// Friendly rendering of the chain.
    pub fn friendly(&self) -> Friendly<'_> {
        self.chain.friendly()
    }
}

/// Canonical rendering of the chain.
impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.chain, f)
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("nodes", &self.chain.len())
            .field("bound", &self.is_bound())
            .finish()
    }
}

fn entry<F>(f: F) -> EntryPoint
where
    F: Fn(i32, &mut [u8], &mut dyn Read, &mut dyn Write) -> Step + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A bound chain: the entry point plus every closure it reaches.
///
/// `closures` runs root first, so dropping it in order only ever releases a
/// closure whose continuations are still held further down the list, and
/// tearing down a long binding never nests.
struct Binding {
    entry: EntryPoint,
    closures: Vec<EntryPoint>,
}

/// Turns chain nodes into closures, once per distinct node.
#[derive(Default)]
struct Specializer {
    cache: HashMap<usize, EntryPoint>,
    /// Closures in the order they were built, continuations first.
    built: Vec<EntryPoint>,
}

impl Specializer {
    /// Specialize `root` bottom-up with an explicit worklist: a node is
    /// built once all of its continuations have been.
    fn bind(mut self, root: &Chain) -> Binding {
        let mut work = vec![(root, false)];
        while let Some((chain, children_done)) = work.pop() {
            if self.cache.contains_key(&chain.address()) {
                continue;
            }
            if !children_done {
                work.push((chain, true));
                match chain.node() {
                    Node::Stop => {}
                    Node::Loop { body, next } => {
                        work.push((next, false));
                        work.push((body, false));
                    }
                    Node::AddPointer { next, .. }
                    | Node::AddData { next, .. }
                    | Node::Output { next }
                    | Node::Input { next } => work.push((next, false)),
                }
                continue;
            }
            let specialized = self.specialize(chain);
            trace!("Specialized {} node", chain.kind());
            self.cache.insert(chain.address(), specialized.clone());
            self.built.push(specialized);
        }

        let entry = self.bound(root);
        self.built.reverse();
        Binding {
            entry,
            closures: self.built,
        }
    }

    /// The closure already built for `chain`.
    fn bound(&self, chain: &Chain) -> EntryPoint {
        self.cache[&chain.address()].clone()
    }

    /// Build the closure for one node whose continuations are bound.
    fn specialize(&self, chain: &Chain) -> EntryPoint {
        match chain.node() {
            Node::Stop => entry(|pointer, _tape, _input, _output| Ok(pointer)),
            Node::Loop { body, next } => {
                let body = self.bound(body);
                let next = self.bound(next);
                entry(move |mut pointer, tape, input, output| {
                    while tape[pointer as usize] != 0 {
                        pointer = body(pointer, tape, input, output)?;
                    }
                    next(pointer, tape, input, output)
                })
            }
            Node::AddPointer { offset, next } => {
                let offset = offset.value();
                let next = self.bound(next);
                entry(move |pointer, tape, input, output| {
                    next(pointer.wrapping_add(offset), tape, input, output)
                })
            }
            Node::AddData { delta, next } => {
                let delta = delta.value() as u8;
                let next = self.bound(next);
                entry(move |pointer, tape, input, output| {
                    let cell = &mut tape[pointer as usize];
                    *cell = cell.wrapping_add(delta);
                    next(pointer, tape, input, output)
                })
            }
            Node::Output { next } => {
                let next = self.bound(next);
                entry(move |pointer, tape, input, output| {
                    output.write_all(&[tape[pointer as usize]]).map_err(Halt::Io)?;
                    next(pointer, tape, input, output)
                })
            }
            Node::Input { next } => {
                let next = self.bound(next);
                entry(move |pointer, tape, input, output| match read_byte(input).map_err(Halt::Io)? {
                    Some(byte) => {
                        tape[pointer as usize] = byte;
                        next(pointer, tape, input, output)
                    }
                    None => Err(Halt::InputExhausted(pointer)),
                })
            }
        }
    }
}
