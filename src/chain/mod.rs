// This module defines the specialized chain, the lowered form of a program. A chain is a
// right-nested composition of nodes where every node owns its operand (as a Numeric Encoding
// Operand) and its entire continuation, so the program is one nested value with no jump
// targets or instruction indices. Chains are immutable and reference counted: the interner
// hands out shared sub-chains, executables hold the root, and concurrent runs only read it.
// The module also carries the reference tree-walk evaluator used to check the specialized
// entry points, and re-exports lowering, rendering and reconstruction.

//! Specialized chains.
//!
//! ```text
//! +++[-].   =>   AddData<3, Loop<AddData<-1, Stop>, OutputData<Stop>>>
//! ```
//!
//! Every chain ends in exactly one [`Node::Stop`]; a loop body is a complete
//! chain of its own whose `Stop` returns control to the loop.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::mem;
use std::sync::{Arc, OnceLock};

use crate::operand::Operand;
use crate::typed::{read_byte, Halt, Step};

pub mod intern;
pub mod lower;
pub mod reconstruct;
pub mod render;

pub use intern::Interner;
pub use lower::lower;
pub use reconstruct::{reconstruct, Registry, Symbol, REGISTRY_VERSION};
pub use render::Friendly;

/// One node of a specialized chain.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Stop,
    Loop { body: Chain, next: Chain },
    AddPointer { offset: Operand, next: Chain },
    AddData { delta: Operand, next: Chain },
    Output { next: Chain },
    Input { next: Chain },
}

/// Node kinds with their canonical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Stop,
    Loop,
    AddPointer,
    AddData,
    Output,
    Input,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Stop,
        NodeKind::Loop,
        NodeKind::AddPointer,
        NodeKind::AddData,
        NodeKind::Output,
        NodeKind::Input,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Stop => "Stop",
            NodeKind::Loop => "Loop",
            NodeKind::AddPointer => "AddPointer",
            NodeKind::AddData => "AddData",
            NodeKind::Output => "OutputData",
            NodeKind::Input => "InputData",
        }
    }

    /// Number of arguments in the canonical form.
    pub const fn arity(self) -> usize {
        match self {
            NodeKind::Stop => 0,
            NodeKind::Output | NodeKind::Input => 1,
            NodeKind::Loop | NodeKind::AddPointer | NodeKind::AddData => 2,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A shared, immutable specialized chain.
#[derive(Clone)]
pub struct Chain(Arc<Node>);

impl Chain {
    pub fn new(node: Node) -> Self {
        Chain(Arc::new(node))
    }

    pub fn stop() -> Self {
        Chain::new(Node::Stop)
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    pub fn kind(&self) -> NodeKind {
        match self.node() {
            Node::Stop => NodeKind::Stop,
            Node::Loop { .. } => NodeKind::Loop,
            Node::AddPointer { .. } => NodeKind::AddPointer,
            Node::AddData { .. } => NodeKind::AddData,
            Node::Output { .. } => NodeKind::Output,
            Node::Input { .. } => NodeKind::Input,
        }
    }

    /// The continuation of this node, `None` for `Stop`.
    pub fn next(&self) -> Option<&Chain> {
        match self.node() {
            Node::Stop => None,
            Node::Loop { next, .. }
            | Node::AddPointer { next, .. }
            | Node::AddData { next, .. }
            | Node::Output { next }
            | Node::Input { next } => Some(next),
        }
    }

    /// True when both handles point at the same node.
    pub fn ptr_eq(&self, other: &Chain) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Number of non-`Stop` nodes, loop bodies included.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut current = self;
        while let Some(next) = current.next() {
            count += 1;
            if let Node::Loop { body, .. } = current.node() {
                count += body.len();
            }
            current = next;
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.node(), Node::Stop)
    }

    /// Maximum loop nesting depth.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(next) = current.next() {
            if let Node::Loop { body, .. } = current.node() {
                depth = depth.max(1 + body.depth());
            }
            current = next;
        }
        depth
    }

    /// Evaluate the chain by walking it node by node.
    ///
    /// This is the reference semantics; [`Executable`](crate::Executable)
    /// runs the same rules through a specialized entry point. The tape is
    /// indexed with bounds checks, so a pointer outside the tape panics.
    pub fn evaluate(
        &self,
        mut pointer: i32,
        tape: &mut [u8],
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Step {
        let mut current = self;
        loop {
            current = match current.node() {
                Node::Stop => return Ok(pointer),
                Node::Loop { body, next } => {
                    while tape[pointer as usize] != 0 {
                        pointer = body.evaluate(pointer, tape, input, output)?;
                    }
                    next
                }
                Node::AddPointer { offset, next } => {
                    pointer = pointer.wrapping_add(offset.value());
                    next
                }
                Node::AddData { delta, next } => {
                    let cell = &mut tape[pointer as usize];
                    *cell = cell.wrapping_add(delta.value() as u8);
                    next
                }
                Node::Output { next } => {
                    output.write_all(&[tape[pointer as usize]]).map_err(Halt::Io)?;
                    next
                }
                Node::Input { next } => match read_byte(input).map_err(Halt::Io)? {
                    Some(byte) => {
                        tape[pointer as usize] = byte;
                        next
                    }
                    None => return Err(Halt::InputExhausted(pointer)),
                },
            };
        }
    }
}

impl PartialEq for Chain {
    /// Structural equality, compared with a worklist so long chains do not
    /// recurse. Shared sub-chains are skipped by address.
    fn eq(&self, other: &Self) -> bool {
        let mut work = vec![(self, other)];
        while let Some((a, b)) = work.pop() {
            if a.ptr_eq(b) {
                continue;
            }
            match (a.node(), b.node()) {
                (Node::Stop, Node::Stop) => {}
                (Node::Loop { body: ab, next: an }, Node::Loop { body: bb, next: bn }) => {
                    work.push((ab, bb));
                    work.push((an, bn));
                }
                (Node::AddPointer { offset: x, next: an }, Node::AddPointer { offset: y, next: bn })
                | (Node::AddData { delta: x, next: an }, Node::AddData { delta: y, next: bn }) => {
                    if x != y {
                        return false;
                    }
                    work.push((an, bn));
                }
                (Node::Output { next: an }, Node::Output { next: bn })
                | (Node::Input { next: an }, Node::Input { next: bn }) => work.push((an, bn)),
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Chain {}

impl Hash for Chain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut work = vec![self];
        while let Some(chain) = work.pop() {
            chain.kind().hash(state);
            match chain.node() {
                Node::Stop => {}
                Node::Loop { body, next } => {
                    work.push(next);
                    work.push(body);
                }
                Node::AddPointer { offset: operand, next } | Node::AddData { delta: operand, next } => {
                    operand.hash(state);
                    work.push(next);
                }
                Node::Output { next } | Node::Input { next } => work.push(next),
            }
        }
    }
}

/// Shared `Stop` used to fill the slots of a node being torn down.
fn vacant() -> Chain {
    static VACANT: OnceLock<Chain> = OnceLock::new();
    VACANT.get_or_init(|| Chain(Arc::new(Node::Stop))).clone()
}

impl Node {
    /// Move the children out, leaving [`vacant`] in their place.
    fn take_children(&mut self, into: &mut Vec<Chain>) {
        match self {
            Node::Stop => {}
            Node::Loop { body, next } => {
                take_child(body, into);
                take_child(next, into);
            }
            Node::AddPointer { next, .. }
            | Node::AddData { next, .. }
            | Node::Output { next }
            | Node::Input { next } => take_child(next, into),
        }
    }
}

fn take_child(slot: &mut Chain, into: &mut Vec<Chain>) {
    let child = mem::replace(slot, vacant());
    if !matches!(child.node(), Node::Stop) {
        into.push(child);
    }
}

/// Tear chains down iteratively. Each child this node held the last handle
/// to is unwrapped and emptied here instead of in its own nested drop.
impl Drop for Node {
    fn drop(&mut self) {
        if matches!(self, Node::Stop) {
            return;
        }
        let mut orphans = Vec::new();
        self.take_children(&mut orphans);
        while let Some(chain) = orphans.pop() {
            if let Ok(mut node) = Arc::try_unwrap(chain.0) {
                node.take_children(&mut orphans);
            }
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.node(), f)
    }
}
