//! Hash-consing of chain nodes.
//!
//! Chains are pure data, so two structurally identical nodes built from the
//! same (already shared) children can be one node. The interner keys each
//! node on its kind, its operand and the *addresses* of its children, which
//! makes lookups O(1) instead of a deep structural comparison. Keys keep
//! their children alive, so an address can never be reused while it is a key.

use std::hash::{Hash, Hasher};

use hashbrown::HashMap;

use super::{Chain, Node};
use crate::operand::Operand;

/// A chain compared and hashed by node address.
#[derive(Clone)]
struct ByAddress(Chain);

impl PartialEq for ByAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl Eq for ByAddress {}

impl Hash for ByAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.address().hash(state);
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Stop,
    Loop(ByAddress, ByAddress),
    AddPointer(Operand, ByAddress),
    AddData(Operand, ByAddress),
    Output(ByAddress),
    Input(ByAddress),
}

/// Builds chains, reusing nodes it has already built.
#[derive(Default)]
pub struct Interner {
    nodes: HashMap<NodeKey, Chain>,
    created: usize,
    reused: usize,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&mut self) -> Chain {
        self.intern(NodeKey::Stop, || Node::Stop)
    }

    pub fn make_loop(&mut self, body: Chain, next: Chain) -> Chain {
        let key = NodeKey::Loop(ByAddress(body.clone()), ByAddress(next.clone()));
        self.intern(key, || Node::Loop { body, next })
    }

    pub fn add_pointer(&mut self, offset: Operand, next: Chain) -> Chain {
        let key = NodeKey::AddPointer(offset, ByAddress(next.clone()));
        self.intern(key, || Node::AddPointer { offset, next })
    }

    pub fn add_data(&mut self, delta: Operand, next: Chain) -> Chain {
        let key = NodeKey::AddData(delta, ByAddress(next.clone()));
        self.intern(key, || Node::AddData { delta, next })
    }

    pub fn output(&mut self, next: Chain) -> Chain {
        let key = NodeKey::Output(ByAddress(next.clone()));
        self.intern(key, || Node::Output { next })
    }

    pub fn input(&mut self, next: Chain) -> Chain {
        let key = NodeKey::Input(ByAddress(next.clone()));
        self.intern(key, || Node::Input { next })
    }

    fn intern(&mut self, key: NodeKey, build: impl FnOnce() -> Node) -> Chain {
        if let Some(chain) = self.nodes.get(&key) {
            self.reused += 1;
            return chain.clone();
        }
        self.created += 1;
        let chain = Chain::new(build());
        self.nodes.insert(key, chain.clone());
        chain
    }

    /// Distinct nodes built so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Requests answered with an existing node.
    pub fn reused(&self) -> usize {
        self.reused
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
