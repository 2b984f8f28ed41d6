//! brainfly - ahead-of-time compilation for the eight-instruction tape language.
//!
//! Programs are compiled, not interpreted: the source is reduced to a
//! run-length-merged instruction tree, and the tree is lowered into a
//! *specialized chain* whose shape is the program's control flow, with every
//! operand spelled into the node itself and every continuation owned by the
//! node before it. A chain can then be
//!
//! - bound into an [`Executable`] (closure-specialized, dispatch-free),
//! - rendered to its canonical text and persisted as a compressed artifact,
//! - spliced into a standalone Rust bundle where rustc monomorphizes it, or
//! - lowered to native x86-64 and written out as an ELF object.
//!
//! # Primary Usage
//!
//! ```
//! let exe = brainfly::compile("++++++++[>++++++++<-]>+.").unwrap();
//!
//! let mut tape = [0u8; 128];
//! let mut output = Vec::new();
//! let pointer = exe.run(&mut tape, &mut std::io::empty(), &mut output).unwrap();
//! assert_eq!(output, b"A");
//! assert_eq!(pointer, 1);
//!
//! // Persist and reload through the canonical rendering.
//! let reloaded = brainfly::Executable::from_artifact(&exe.to_string()).unwrap();
//! assert_eq!(reloaded.chain(), exe.chain());
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Errors and the arena-backed compilation session
//! - [`frontend`] - Parsing and run-length merging
//! - [`operand`] - Eight-digit operand encoding
//! - [`chain`] - Specialized chains: lowering, rendering, reconstruction
//! - [`executable`] - Entry-point binding and execution
//! - [`typed`] - Type-level chain definitions (the bundle's vocabulary)
//! - [`artifact`] / [`bundle`] - Persisted and standalone forms
//! - [`x64`] - Native x86-64 lowering and object emission

pub mod artifact;
pub mod bundle;
pub mod chain;
pub mod core;
pub mod executable;
pub mod frontend;
pub mod operand;
pub mod typed;
pub mod x64;

pub use chain::{reconstruct, Chain, Node, NodeKind};
pub use core::{CompilationSession, CompileError, CompileResult, SessionStats};
pub use executable::{Executable, Outcome};
pub use frontend::{Instruction, Program};
pub use operand::{Hex, Operand};

use bumpalo::Bump;

/// Compile source text into an executable using a throwaway session.
pub fn compile(source: &str) -> CompileResult<Executable> {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    session.compile(source)
}
