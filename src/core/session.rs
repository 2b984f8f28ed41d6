// This module provides arena-based compilation session management using the bumpalo crate.
// CompilationSession owns the borrow of the arena that the front-end allocates instruction
// trees in, the node interner the specializer and reconstructor share, and the statistics
// gathered while compiling. The arena gives every instruction tree of a session one lifetime
// and frees them together; the chains produced from those trees are reference counted and
// outlive the session, so an Executable never borrows from the arena. SessionStats tracks
// characters scanned, instructions and loops parsed, nesting depth, and how many chain nodes
// were built versus shared by the interner.

//! Arena-based compilation session management.
//!
//! ```
//! use bumpalo::Bump;
//! use brainfly::core::CompilationSession;
//!
//! let arena = Bump::new();
//! let session = CompilationSession::new(&arena);
//! let program = session.parse("++[->+<]").unwrap();
//! let chain = session.lower(&program);
//! assert_eq!(chain.len(), 6);
//! ```

use bumpalo::Bump;
use std::cell::{RefCell, RefMut};
use std::fmt;

use crate::chain::{self, Chain, Interner};
use crate::core::error::CompileResult;
use crate::executable::Executable;
use crate::frontend::{self, Program};

/// Arena-based compilation session.
///
/// Not `Sync`: a session belongs to the thread compiling with it. The chains
/// and executables it produces are `Send + Sync`.
pub struct CompilationSession<'arena> {
    /// Arena the instruction trees live in.
    arena: &'arena Bump,

    /// Session statistics for debugging and optimization.
    stats: RefCell<SessionStats>,

    /// Node interner shared by every chain built in this session.
    interner: RefCell<Interner>,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
            interner: RefCell::new(Interner::new()),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Parse source text into an instruction tree.
    pub fn parse(&self, source: &str) -> CompileResult<Program<'arena>> {
        frontend::parse(self, source)
    }

    /// Lower an instruction tree into a specialized chain.
    pub fn lower(&self, program: &Program<'_>) -> Chain {
        chain::lower(self, program)
    }

    /// Parse, lower and wrap into an executable.
    pub fn compile(&self, source: &str) -> CompileResult<Executable> {
        let program = self.parse(source)?;
        Ok(Executable::new(self.lower(&program)))
    }

    pub(crate) fn interner(&self) -> RefMut<'_, Interner> {
        self.interner.borrow_mut()
    }

    /// Record a successful parse.
    pub fn record_program_parsed(&self, chars: usize, instructions: usize, loops: usize, depth: usize) {
        let mut stats = self.stats.borrow_mut();
        stats.programs_parsed += 1;
        stats.chars_scanned += chars;
        stats.instructions_parsed += instructions;
        stats.loops_parsed += loops;
        stats.max_loop_depth = stats.max_loop_depth.max(depth);
    }

    /// Record a lowering.
    pub fn record_chain_lowered(&self) {
        self.stats.borrow_mut().chains_lowered += 1;
    }

    /// Get compilation statistics.
    pub fn stats(&self) -> SessionStats {
        let interner = self.interner.borrow();
        SessionStats {
            nodes_created: interner.created(),
            nodes_reused: interner.reused(),
            ..self.stats.borrow().clone()
        }
    }
}

/// Compilation session statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of programs parsed.
    pub programs_parsed: usize,

    /// Source characters scanned, comments included.
    pub chars_scanned: usize,

    /// Instructions after run-length merging, loop bodies included.
    pub instructions_parsed: usize,

    /// Loops parsed.
    pub loops_parsed: usize,

    /// Deepest loop nesting seen.
    pub max_loop_depth: usize,

    /// Number of instruction trees lowered.
    pub chains_lowered: usize,

    /// Distinct chain nodes built by the interner.
    pub nodes_created: usize,

    /// Node requests answered with an existing node.
    pub nodes_reused: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Session Statistics:")?;
        writeln!(f, "  Programs parsed: {}", self.programs_parsed)?;
        writeln!(f, "  Characters scanned: {}", self.chars_scanned)?;
        writeln!(f, "  Instructions parsed: {}", self.instructions_parsed)?;
        writeln!(f, "  Loops parsed: {}", self.loops_parsed)?;
        writeln!(f, "  Max loop depth: {}", self.max_loop_depth)?;
        writeln!(f, "  Chains lowered: {}", self.chains_lowered)?;
        writeln!(f, "  Chain nodes created: {}", self.nodes_created)?;
        writeln!(f, "  Chain nodes reused: {}", self.nodes_reused)?;
        Ok(())
    }
}
