// This module groups the infrastructure shared by every stage of the brainfly pipeline: the
// error type that front-end, reconstructor, artifact codec and native backend all return, and
// the arena-backed compilation session that owns instruction trees, the node interner and
// compilation statistics.

//! Core brainfly infrastructure.
//!
//! # Key Components
//!
//! ## Session Management (`session`)
//! - Arena allocation of instruction trees using `bumpalo`
//! - One node interner per session, so chains compiled together share nodes
//! - Compilation statistics
//!
//! ## Errors (`error`)
//! - `CompileError` for every failure the pipeline can report

pub mod error;
pub mod session;

pub use error::{CompileError, CompileResult, UnbalancedBracket};
pub use session::{CompilationSession, SessionStats};
