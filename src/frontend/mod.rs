//! Front-end: source text to instruction tree.
//!
//! The tree is allocated in the session's bump arena. Loop bodies are arena
//! slices, so an [`Instruction`] is `Copy` and the whole tree is freed at once
//! when the arena goes away.
//!
//! ```text
//! ++>--[<+>-].   =>   AddData(2) MovePointer(1) AddData(-2)
//!                     Loop[MovePointer(-1) AddData(1) MovePointer(1) AddData(-1)]
//!                     Output
//! ```

pub mod parser;

pub use parser::parse;

/// One instruction of the run-length-merged program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'arena> {
    MovePointer { offset: i32 },
    AddData { delta: i32 },
    Output,
    Input,
    Loop { body: &'arena [Instruction<'arena>] },
}

impl Instruction<'_> {
    /// Instructions in this node, including nested loop bodies.
    pub fn count(&self) -> usize {
        match self {
            Instruction::Loop { body } => 1 + body.iter().map(Instruction::count).sum::<usize>(),
            _ => 1,
        }
    }
}

/// A parsed program: the top-level instruction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Program<'arena> {
    instructions: &'arena [Instruction<'arena>],
}

impl<'arena> Program<'arena> {
    pub fn new(instructions: &'arena [Instruction<'arena>]) -> Self {
        Self { instructions }
    }

    pub fn instructions(&self) -> &'arena [Instruction<'arena>] {
        self.instructions
    }

    /// Total instruction count, loop bodies included.
    pub fn instruction_count(&self) -> usize {
        self.instructions.iter().map(Instruction::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Maximum loop nesting depth.
    pub fn depth(&self) -> usize {
        fn depth_of(instructions: &[Instruction<'_>]) -> usize {
            instructions
                .iter()
                .map(|inst| match inst {
                    Instruction::Loop { body } => 1 + depth_of(body),
                    _ => 0,
                })
                .max()
                .unwrap_or(0)
        }
        depth_of(self.instructions)
    }
}
