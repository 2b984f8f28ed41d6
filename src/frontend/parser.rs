//! Single-pass parser with run-length merging.
//!
//! The scan keeps a stack of in-progress bodies, the bottom one being the
//! top-level program. Each maximal run of pointer characters (`>` and `<`
//! mixed) becomes one `MovePointer` carrying the net offset, and each run of
//! `+`/`-` one `AddData` with the net delta. Every other character except
//! `.`, `,`, `[` and `]` is a comment and also ends a run.

use bumpalo::collections::Vec as BumpVec;
use log::debug;

use super::{Instruction, Program};
use crate::core::error::{CompileError, CompileResult, UnbalancedBracket};
use crate::core::session::CompilationSession;

/// An open body: the position of its `[` and the instructions so far.
struct OpenBody<'arena> {
    open_position: usize,
    instructions: BumpVec<'arena, Instruction<'arena>>,
}

/// Parse `source` into an instruction tree allocated in the session arena.
pub fn parse<'arena>(
    session: &CompilationSession<'arena>,
    source: &str,
) -> CompileResult<Program<'arena>> {
    let arena = session.arena();
    let mut stack = vec![OpenBody {
        open_position: 0,
        instructions: BumpVec::new_in(arena),
    }];
    let mut loops = 0;
    let mut chars = source.chars().enumerate().peekable();
    let mut scanned = 0;

    while let Some((position, ch)) = chars.next() {
        scanned = position + 1;
        let instruction = match ch {
            '>' | '<' => {
                let mut offset = step_of(ch);
                while let Some(&(_, next @ ('>' | '<'))) = chars.peek() {
                    offset = offset.wrapping_add(step_of(next));
                    chars.next();
                }
                Instruction::MovePointer { offset }
            }
            '+' | '-' => {
                let mut delta = step_of(ch);
                while let Some(&(_, next @ ('+' | '-'))) = chars.peek() {
                    delta = delta.wrapping_add(step_of(next));
                    chars.next();
                }
                Instruction::AddData { delta }
            }
            '.' => Instruction::Output,
            ',' => Instruction::Input,
            '[' => {
                stack.push(OpenBody {
                    open_position: position,
                    instructions: BumpVec::new_in(arena),
                });
                continue;
            }
            ']' => {
                if stack.len() == 1 {
                    return Err(CompileError::MalformedProgram {
                        reason: UnbalancedBracket::UnmatchedClose,
                        position,
                    });
                }
                let Some(body) = stack.pop() else {
                    unreachable!("stack holds the top-level body");
                };
                loops += 1;
                Instruction::Loop {
                    body: body.instructions.into_bump_slice(),
                }
            }
            _ => continue,
        };
        if let Some(top) = stack.last_mut() {
            top.instructions.push(instruction);
        }
    }

    if stack.len() != 1 {
        let innermost = stack.last().map_or(0, |body| body.open_position);
        return Err(CompileError::MalformedProgram {
            reason: UnbalancedBracket::UnterminatedLoop,
            position: innermost,
        });
    }

    let top = stack.pop().map(|body| body.instructions.into_bump_slice()).unwrap_or(&[]);
    let program = Program::new(top);
    session.record_program_parsed(scanned, program.instruction_count(), loops, program.depth());
    debug!(
        "Parsed {} characters into {} instructions ({} loops)",
        scanned,
        program.instruction_count(),
        loops
    );
    Ok(program)
}

/// +1 for `>`/`+`, -1 for `<`/`-`.
fn step_of(ch: char) -> i32 {
    match ch {
        '>' | '+' => 1,
        _ => -1,
    }
}
