//! Lowering of the instruction tree into a specialized chain.
//!
//! Each instruction list is folded right to left over an accumulator that
//! starts at `Stop`; every instruction wraps the accumulator as its
//! continuation. Loop bodies are folded the same way, independently.

use log::debug;

use super::{Chain, Interner};
use crate::core::session::CompilationSession;
use crate::frontend::{Instruction, Program};
use crate::operand::Operand;

/// Lower `program` through the session's interner. Never fails.
pub fn lower(session: &CompilationSession<'_>, program: &Program<'_>) -> Chain {
    let chain = {
        let mut interner = session.interner();
        lower_body(&mut interner, program.instructions())
    };
    session.record_chain_lowered();
    debug!(
        "Lowered {} instructions into a chain of {} nodes (depth {})",
        program.instruction_count(),
        chain.len(),
        chain.depth()
    );
    chain
}

/// Lower one instruction list with a fresh `Stop` accumulator.
pub fn lower_body(interner: &mut Interner, instructions: &[Instruction<'_>]) -> Chain {
    let mut chain = interner.stop();
    for instruction in instructions.iter().rev() {
        chain = match *instruction {
            Instruction::MovePointer { offset } => interner.add_pointer(Operand::encode(offset), chain),
            Instruction::AddData { delta } => interner.add_data(Operand::encode(delta), chain),
            Instruction::Output => interner.output(chain),
            Instruction::Input => interner.input(chain),
            Instruction::Loop { body } => {
                let body = lower_body(interner, body);
                interner.make_loop(body, chain)
            }
        };
    }
    chain
}
