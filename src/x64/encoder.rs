// This module lowers a specialized chain to x86-64 machine code using the iced-x86 code
// assembler. The chain maps onto straight-line code almost one node per instruction: the
// pointer lives in rbx, the tape base in r12 and the I/O callback table in r13, all
// callee-saved so the callbacks cannot clobber them. AddPointer and AddData become single
// add instructions with the decoded operand as an immediate, Output and Input become indirect
// calls through the callback table, and each Loop becomes a guarded do-while with a pair of
// labels. Input exhaustion jumps to a shared halt exit, which ends the whole program from any
// loop depth. The emitted function follows the System V calling convention.

//! x86-64 lowering of specialized chains using iced-x86.

use iced_x86::code_asm::*;
use iced_x86::IcedError;
use log::debug;

use crate::chain::{Chain, Node};
use crate::core::error::{CompileError, CompileResult};

/// Offsets into [`NativeIo`](super::NativeIo).
const IO_CTX: i32 = 0;
const IO_READ: i32 = 8;
const IO_WRITE: i32 = 16;

fn encoding_error(e: IcedError) -> CompileError {
    CompileError::Encoding {
        reason: e.to_string(),
    }
}

/// Emits one native function for one chain.
pub struct ChainEncoder {
    /// Code assembler for generating instructions.
    assembler: CodeAssembler,
    /// Shared exit taken when input runs out.
    halt: CodeLabel,
    /// Loops emitted so far.
    loops: usize,
    /// Callback sites emitted so far.
    calls: usize,
}

impl ChainEncoder {
    pub fn new() -> CompileResult<Self> {
        let mut assembler = CodeAssembler::new(64).map_err(encoding_error)?;
        let halt = assembler.create_label();
        Ok(Self {
            assembler,
            halt,
            loops: 0,
            calls: 0,
        })
    }

    /// Emit the whole function for `chain` and assemble it at address 0.
    pub fn encode(mut self, chain: &Chain) -> CompileResult<Vec<u8>> {
        self.emit_prologue()?;
        self.emit_chain(chain)?;
        self.emit_epilogue()?;

        // Halt exit: same epilogue, reached only from exhausted reads.
        let mut halt = self.halt;
        self.assembler.set_label(&mut halt).map_err(encoding_error)?;
        self.emit_epilogue()?;

        let code = self.assembler.assemble(0).map_err(encoding_error)?;
        debug!(
            "Encoded {} bytes of x86-64 ({} loops, {} callback sites)",
            code.len(),
            self.loops,
            self.calls
        );
        Ok(code)
    }

    fn emit_prologue(&mut self) -> CompileResult<()> {
        let a = &mut self.assembler;
        a.push(rbx).map_err(encoding_error)?;
        a.push(r12).map_err(encoding_error)?;
        a.push(r13).map_err(encoding_error)?;
        a.mov(rbx, rdi).map_err(encoding_error)?;
        a.mov(r12, rsi).map_err(encoding_error)?;
        a.mov(r13, rdx).map_err(encoding_error)?;
        Ok(())
    }

    fn emit_epilogue(&mut self) -> CompileResult<()> {
        let a = &mut self.assembler;
        a.mov(rax, rbx).map_err(encoding_error)?;
        a.pop(r13).map_err(encoding_error)?;
        a.pop(r12).map_err(encoding_error)?;
        a.pop(rbx).map_err(encoding_error)?;
        a.ret().map_err(encoding_error)?;
        Ok(())
    }

    fn emit_chain(&mut self, chain: &Chain) -> CompileResult<()> {
        let mut current = chain;
        loop {
            current = match current.node() {
                Node::Stop => return Ok(()),
                Node::Loop { body, next } => {
                    self.emit_loop(body)?;
                    next
                }
                Node::AddPointer { offset, next } => {
                    if offset.value() != 0 {
                        self.assembler.add(rbx, offset.value()).map_err(encoding_error)?;
                    }
                    next
                }
                Node::AddData { delta, next } => {
                    // Byte immediates are sign-extended; pass the wrapped value as i8.
                    let imm = delta.value() as u8 as i8 as i32;
                    if imm != 0 {
                        self.assembler
                            .add(byte_ptr(r12 + rbx), imm)
                            .map_err(encoding_error)?;
                    }
                    next
                }
                Node::Output { next } => {
                    self.emit_output()?;
                    next
                }
                Node::Input { next } => {
                    self.emit_input()?;
                    next
                }
            };
        }
    }

    /// `while tape[ptr] != 0 { body }` as a guarded do-while.
    fn emit_loop(&mut self, body: &Chain) -> CompileResult<()> {
        self.loops += 1;
        let mut top = self.assembler.create_label();
        let mut end = self.assembler.create_label();

        self.assembler.cmp(byte_ptr(r12 + rbx), 0).map_err(encoding_error)?;
        self.assembler.je(end).map_err(encoding_error)?;
        self.assembler.set_label(&mut top).map_err(encoding_error)?;
        // A label needs an instruction to attach to; an empty body gets its
        // test directly after the label.
        self.emit_chain(body)?;
        self.assembler.cmp(byte_ptr(r12 + rbx), 0).map_err(encoding_error)?;
        self.assembler.jne(top).map_err(encoding_error)?;
        self.assembler.set_label(&mut end).map_err(encoding_error)?;
        Ok(())
    }

    fn emit_output(&mut self) -> CompileResult<()> {
        self.calls += 1;
        let a = &mut self.assembler;
        a.mov(rdi, qword_ptr(r13 + IO_CTX)).map_err(encoding_error)?;
        a.movzx(esi, byte_ptr(r12 + rbx)).map_err(encoding_error)?;
        a.call(qword_ptr(r13 + IO_WRITE)).map_err(encoding_error)?;
        Ok(())
    }

    fn emit_input(&mut self) -> CompileResult<()> {
        self.calls += 1;
        let halt = self.halt;
        let a = &mut self.assembler;
        a.mov(rdi, qword_ptr(r13 + IO_CTX)).map_err(encoding_error)?;
        a.call(qword_ptr(r13 + IO_READ)).map_err(encoding_error)?;
        a.test(eax, eax).map_err(encoding_error)?;
        a.js(halt).map_err(encoding_error)?;
        a.mov(byte_ptr(r12 + rbx), al).map_err(encoding_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use iced_x86::{Decoder, DecoderOptions, Instruction, Mnemonic};

    fn decode(code: &[u8]) -> Vec<Instruction> {
        let mut decoder = Decoder::with_ip(64, code, 0, DecoderOptions::NONE);
        let mut instructions = Vec::new();
        for instruction in &mut decoder {
            assert!(!instruction.is_invalid(), "invalid instruction in output");
            instructions.push(instruction);
        }
        instructions
    }

    fn encode_source(source: &str) -> Vec<Instruction> {
        let exe = compile(source).unwrap();
        let code = ChainEncoder::new().unwrap().encode(exe.chain()).unwrap();
        decode(&code)
    }

    fn count(instructions: &[Instruction], mnemonic: Mnemonic) -> usize {
        instructions.iter().filter(|i| i.mnemonic() == mnemonic).count()
    }

    #[test]
    fn test_empty_program() {
        let instructions = encode_source("");
        // Prologue, epilogue, halt epilogue.
        assert_eq!(count(&instructions, Mnemonic::Push), 3);
        assert_eq!(count(&instructions, Mnemonic::Ret), 2);
        assert_eq!(instructions.last().map(Instruction::mnemonic), Some(Mnemonic::Ret));
    }

    #[test]
    fn test_one_instruction_per_merged_run() {
        let instructions = encode_source("+++>>-");
        // Two data adds, one pointer add.
        assert_eq!(count(&instructions, Mnemonic::Add), 3);
    }

    #[test]
    fn test_zero_operands_emit_nothing() {
        let instructions = encode_source("+-<>");
        assert_eq!(count(&instructions, Mnemonic::Add), 0);
    }

    #[test]
    fn test_loops_and_callbacks() {
        let instructions = encode_source("+[,[.-]]");
        assert_eq!(count(&instructions, Mnemonic::Cmp), 4);
        assert_eq!(count(&instructions, Mnemonic::Je), 2);
        assert_eq!(count(&instructions, Mnemonic::Jne), 2);
        assert_eq!(count(&instructions, Mnemonic::Call), 2);
        assert_eq!(count(&instructions, Mnemonic::Js), 1);
    }

    #[test]
    fn test_empty_loop_body() {
        let instructions = encode_source("[]");
        assert_eq!(count(&instructions, Mnemonic::Cmp), 2);
    }
}
