// Type-level node and digit definitions.
//
// A program is a single nested type such as
// `AddData<Int<Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex3>, OutputData<Stop>>`.
// Every operand is a compile-time constant and every continuation is a type
// parameter, so `P::run` monomorphizes into one routine for the whole program.
// This file only depends on std: its text is spliced verbatim into bundles.

use std::io::{self, ErrorKind, Read, Write};
use std::marker::PhantomData;

/// Why evaluation stopped before reaching the final `Stop`.
#[derive(Debug)]
pub enum Halt {
    /// Input ran out; carries the pointer at the failed read.
    InputExhausted(i32),
    /// The host input or output stream failed.
    Io(io::Error),
}

/// Result of evaluating a node: the updated pointer, or a halt.
pub type Step = Result<i32, Halt>;

/// Read one byte, `None` at end of input. `Interrupted` reads are retried.
pub fn read_byte(input: &mut dyn Read) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// A base-16 digit kind.
pub trait Hex {
    const VALUE: u32;
}

/// A 32-bit signed operand.
pub trait Num {
    const VALUE: i32;
}

/// A chain node.
pub trait Op {
    fn run(pointer: i32, tape: &mut [u8], input: &mut dyn Read, output: &mut dyn Write) -> Step;
}

macro_rules! hex_digits {
    ($($name:ident = $value:literal),* $(,)?) => {
        $(
            pub struct $name;

            impl Hex for $name {
                const VALUE: u32 = $value;
            }
        )*
    };
}

hex_digits! {
    Hex0 = 0, Hex1 = 1, Hex2 = 2, Hex3 = 3,
    Hex4 = 4, Hex5 = 5, Hex6 = 6, Hex7 = 7,
    Hex8 = 8, Hex9 = 9, HexA = 10, HexB = 11,
    HexC = 12, HexD = 13, HexE = 14, HexF = 15,
}

/// Eight digits, most-significant first.
pub struct Int<H7, H6, H5, H4, H3, H2, H1, H0>(PhantomData<(H7, H6, H5, H4, H3, H2, H1, H0)>);

impl<H7, H6, H5, H4, H3, H2, H1, H0> Num for Int<H7, H6, H5, H4, H3, H2, H1, H0>
where
    H7: Hex,
    H6: Hex,
    H5: Hex,
    H4: Hex,
    H3: Hex,
    H2: Hex,
    H1: Hex,
    H0: Hex,
{
    const VALUE: i32 = (H7::VALUE << 28
        | H6::VALUE << 24
        | H5::VALUE << 20
        | H4::VALUE << 16
        | H3::VALUE << 12
        | H2::VALUE << 8
        | H1::VALUE << 4
        | H0::VALUE) as i32;
}

pub struct Stop;

impl Op for Stop {
    #[inline(always)]
    fn run(pointer: i32, _tape: &mut [u8], _input: &mut dyn Read, _output: &mut dyn Write) -> Step {
        Ok(pointer)
    }
}

pub struct Loop<Body, Next>(PhantomData<(Body, Next)>);

impl<Body: Op, Next: Op> Op for Loop<Body, Next> {
    #[inline(always)]
    fn run(mut pointer: i32, tape: &mut [u8], input: &mut dyn Read, output: &mut dyn Write) -> Step {
        while tape[pointer as usize] != 0 {
            pointer = Body::run(pointer, tape, input, output)?;
        }
        Next::run(pointer, tape, input, output)
    }
}

pub struct AddPointer<Offset, Next>(PhantomData<(Offset, Next)>);

impl<Offset: Num, Next: Op> Op for AddPointer<Offset, Next> {
    #[inline(always)]
    fn run(pointer: i32, tape: &mut [u8], input: &mut dyn Read, output: &mut dyn Write) -> Step {
        Next::run(pointer.wrapping_add(Offset::VALUE), tape, input, output)
    }
}

pub struct AddData<Delta, Next>(PhantomData<(Delta, Next)>);

impl<Delta: Num, Next: Op> Op for AddData<Delta, Next> {
    #[inline(always)]
    fn run(pointer: i32, tape: &mut [u8], input: &mut dyn Read, output: &mut dyn Write) -> Step {
        let cell = &mut tape[pointer as usize];
        *cell = cell.wrapping_add(Delta::VALUE as u8);
        Next::run(pointer, tape, input, output)
    }
}

pub struct OutputData<Next>(PhantomData<Next>);

impl<Next: Op> Op for OutputData<Next> {
    #[inline(always)]
    fn run(pointer: i32, tape: &mut [u8], input: &mut dyn Read, output: &mut dyn Write) -> Step {
        output.write_all(&[tape[pointer as usize]]).map_err(Halt::Io)?;
        Next::run(pointer, tape, input, output)
    }
}

pub struct InputData<Next>(PhantomData<Next>);

impl<Next: Op> Op for InputData<Next> {
    #[inline(always)]
    fn run(pointer: i32, tape: &mut [u8], input: &mut dyn Read, output: &mut dyn Write) -> Step {
        match read_byte(input).map_err(Halt::Io)? {
            Some(byte) => {
                tape[pointer as usize] = byte;
                Next::run(pointer, tape, input, output)
            }
            None => Err(Halt::InputExhausted(pointer)),
        }
    }
}

/// Run program `P` from pointer 0. Exhausted input ends the program normally.
pub fn run<P: Op>(tape: &mut [u8], input: &mut dyn Read, output: &mut dyn Write) -> io::Result<i32> {
    match P::run(0, tape, input, output) {
        Ok(pointer) | Err(Halt::InputExhausted(pointer)) => Ok(pointer),
        Err(Halt::Io(e)) => Err(e),
    }
}
