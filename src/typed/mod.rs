//! Type-level specialized chains.
//!
//! The canonical rendering of a [`Chain`](crate::chain::Chain) uses exactly
//! the names defined here, so a rendering is also a valid Rust type over these
//! definitions. Written as a type, a program is monomorphized by rustc into a
//! single routine with every operand folded in: this is the form the bundle
//! artifact compiles to.
//!
//! The runtime chain and the [`Executable`](crate::Executable) share the
//! [`Halt`] and [`Step`] types, so all three evaluation paths agree on what
//! "halt on exhausted input" means.

mod ops;

pub use ops::*;

/// Source text of the definitions, spliced into bundles.
pub const DEFINITIONS: &str = include_str!("ops.rs");

#[cfg(test)]
mod tests {
    use super::*;

    type Minus1 = Int<HexF, HexF, HexF, HexF, HexF, HexF, HexF, HexF>;
    type Plus1 = Int<Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex1>;
    type Plus5 = Int<Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex5>;

    #[test]
    fn test_int_values() {
        assert_eq!(<Minus1 as Num>::VALUE, -1);
        assert_eq!(<Plus5 as Num>::VALUE, 5);
        assert_eq!(<Int<Hex8, Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex0> as Num>::VALUE, i32::MIN);
        assert_eq!(<Int<Hex7, HexF, HexF, HexF, HexF, HexF, HexF, HexF> as Num>::VALUE, i32::MAX);
        assert_eq!(<Int<Hex1, Hex2, Hex3, Hex4, HexA, HexB, HexC, HexD> as Num>::VALUE, 0x1234_ABCD);
    }

    #[test]
    fn test_clear_loop() {
        // +++++[-]
        type Program = AddData<Plus5, Loop<AddData<Minus1, Stop>, Stop>>;

        let mut tape = [0u8; 4];
        let mut output = Vec::new();
        let pointer = run::<Program>(&mut tape, &mut &b""[..], &mut output).unwrap();
        assert_eq!(pointer, 0);
        assert_eq!(tape, [0; 4]);
        assert!(output.is_empty());
    }

    #[test]
    fn test_echo_halts_on_exhausted_input() {
        // ,.>,.
        type Program = InputData<OutputData<AddPointer<Plus1, InputData<OutputData<Stop>>>>>;

        let mut tape = [0u8; 4];
        let mut output = Vec::new();
        let pointer = run::<Program>(&mut tape, &mut &b"a"[..], &mut output).unwrap();
        assert_eq!(output, b"a");
        assert_eq!(pointer, 1);
    }

    #[test]
    fn test_definitions_text_is_self_contained() {
        assert!(DEFINITIONS.contains("pub trait Op"));
        assert!(DEFINITIONS.contains("pub struct InputData<Next>"));
        assert!(!DEFINITIONS.contains("crate::"));
        assert!(!DEFINITIONS.contains("//!"));
    }
}
