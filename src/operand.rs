//! Numeric encoding of immediate operands.
//!
//! A specialized node never carries its operand as a plain runtime integer.
//! Instead every 32-bit signed operand is spelled out as eight base-16 digit
//! kinds, most-significant nibble first, so the whole value is part of the
//! node's *shape* (and of its canonical name, `Int<Hex0, ..., HexF>`).
//!
//! Negative values use their two's-complement bit pattern, so `-1` is eight
//! `HexF` digits and the encoding is lossless over the full `i32` range.

use std::fmt;

/// One base-16 digit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Hex {
    Hex0 = 0,
    Hex1 = 1,
    Hex2 = 2,
    Hex3 = 3,
    Hex4 = 4,
    Hex5 = 5,
    Hex6 = 6,
    Hex7 = 7,
    Hex8 = 8,
    Hex9 = 9,
    HexA = 10,
    HexB = 11,
    HexC = 12,
    HexD = 13,
    HexE = 14,
    HexF = 15,
}

impl Hex {
    /// All sixteen digit kinds, indexed by their value.
    pub const ALL: [Hex; 16] = [
        Hex::Hex0, Hex::Hex1, Hex::Hex2, Hex::Hex3,
        Hex::Hex4, Hex::Hex5, Hex::Hex6, Hex::Hex7,
        Hex::Hex8, Hex::Hex9, Hex::HexA, Hex::HexB,
        Hex::HexC, Hex::HexD, Hex::HexE, Hex::HexF,
    ];

    /// Digit kind for the low four bits of `nibble`.
    pub const fn from_nibble(nibble: u8) -> Hex {
        Hex::ALL[(nibble & 0xF) as usize]
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Canonical name of this digit kind.
    pub const fn name(self) -> &'static str {
        match self {
            Hex::Hex0 => "Hex0",
            Hex::Hex1 => "Hex1",
            Hex::Hex2 => "Hex2",
            Hex::Hex3 => "Hex3",
            Hex::Hex4 => "Hex4",
            Hex::Hex5 => "Hex5",
            Hex::Hex6 => "Hex6",
            Hex::Hex7 => "Hex7",
            Hex::Hex8 => "Hex8",
            Hex::Hex9 => "Hex9",
            Hex::HexA => "HexA",
            Hex::HexB => "HexB",
            Hex::HexC => "HexC",
            Hex::HexD => "HexD",
            Hex::HexE => "HexE",
            Hex::HexF => "HexF",
        }
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of digits in one operand.
pub const OPERAND_DIGITS: usize = 8;

/// Canonical name of the eight-digit composite.
pub const OPERAND_NAME: &str = "Int";

/// A 32-bit signed operand spelled as eight digit kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operand {
    digits: [Hex; OPERAND_DIGITS],
}

impl Operand {
    /// Encode `value`, most-significant nibble first.
    pub const fn encode(value: i32) -> Self {
        let bits = value as u32;
        let mut digits = [Hex::Hex0; OPERAND_DIGITS];
        let mut i = 0;
        while i < OPERAND_DIGITS {
            let shift = 4 * (OPERAND_DIGITS - 1 - i);
            digits[i] = Hex::from_nibble((bits >> shift) as u8);
            i += 1;
        }
        Self { digits }
    }

    pub const fn from_digits(digits: [Hex; OPERAND_DIGITS]) -> Self {
        Self { digits }
    }

    /// Decode back to the signed value: `sum(nibble_i << 4 * (7 - i))`.
    pub const fn value(&self) -> i32 {
        let mut bits: u32 = 0;
        let mut i = 0;
        while i < OPERAND_DIGITS {
            bits = (bits << 4) | self.digits[i].value() as u32;
            i += 1;
        }
        bits as i32
    }

    pub fn digits(&self) -> &[Hex; OPERAND_DIGITS] {
        &self.digits
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::encode(value)
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operand({})", self.value())
    }
}

/// Canonical form: `Int<H7, H6, H5, H4, H3, H2, H1, H0>`.
impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OPERAND_NAME}<")?;
        for (i, digit) in self.digits.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(digit.name())?;
        }
        f.write_str(">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_values_round_trip() {
        for value in [0, 1, -1, 3, -3, 255, 256, -256, i32::MAX, i32::MIN, i32::MIN + 1] {
            assert_eq!(Operand::encode(value).value(), value, "value {value}");
        }
    }

    #[test]
    fn test_digit_order_is_most_significant_first() {
        let op = Operand::encode(0x1234_ABCD);
        assert_eq!(
            op.digits(),
            &[
                Hex::Hex1, Hex::Hex2, Hex::Hex3, Hex::Hex4,
                Hex::HexA, Hex::HexB, Hex::HexC, Hex::HexD,
            ]
        );
    }

    #[test]
    fn test_negative_values_use_twos_complement() {
        assert_eq!(Operand::encode(-1).digits(), &[Hex::HexF; 8]);

        let min = Operand::encode(i32::MIN);
        assert_eq!(min.digits()[0], Hex::Hex8);
        assert!(min.digits()[1..].iter().all(|&d| d == Hex::Hex0));

        let max = Operand::encode(i32::MAX);
        assert_eq!(max.digits()[0], Hex::Hex7);
        assert!(max.digits()[1..].iter().all(|&d| d == Hex::HexF));
    }

    #[test]
    fn test_sampled_range_round_trip() {
        let mut value = i32::MIN;
        loop {
            assert_eq!(Operand::encode(value).value(), value);
            match value.checked_add(0x0101_0101 + 7) {
                Some(next) => value = next,
                None => break,
            }
        }
    }

    #[test]
    fn test_canonical_rendering() {
        assert_eq!(
            Operand::encode(-2).to_string(),
            "Int<HexF, HexF, HexF, HexF, HexF, HexF, HexF, HexE>"
        );
        assert_eq!(format!("{:?}", Operand::from(42)), "Operand(42)");
    }

    #[test]
    fn test_hex_names_and_values() {
        for (i, hex) in Hex::ALL.iter().enumerate() {
            assert_eq!(hex.value() as usize, i);
            assert_eq!(Hex::from_nibble(i as u8), *hex);
        }
        assert_eq!(Hex::HexA.name(), "HexA");
        assert_eq!(Hex::Hex9.to_string(), "Hex9");
    }
}
