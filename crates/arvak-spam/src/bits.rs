//! Conversions between bit tuples, integers and bit-pattern strings.
//!
//! Bit position 0 is always the most significant bit, so the tuple
//! `[true, false, true]` and the string `"101"` both encode the integer 5.

use crate::error::{SpamError, SpamResult};

/// A computational basis state of a group, one bit per qubit.
pub type BasisState = Vec<bool>;

/// Encode a bit tuple as an integer, most significant bit first.
pub fn basis_state_to_index(bits: &[bool]) -> usize {
    bits.iter()
        .fold(0, |acc, &bit| (acc << 1) | usize::from(bit))
}

/// Decode an integer into a bit tuple of the given width.
///
/// Fails when `value` does not fit into `width` bits.
pub fn index_to_basis_state(value: usize, width: usize) -> SpamResult<BasisState> {
    let fits = if width >= usize::BITS as usize {
        true
    } else {
        value < (1usize << width)
    };
    if !fits {
        return Err(SpamError::IndexOutOfRange { value, width });
    }
    Ok((0..width)
        .map(|pos| {
            let shift = width - 1 - pos;
            shift < usize::BITS as usize && (value >> shift) & 1 == 1
        })
        .collect())
}

/// Reorder the bits of `index` according to `mapping`.
///
/// `mapping[i]` is the position that bit `i` moves to. With `inverse` set the
/// bit found at position `mapping[i]` moves back to position `i`. The width of
/// the bit pattern is `mapping.len()`, and `mapping` must be a permutation of
/// `0..mapping.len()`.
pub fn permute(index: usize, mapping: &[usize], inverse: bool) -> usize {
    let width = mapping.len();
    debug_assert!(width <= usize::BITS as usize);
    let mut permuted = 0;
    for (pos, &target) in mapping.iter().enumerate() {
        let (from, to) = if inverse { (target, pos) } else { (pos, target) };
        let bit = (index >> (width - 1 - from)) & 1;
        permuted |= bit << (width - 1 - to);
    }
    permuted
}

/// A validated bijection between canonical and external bit positions.
///
/// Canonical order is the concatenation of the correlation groups; external
/// order is whatever order the backend reports bits in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitPermutation {
    mapping: Vec<usize>,
}

impl BitPermutation {
    /// Build from `mapping[canonical] = external`, checking it is a bijection.
    pub fn new(mapping: Vec<usize>) -> SpamResult<Self> {
        let width = mapping.len();
        let mut seen = vec![false; width];
        for (pos, &target) in mapping.iter().enumerate() {
            if target >= width || seen[target] {
                return Err(SpamError::InvalidState(format!(
                    "bit mapping is not a permutation: position {pos} maps to {target}"
                )));
            }
            seen[target] = true;
        }
        Ok(Self { mapping })
    }

    /// The identity permutation on `width` bits.
    pub fn identity(width: usize) -> Self {
        Self {
            mapping: (0..width).collect(),
        }
    }

    /// Number of bits.
    pub fn width(&self) -> usize {
        self.mapping.len()
    }

    /// Canonical index to external index.
    pub fn to_external(&self, canonical: usize) -> usize {
        permute(canonical, &self.mapping, false)
    }

    /// External index to canonical index.
    pub fn to_canonical(&self, external: usize) -> usize {
        permute(external, &self.mapping, true)
    }
}

/// Parse a bit-pattern string such as `"0110"`.
///
/// Whitespace and `_` separators are ignored.
pub fn parse_bitstring(bitstring: &str) -> SpamResult<BasisState> {
    bitstring
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(SpamError::InvalidBitstring(bitstring.to_string())),
        })
        .collect()
}

/// Render a bit tuple as a bit-pattern string.
pub fn format_bitstring(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
