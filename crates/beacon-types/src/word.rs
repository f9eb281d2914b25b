//! Wide working integers and their narrowed storage forms.
//!
//! Observations carry values as 256-bit two's complement words
//! ([`SignedWord`]). The feed store keeps values as [`Int224`] and
//! timestamps as `u32`. Every conversion from the wide form to the narrow
//! form is checked and fails with [`RangeError`] instead of truncating.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Most significant bit of a 256-bit word, as a mask.
const SIGN_MASK: U256 = U256([0, 0, 0, 0x8000_0000_0000_0000]);

/// A narrowing conversion would lose information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The value does not fit the stored signed 224-bit range.
    #[error("value {0} does not fit in a signed 224-bit integer")]
    Value(SignedWord),

    /// The timestamp does not fit the stored unsigned 32-bit range.
    #[error("timestamp {0} does not fit in an unsigned 32-bit integer")]
    Timestamp(U256),
}

/// Failure to parse a decimal string into a [`SignedWord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid signed 256-bit integer: {0}")]
pub struct ParseWordError(String);

/// A signed 256-bit integer in two's complement representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SignedWord(U256);

impl SignedWord {
    pub const ZERO: Self = Self(U256([0; 4]));

    /// Largest representable value, `2^255 - 1`.
    pub const MAX: Self = Self(U256([u64::MAX, u64::MAX, u64::MAX, 0x7FFF_FFFF_FFFF_FFFF]));

    /// Smallest representable value, `-2^255`.
    pub const MIN: Self = Self(SIGN_MASK);

    /// Wrap raw two's complement bits.
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// The raw two's complement bits.
    pub const fn raw(self) -> U256 {
        self.0
    }

    /// Decode a big-endian two's complement word.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Self(U256::from_big_endian(bytes))
    }

    /// Encode as a big-endian two's complement word.
    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }

    pub fn is_negative(self) -> bool {
        self.0.bit(255)
    }

    /// Two's complement negation. `MIN` negates to itself.
    pub fn wrapping_neg(self) -> Self {
        Self((!self.0).overflowing_add(U256::one()).0)
    }

    /// Magnitude as an unsigned word. Exact for every value including `MIN`.
    pub fn unsigned_abs(self) -> U256 {
        if self.is_negative() {
            self.wrapping_neg().0
        } else {
            self.0
        }
    }

    /// Whether the value is representable as a signed integer of `bits` bits.
    ///
    /// True when bits `bits - 1 ..= 255` are all equal (a pure sign extension).
    pub fn fits_signed_bits(self, bits: usize) -> bool {
        if bits == 0 {
            return false;
        }
        if bits >= 256 {
            return true;
        }
        let upper = self.0 >> (bits - 1);
        upper.is_zero() || upper == (U256::MAX >> (bits - 1))
    }

    /// Convert to `i128` when the value fits.
    pub fn to_i128(self) -> Option<i128> {
        if self.fits_signed_bits(128) {
            Some(self.0.low_u128() as i128)
        } else {
            None
        }
    }

    /// Arithmetic shift right by one bit (rounds toward negative infinity).
    fn shr1_arithmetic(self) -> U256 {
        let shifted = self.0 >> 1;
        if self.is_negative() {
            shifted | SIGN_MASK
        } else {
            shifted
        }
    }

    /// Mean of two words, truncated toward zero, without intermediate overflow.
    ///
    /// `floor((a + b) / 2)` is formed from the halves of each operand plus the
    /// carry of their low bits; a negative floor with an odd sum is then
    /// moved one step toward zero.
    pub fn average(a: Self, b: Self) -> Self {
        let one = U256::one();
        let floor = a
            .shr1_arithmetic()
            .overflowing_add(b.shr1_arithmetic())
            .0
            .overflowing_add(a.0 & b.0 & one)
            .0;
        let floor = Self(floor);
        if floor.is_negative() {
            Self(floor.0.overflowing_add((a.0 ^ b.0) & one).0)
        } else {
            floor
        }
    }
}

impl Ord for SignedWord {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flipping the sign bit maps two's complement order onto unsigned order.
        (self.0 ^ SIGN_MASK).cmp(&(other.0 ^ SIGN_MASK))
    }
}

impl PartialOrd for SignedWord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i128> for SignedWord {
    fn from(value: i128) -> Self {
        let magnitude = Self(U256::from(value.unsigned_abs()));
        if value < 0 {
            magnitude.wrapping_neg()
        } else {
            magnitude
        }
    }
}

impl From<i64> for SignedWord {
    fn from(value: i64) -> Self {
        Self::from(i128::from(value))
    }
}

impl fmt::Display for SignedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}", self.unsigned_abs())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Debug for SignedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignedWord({self})")
    }
}

impl FromStr for SignedWord {
    type Err = ParseWordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() {
            return Err(ParseWordError(s.to_string()));
        }
        let magnitude =
            U256::from_dec_str(digits).map_err(|_| ParseWordError(s.to_string()))?;
        if negative {
            if magnitude > SIGN_MASK {
                return Err(ParseWordError(s.to_string()));
            }
            Ok(Self(magnitude).wrapping_neg())
        } else {
            if magnitude >= SIGN_MASK {
                return Err(ParseWordError(s.to_string()));
            }
            Ok(Self(magnitude))
        }
    }
}

impl Serialize for SignedWord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SignedWord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A signed integer guaranteed to fit in 224 bits: the stored value form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Int224(SignedWord);

impl Int224 {
    pub const BITS: usize = 224;

    /// `2^223 - 1`
    pub const MAX: Self = Self(SignedWord(U256([
        u64::MAX,
        u64::MAX,
        u64::MAX,
        0x0000_0000_7FFF_FFFF,
    ])));

    /// `-2^223`
    pub const MIN: Self = Self(SignedWord(U256([0, 0, 0, 0xFFFF_FFFF_8000_0000])));

    pub const ZERO: Self = Self(SignedWord::ZERO);

    /// Widen back to the working representation.
    pub const fn widen(self) -> SignedWord {
        self.0
    }
}

impl TryFrom<SignedWord> for Int224 {
    type Error = RangeError;

    fn try_from(value: SignedWord) -> Result<Self, Self::Error> {
        if value.fits_signed_bits(Self::BITS) {
            Ok(Self(value))
        } else {
            Err(RangeError::Value(value))
        }
    }
}

impl From<Int224> for SignedWord {
    fn from(value: Int224) -> Self {
        value.0
    }
}

impl fmt::Display for Int224 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Int224 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Int224({})", self.0)
    }
}

impl Serialize for Int224 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Int224 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wide = SignedWord::deserialize(deserializer)?;
        Int224::try_from(wide).map_err(serde::de::Error::custom)
    }
}

/// Narrow a working timestamp to the stored `u32` form.
pub fn narrow_timestamp(timestamp: u64) -> Result<u32, RangeError> {
    u32::try_from(timestamp).map_err(|_| RangeError::Timestamp(U256::from(timestamp)))
}

/// Narrow a 256-bit unsigned timestamp word to the stored `u32` form.
pub fn narrow_timestamp_word(word: U256) -> Result<u32, RangeError> {
    if word > U256::from(u32::MAX) {
        return Err(RangeError::Timestamp(word));
    }
    Ok(word.low_u32())
}
