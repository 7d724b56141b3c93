//! Fixed-width wrapping integer values carried on a named bus.
//!
//! [`BusValue`] is the engine behind the three public bus types
//! ([`DataBusValue`], [`DataAddressBusValue`], [`InstructionAddressBusValue`]).
//! They share a width and all the same arithmetic, but are distinct types so
//! that a data-address value can never be passed where an instruction-address
//! value is expected, even though both buses happen to be 16 bits wide.

use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Not, Sub};

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusValueError {
    #[error("value {value} out of range [{min}, {max}] for a {width}-bit bus value")]
    OutOfRange {
        value: i64,
        min: i64,
        max: i64,
        width: u32,
    },
    #[error("invalid slice bounds [{start}, {end}) for a {width}-bit bus value")]
    InvalidSlice { start: u32, end: u32, width: u32 },
}

/// A value on a bus of width `W`, stored as its unsigned representative mod `2^W`.
///
/// Not exposed directly; each concrete bus type wraps one of these so that
/// values from different buses can't be compared or combined even when the
/// widths coincide.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BusValue<const W: u32>(u32);

impl<const W: u32> BusValue<W> {
    pub(crate) const WIDTH: u32 = W;
    pub(crate) const MAX_UNSIGNED: u32 = ((1u64 << W) - 1) as u32;
    pub(crate) const MIN_SIGNED: i64 = -(1i64 << (W - 1));
    pub(crate) const MAX_SIGNED: i64 = (1i64 << (W - 1)) - 1;

    pub(crate) fn new(value: i64) -> Result<Self, BusValueError> {
        if value < Self::MIN_SIGNED || value > Self::MAX_UNSIGNED as i64 {
            return Err(BusValueError::OutOfRange {
                value,
                min: Self::MIN_SIGNED,
                max: Self::MAX_UNSIGNED as i64,
                width: W,
            });
        }
        let wrapped = (value as i128 & Self::MAX_UNSIGNED as i128) as u32;
        Ok(Self(wrapped))
    }

    pub(crate) fn wrap_unsigned(value: u32) -> Self {
        Self(value & Self::MAX_UNSIGNED)
    }

    pub(crate) fn unsigned(&self) -> u32 {
        self.0
    }

    pub(crate) fn signed(&self) -> i64 {
        if self.0 as i64 > Self::MAX_SIGNED {
            self.0 as i64 - (1i64 << W)
        } else {
            self.0 as i64
        }
    }

    pub(crate) fn is_negative(&self) -> bool {
        self.signed() < 0
    }

    pub(crate) fn slice(&self, start: u32, end: u32) -> Result<Self, BusValueError> {
        if !(start < end && end <= W) {
            return Err(BusValueError::InvalidSlice { start, end, width: W });
        }
        let width = end - start;
        let mask = ((1u64 << width) - 1) as u32;
        Ok(Self((self.0 >> start) & mask))
    }
}

impl<const W: u32> Add for BusValue<W> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::wrap_unsigned(self.0.wrapping_add(other.0))
    }
}

impl<const W: u32> Sub for BusValue<W> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::wrap_unsigned(self.0.wrapping_sub(other.0))
    }
}

impl<const W: u32> BitAnd for BusValue<W> {
    type Output = Self;

    fn bitand(self, other: Self) -> Self {
        Self::wrap_unsigned(self.0 & other.0)
    }
}

impl<const W: u32> BitOr for BusValue<W> {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Self::wrap_unsigned(self.0 | other.0)
    }
}

impl<const W: u32> BitXor for BusValue<W> {
    type Output = Self;

    fn bitxor(self, other: Self) -> Self {
        Self::wrap_unsigned(self.0 ^ other.0)
    }
}

impl<const W: u32> Not for BusValue<W> {
    type Output = Self;

    fn not(self) -> Self {
        Self::wrap_unsigned(!self.0)
    }
}

impl<const W: u32> fmt::Debug for BusValue<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BusValue<{}>(0x{:x})", W, self.0)
    }
}

/// Generates a concrete bus-value newtype delegating to [`BusValue`], along
/// with the arithmetic and slicing operations every bus supports. Keeping the
/// three bus types as distinct structs (rather than type aliases over
/// [`BusValue`]) is what makes mixing a data-address value with an
/// instruction-address value a type error, even though both are 16 bits wide.
macro_rules! bus_value_type {
    ($name:ident, $width:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(BusValue<$width>);

        impl $name {
            pub const WIDTH: u32 = $width;
            pub const MAX_UNSIGNED: u32 = BusValue::<$width>::MAX_UNSIGNED;
            pub const MIN_SIGNED: i64 = BusValue::<$width>::MIN_SIGNED;
            pub const MAX_SIGNED: i64 = BusValue::<$width>::MAX_SIGNED;

            /// Construct from any integer in `[MIN_SIGNED, MAX_UNSIGNED]`.
            pub fn new(value: impl Into<i64>) -> Result<Self, BusValueError> {
                Ok(Self(BusValue::new(value.into())?))
            }

            /// Construct from an unsigned value, wrapping mod `2^W`.
            pub fn from_unsigned(value: u32) -> Self {
                Self(BusValue::wrap_unsigned(value))
            }

            pub fn unsigned(&self) -> u32 {
                self.0.unsigned()
            }

            pub fn signed(&self) -> i64 {
                self.0.signed()
            }

            pub fn is_negative(&self) -> bool {
                self.0.is_negative()
            }

            /// Extract the bits in `[start, end)`, as a value of the same bus.
            pub fn slice(&self, start: u32, end: u32) -> Result<Self, BusValueError> {
                Ok(Self(self.0.slice(start, end)?))
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                Self(self.0 + other.0)
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                Self(self.0 - other.0)
            }
        }

        impl BitAnd for $name {
            type Output = Self;

            fn bitand(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }
        }

        impl BitXor for $name {
            type Output = Self;

            fn bitxor(self, other: Self) -> Self {
                Self(self.0 ^ other.0)
            }
        }

        impl Not for $name {
            type Output = Self;

            fn not(self) -> Self {
                Self(!self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{:x})", stringify!($name), self.0.unsigned())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:x}", self.0.unsigned())
            }
        }

        // Deliberately no `PartialOrd`/`Ord`: signedness is ambiguous for a
        // bus value, so ordering comparisons are not offered at all.
    };
}

bus_value_type!(DataBusValue, 8);
bus_value_type!(DataAddressBusValue, 16);
bus_value_type!(InstructionAddressBusValue, 16);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn construct_rejects_out_of_range() {
        assert!(DataBusValue::new(256i64).is_err());
        assert!(DataBusValue::new(-129i64).is_err());
        assert!(DataBusValue::new(255i64).is_ok());
        assert!(DataBusValue::new(-128i64).is_ok());
    }

    #[test]
    fn unsigned_and_signed_views_round_trip() {
        let v = DataBusValue::new(-1i64).unwrap();
        assert_eq!(v.unsigned(), 0xFF);
        assert_eq!(v.signed(), -1);

        let v = DataBusValue::from_unsigned(0xFF);
        assert_eq!(DataBusValue::new(v.unsigned() as i64).unwrap(), v);
        assert_eq!(DataBusValue::new(v.signed()).unwrap(), v);
    }

    #[test]
    fn arithmetic_wraps_mod_width() {
        let max = DataBusValue::from_unsigned(0xFF);
        let one = DataBusValue::new(1i64).unwrap();
        assert_eq!((max + one).unsigned(), 0);

        let zero = DataBusValue::new(0i64).unwrap();
        assert_eq!((zero - one).unsigned(), 0xFF);
    }

    #[test]
    fn slice_extracts_bit_ranges() {
        let v = DataBusValue::from_unsigned(0b1010_1100);
        assert_eq!(v.slice(0, 4).unwrap().unsigned(), 0b1100);
        assert_eq!(v.slice(4, 8).unwrap().unsigned(), 0b1010);
    }

    #[test]
    fn slice_rejects_bad_bounds() {
        let v = DataBusValue::from_unsigned(0);
        assert!(v.slice(4, 4).is_err());
        assert!(v.slice(0, 9).is_err());
    }

    #[test]
    fn data_address_and_instruction_address_are_distinct_types() {
        let d = DataAddressBusValue::from_unsigned(4);
        let i = InstructionAddressBusValue::from_unsigned(4);
        // `d == i` would not compile: different bus types, even though both
        // are 16 bits wide.
        assert_eq!(d.unsigned(), i.unsigned());
    }

    proptest! {
        #[test]
        fn unsigned_view_stays_in_range(raw: u32) {
            let v = DataBusValue::from_unsigned(raw);
            prop_assert!(v.unsigned() <= DataBusValue::MAX_UNSIGNED);
        }

        #[test]
        fn signed_view_stays_in_range(raw: u32) {
            let v = DataBusValue::from_unsigned(raw);
            prop_assert!(v.signed() >= DataBusValue::MIN_SIGNED && v.signed() <= DataBusValue::MAX_SIGNED);
        }

        #[test]
        fn unsigned_round_trips_through_new(raw in 0u32..=DataBusValue::MAX_UNSIGNED) {
            let v = DataBusValue::from_unsigned(raw);
            prop_assert_eq!(DataBusValue::new(v.unsigned() as i64).unwrap(), v);
            prop_assert_eq!(DataBusValue::new(v.signed()).unwrap(), v);
        }

        #[test]
        fn addition_wraps_mod_width(a: u32, b: u32) {
            let va = DataBusValue::from_unsigned(a);
            let vb = DataBusValue::from_unsigned(b);
            let expected = (va.unsigned() + vb.unsigned()) % (DataBusValue::MAX_UNSIGNED + 1);
            prop_assert_eq!((va + vb).unsigned(), expected);
        }

        #[test]
        fn subtraction_wraps_mod_width(a: u32, b: u32) {
            let va = DataBusValue::from_unsigned(a);
            let vb = DataBusValue::from_unsigned(b);
            let modulus = DataBusValue::MAX_UNSIGNED as i64 + 1;
            let expected = (va.unsigned() as i64 - vb.unsigned() as i64).rem_euclid(modulus) as u32;
            prop_assert_eq!((va - vb).unsigned(), expected);
        }
    }
}
