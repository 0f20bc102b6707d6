//! Numeric element types
//!
//! Every statistic in this crate is written once, generic over [`Element`],
//! and monomorphized for the ten fixed-width types a pixel or catalog
//! column can hold. Each type reserves one value as its "blank" (missing
//! data) marker:
//!
//! - unsigned integers: `MAX`
//! - signed integers: `MIN`
//! - floating point: NaN (every NaN is blank)
//!
//! Blank detection only happens where data enters the core (see
//! [`crate::view`]); the algorithms downstream work on blank-free views and
//! do all intermediate arithmetic in `f64`.

use num_traits::AsPrimitive;
use std::fmt::Debug;

/// A fixed-width numeric element with a reserved blank value
pub trait Element: Copy + PartialOrd + Debug + Send + Sync + AsPrimitive<f64> + 'static {
    /// Short type name, used in log messages
    const TYPE_NAME: &'static str;

    /// Whether the type can hold values below zero
    const SIGNED: bool;

    /// The value standing in for "no data"
    fn blank() -> Self;

    /// Check whether this element is the blank marker
    fn is_blank(&self) -> bool;

    /// Widen to `f64` for intermediate arithmetic
    #[inline]
    fn to_f64(self) -> f64 {
        self.as_()
    }
}

macro_rules! impl_integer_element {
    ($($t:ty => $name:literal, $signed:literal, $blank:expr);* $(;)?) => {
        $(
            impl Element for $t {
                const TYPE_NAME: &'static str = $name;
                const SIGNED: bool = $signed;

                #[inline]
                fn blank() -> Self {
                    $blank
                }

                #[inline]
                fn is_blank(&self) -> bool {
                    *self == $blank
                }
            }
        )*
    };
}

impl_integer_element! {
    u8  => "uint8",  false, u8::MAX;
    i8  => "int8",   true,  i8::MIN;
    u16 => "uint16", false, u16::MAX;
    i16 => "int16",  true,  i16::MIN;
    u32 => "uint32", false, u32::MAX;
    i32 => "int32",  true,  i32::MIN;
    u64 => "uint64", false, u64::MAX;
    i64 => "int64",  true,  i64::MIN;
}

impl Element for f32 {
    const TYPE_NAME: &'static str = "float32";
    const SIGNED: bool = true;

    #[inline]
    fn blank() -> Self {
        f32::NAN
    }

    #[inline]
    fn is_blank(&self) -> bool {
        self.is_nan()
    }
}

impl Element for f64 {
    const TYPE_NAME: &'static str = "float64";
    const SIGNED: bool = true;

    #[inline]
    fn blank() -> Self {
        f64::NAN
    }

    #[inline]
    fn is_blank(&self) -> bool {
        self.is_nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_blanks() {
        assert!(u8::MAX.is_blank());
        assert!(!0u8.is_blank());
        assert!(i16::MIN.is_blank());
        assert!(!(-1i16).is_blank());
        assert_eq!(<u32 as Element>::blank(), u32::MAX);
        assert_eq!(<i64 as Element>::blank(), i64::MIN);
    }

    #[test]
    fn test_float_blanks() {
        assert!(f32::NAN.is_blank());
        assert!(<f64 as Element>::blank().is_nan());
        assert!(!f64::INFINITY.is_blank());
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(200u8.to_f64(), 200.0);
        assert_eq!((-5i32).to_f64(), -5.0);
        assert_eq!(1.5f32.to_f64(), 1.5);
        assert!(!<u64 as Element>::SIGNED);
        assert!(<i8 as Element>::SIGNED);
    }
}
