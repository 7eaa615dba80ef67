//! Numeric inputs, projections and decimal kernels shared by all amounts.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::context::{positive_zero, MAX_PRECISION};
use crate::error::{MonetaryError, MonetaryResult};

/// Conversion of a numeric input into the decimal kernel.
///
/// Integers widen exactly. Floats go through their shortest decimal
/// rendering, so `0.1_f64` becomes `0.1` rather than the binary expansion;
/// only if that rendering does not parse is the float converted directly.
pub trait ToDecimal {
    fn to_decimal(&self) -> MonetaryResult<Decimal>;
}

impl ToDecimal for Decimal {
    fn to_decimal(&self) -> MonetaryResult<Decimal> {
        Ok(*self)
    }
}

impl<T: ToDecimal + ?Sized> ToDecimal for &T {
    fn to_decimal(&self) -> MonetaryResult<Decimal> {
        (**self).to_decimal()
    }
}

macro_rules! int_to_decimal {
    ($($t:ty),*) => {
        $(
            impl ToDecimal for $t {
                fn to_decimal(&self) -> MonetaryResult<Decimal> {
                    Ok(Decimal::from(*self))
                }
            }
        )*
    };
}

int_to_decimal!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl ToDecimal for i128 {
    fn to_decimal(&self) -> MonetaryResult<Decimal> {
        Decimal::from_i128(*self).ok_or_else(|| MonetaryError::overflow(self))
    }
}

impl ToDecimal for u128 {
    fn to_decimal(&self) -> MonetaryResult<Decimal> {
        Decimal::from_u128(*self).ok_or_else(|| MonetaryError::overflow(self))
    }
}

fn float_to_decimal(rendered: String, widened: f64) -> MonetaryResult<Decimal> {
    if !widened.is_finite() {
        return Err(MonetaryError::InvalidArgument(format!(
            "Non-finite number: {}",
            rendered
        )));
    }
    Decimal::from_str(&rendered)
        .or_else(|_| Decimal::from_scientific(&rendered))
        .ok()
        .or_else(|| Decimal::from_f64(widened))
        .ok_or_else(|| MonetaryError::overflow(rendered))
}

impl ToDecimal for f64 {
    fn to_decimal(&self) -> MonetaryResult<Decimal> {
        float_to_decimal(self.to_string(), *self)
    }
}

impl ToDecimal for f32 {
    fn to_decimal(&self) -> MonetaryResult<Decimal> {
        float_to_decimal(self.to_string(), f64::from(*self))
    }
}

impl ToDecimal for str {
    fn to_decimal(&self) -> MonetaryResult<Decimal> {
        let trimmed = self.trim();
        Decimal::from_str_exact(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|e| MonetaryError::InvalidArgument(format!("Invalid number '{}': {}", self, e)))
    }
}

impl ToDecimal for String {
    fn to_decimal(&self) -> MonetaryResult<Decimal> {
        self.as_str().to_decimal()
    }
}

/// Numeric types an amount can be projected onto via `as_type`.
///
/// Integer targets truncate toward zero; values outside the target's range
/// are an [`MonetaryError::UnsupportedConversion`].
pub trait NumberKind: Sized {
    /// Short name used in error messages.
    const NAME: &'static str;

    fn from_decimal(value: Decimal) -> MonetaryResult<Self>;
}

impl NumberKind for Decimal {
    const NAME: &'static str = "Decimal";

    fn from_decimal(value: Decimal) -> MonetaryResult<Self> {
        Ok(value)
    }
}

macro_rules! int_kind {
    ($($t:ty => $conv:ident),*) => {
        $(
            impl NumberKind for $t {
                const NAME: &'static str = stringify!($t);

                fn from_decimal(value: Decimal) -> MonetaryResult<Self> {
                    value.trunc().$conv().ok_or_else(|| MonetaryError::UnsupportedConversion {
                        value: value.to_string(),
                        target: Self::NAME,
                    })
                }
            }
        )*
    };
}

int_kind!(
    i8 => to_i8,
    i16 => to_i16,
    i32 => to_i32,
    i64 => to_i64,
    i128 => to_i128,
    u8 => to_u8,
    u16 => to_u16,
    u32 => to_u32,
    u64 => to_u64,
    u128 => to_u128
);

impl NumberKind for f64 {
    const NAME: &'static str = "f64";

    fn from_decimal(value: Decimal) -> MonetaryResult<Self> {
        value.to_f64().ok_or_else(|| MonetaryError::UnsupportedConversion {
            value: value.to_string(),
            target: Self::NAME,
        })
    }
}

impl NumberKind for f32 {
    const NAME: &'static str = "f32";

    fn from_decimal(value: Decimal) -> MonetaryResult<Self> {
        value.to_f32().ok_or_else(|| MonetaryError::UnsupportedConversion {
            value: value.to_string(),
            target: Self::NAME,
        })
    }
}

impl NumberKind for String {
    const NAME: &'static str = "String";

    fn from_decimal(value: Decimal) -> MonetaryResult<Self> {
        Ok(value.to_string())
    }
}

pub(crate) fn checked_add(a: Decimal, b: Decimal) -> MonetaryResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| MonetaryError::overflow(format!("{} + {}", a, b)))
}

pub(crate) fn checked_sub(a: Decimal, b: Decimal) -> MonetaryResult<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| MonetaryError::overflow(format!("{} - {}", a, b)))
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal) -> MonetaryResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| MonetaryError::overflow(format!("{} * {}", a, b)))
}

pub(crate) fn checked_div(a: Decimal, b: Decimal) -> MonetaryResult<Decimal> {
    if b.is_zero() {
        return Err(MonetaryError::DivisionByZero);
    }
    a.checked_div(b)
        .ok_or_else(|| MonetaryError::overflow(format!("{} / {}", a, b)))
}

/// Truncated remainder; the sign follows the dividend.
pub(crate) fn remainder(a: Decimal, b: Decimal) -> MonetaryResult<Decimal> {
    if b.is_zero() {
        return Err(MonetaryError::DivisionByZero);
    }
    a.checked_rem(b)
        .map(positive_zero)
        .ok_or_else(|| MonetaryError::overflow(format!("{} % {}", a, b)))
}

/// Integral part of `a / b`, truncated toward zero, with scale 0.
///
/// Computed as `(a - a % b) / b`, which divides exactly.
pub(crate) fn divide_to_integral(a: Decimal, b: Decimal) -> MonetaryResult<Decimal> {
    let rem = remainder(a, b)?;
    let exact = checked_sub(a, rem)?;
    let quotient = checked_div(exact, b)?;
    Ok(positive_zero(quotient.trunc()))
}

/// `value × 10^n`, exact.
pub(crate) fn scale_by_power_of_ten(value: Decimal, n: i32) -> MonetaryResult<Decimal> {
    let scale = i64::from(value.scale()) - i64::from(n);
    if scale >= 0 {
        let scale = u32::try_from(scale)
            .ok()
            .filter(|s| *s <= MAX_PRECISION)
            .ok_or_else(|| MonetaryError::overflow(format!("{}E{}", value, n)))?;
        return Decimal::try_from_i128_with_scale(value.mantissa(), scale)
            .map_err(|_| MonetaryError::overflow(format!("{}E{}", value, n)));
    }
    let shift = u32::try_from(-scale)
        .map_err(|_| MonetaryError::overflow(format!("{}E{}", value, n)))?;
    let factor = 10i128
        .checked_pow(shift)
        .ok_or_else(|| MonetaryError::overflow(format!("{}E{}", value, n)))?;
    value
        .mantissa()
        .checked_mul(factor)
        .and_then(|m| Decimal::try_from_i128_with_scale(m, 0).ok())
        .ok_or_else(|| MonetaryError::overflow(format!("{}E{}", value, n)))
}

/// `value^exponent` by repeated squaring, failing on overflow.
pub(crate) fn checked_pow(value: Decimal, exponent: u32) -> MonetaryResult<Decimal> {
    let mut result = Decimal::ONE;
    let mut base = value;
    let mut e = exponent;
    while e > 0 {
        if e & 1 == 1 {
            result = checked_mul(result, base)?;
        }
        e >>= 1;
        if e > 0 {
            base = checked_mul(base, base)?;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_float_uses_decimal_rendering() {
        assert_eq!(0.1_f64.to_decimal().unwrap().to_string(), "0.1");
        assert_eq!(2.2_f64.to_decimal().unwrap(), dec!(2.2));
        assert_eq!(1.56_f32.to_decimal().unwrap(), dec!(1.56));
        assert_eq!(10.0_f64.to_decimal().unwrap(), dec!(10));
    }

    #[test]
    fn test_float_non_finite_rejected() {
        assert!(matches!(
            f64::NAN.to_decimal(),
            Err(MonetaryError::InvalidArgument(_))
        ));
        assert!(f64::INFINITY.to_decimal().is_err());
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(i64::MAX.to_decimal().unwrap(), Decimal::from(i64::MAX));
        assert_eq!(7u8.to_decimal().unwrap(), dec!(7));
        assert!(u128::MAX.to_decimal().is_err());
    }

    #[test]
    fn test_string_parsing() {
        assert_eq!("12.50".to_decimal().unwrap().to_string(), "12.50");
        assert_eq!("1.5e3".to_decimal().unwrap(), dec!(1500));
        assert!(matches!(
            "twelve".to_decimal(),
            Err(MonetaryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_number_kinds() {
        assert_eq!(i64::from_decimal(dec!(-2.9)).unwrap(), -2);
        assert_eq!(u8::from_decimal(dec!(255.99)).unwrap(), 255);
        assert!(matches!(
            u8::from_decimal(dec!(256)),
            Err(MonetaryError::UnsupportedConversion { target: "u8", .. })
        ));
        assert!(u32::from_decimal(dec!(-1)).is_err());
        assert_eq!(f64::from_decimal(dec!(2.5)).unwrap(), 2.5);
    }

    #[test]
    fn test_divide_to_integral_and_remainder() {
        assert_eq!(divide_to_integral(dec!(1000), dec!(11)).unwrap(), dec!(90));
        assert_eq!(remainder(dec!(1000), dec!(11)).unwrap(), dec!(10));
        assert_eq!(divide_to_integral(dec!(-7.5), dec!(2)).unwrap(), dec!(-3));
        assert_eq!(remainder(dec!(-7.5), dec!(2)).unwrap(), dec!(-1.5));
        assert_eq!(divide_to_integral(dec!(0.5), dec!(2)).unwrap().scale(), 0);
        assert_eq!(
            divide_to_integral(dec!(1), dec!(0)),
            Err(MonetaryError::DivisionByZero)
        );
    }

    #[test]
    fn test_scale_by_power_of_ten() {
        assert_eq!(scale_by_power_of_ten(dec!(1.5), 3).unwrap(), dec!(1500));
        assert_eq!(scale_by_power_of_ten(dec!(1.5), 1).unwrap(), dec!(15));
        assert_eq!(scale_by_power_of_ten(dec!(1.5), -2).unwrap().to_string(), "0.015");
        assert!(scale_by_power_of_ten(dec!(1), 40).is_err());
    }

    #[test]
    fn test_checked_pow() {
        assert_eq!(checked_pow(dec!(1.1), 2).unwrap(), dec!(1.21));
        assert_eq!(checked_pow(dec!(2), 10).unwrap(), dec!(1024));
        assert_eq!(checked_pow(dec!(5), 0).unwrap(), dec!(1));
        assert!(checked_pow(dec!(10), 40).is_err());
    }
}
