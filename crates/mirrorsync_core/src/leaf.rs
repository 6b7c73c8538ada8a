//! Scalar and enum values.
//!
//! Leaves are compared by value and written directly. They never track
//! their own dirtiness: the composite field or collection slot holding a
//! leaf records the change instead.
//!
//! Floats compare by bit pattern, so `-0.0` differs from `0.0` and every
//! NaN equals every other NaN. Canonical messages cannot hold NaN, so a NaN
//! float travels as `null`.

use crate::error::{MirrorError, MirrorResult};
use mirrorsync_codec::Value;

/// A scalar that maps directly onto a message value.
pub trait Leaf: Sized {
    /// Encode this value.
    fn to_value(&self) -> Value;

    /// Decode a value of this type.
    fn from_value(value: &Value) -> MirrorResult<Self>;
}

/// Implements [`Mirrored`](crate::Mirrored) for a type that already
/// implements [`Leaf`], `PartialEq` and `Debug`.
#[doc(hidden)]
#[macro_export]
macro_rules! impl_leaf_node {
    (@eq |$a:ident, $b:ident| $eq:expr; $($ty:ty),+) => {$(
        impl $crate::Mirrored for $ty {
            fn write(&self, _dirty_only: bool) -> $crate::MirrorResult<$crate::Value> {
                Ok($crate::Leaf::to_value(self))
            }

            fn read(&mut self, message: &$crate::Value) -> $crate::MirrorResult<()> {
                *self = <$ty as $crate::Leaf>::from_value(message)?;
                Ok(())
            }

            fn is_dirty(&self) -> bool {
                false
            }

            fn mark_clean(&mut self) {}

            fn content_equals(&self, other: &Self) -> bool {
                let ($a, $b) = (self, other);
                $eq
            }

            fn describe(&self, out: &mut String, _indent: usize) {
                out.push_str(&format!("{:?}", self));
            }

            fn is_leaf(&self) -> bool {
                true
            }
        }
    )+};
    ($($ty:ty),+ $(,)?) => {
        $crate::impl_leaf_node!(@eq |a, b| a == b; $($ty),+);
    };
}

macro_rules! integer_leaf {
    ($($ty:ty),+) => {$(
        impl Leaf for $ty {
            fn to_value(&self) -> Value {
                Value::Integer(i64::from(*self))
            }

            fn from_value(value: &Value) -> MirrorResult<Self> {
                let n = value
                    .as_integer()
                    .ok_or_else(|| MirrorError::type_mismatch("integer", value))?;
                <$ty>::try_from(n).map_err(|_| MirrorError::IntegerOutOfRange {
                    value: n,
                    target: stringify!($ty),
                })
            }
        }
    )+};
}

integer_leaf!(i8, i16, i32, i64, u8, u16, u32);

// u64 travels as the i64 with the same bit pattern.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
impl Leaf for u64 {
    fn to_value(&self) -> Value {
        Value::Integer(*self as i64)
    }

    fn from_value(value: &Value) -> MirrorResult<Self> {
        value
            .as_integer()
            .map(|n| n as u64)
            .ok_or_else(|| MirrorError::type_mismatch("integer", value))
    }
}

impl Leaf for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> MirrorResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| MirrorError::type_mismatch("bool", value))
    }
}

impl Leaf for f64 {
    fn to_value(&self) -> Value {
        if self.is_nan() {
            Value::Null
        } else {
            Value::Float(*self)
        }
    }

    fn from_value(value: &Value) -> MirrorResult<Self> {
        if value.is_null() {
            return Ok(f64::NAN);
        }
        value
            .as_float()
            .ok_or_else(|| MirrorError::type_mismatch("float", value))
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Leaf for f32 {
    fn to_value(&self) -> Value {
        f64::from(*self).to_value()
    }

    fn from_value(value: &Value) -> MirrorResult<Self> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl Leaf for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> MirrorResult<Self> {
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| MirrorError::type_mismatch("text", value))
    }
}

impl Leaf for char {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }

    fn from_value(value: &Value) -> MirrorResult<Self> {
        let text = value
            .as_text()
            .ok_or_else(|| MirrorError::type_mismatch("char", value))?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(MirrorError::malformed(format!(
                "expected a single character, found {text:?}"
            ))),
        }
    }
}

impl Leaf for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: &Value) -> MirrorResult<Self> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| MirrorError::type_mismatch("bytes", value))
    }
}

impl_leaf_node!(i8, i16, i32, i64, u8, u16, u32, u64, bool, String, char, Vec<u8>);
impl_leaf_node!(@eq |a, b| a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()); f32, f64);

/// Declares an enum replicated by variant name.
///
/// The macro adds `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash` and
/// `Default` derives, so exactly one variant must carry `#[default]`.
/// Reading a name that is not a variant fails with
/// [`MirrorError::UnknownEnumValue`].
///
/// ```
/// mirrorsync_core::mirrored_enum! {
///     /// A card suit.
///     pub enum Suit {
///         #[default]
///         Hearts,
///         Spades,
///     }
/// }
///
/// use mirrorsync_core::Leaf;
/// assert_eq!(Suit::Spades.to_value().as_text(), Some("Spades"));
/// assert_eq!(Suit::from_name("Hearts"), Some(Suit::Hearts));
/// ```
#[macro_export]
macro_rules! mirrored_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const VARIANTS: &'static [$name] = &[$($name::$variant),+];

            /// Name written on the wire.
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            /// Look a variant up by its wire name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl $crate::Leaf for $name {
            fn to_value(&self) -> $crate::Value {
                $crate::Value::Text(self.name().to_string())
            }

            fn from_value(value: &$crate::Value) -> $crate::MirrorResult<Self> {
                let name = value
                    .as_text()
                    .ok_or_else(|| $crate::MirrorError::type_mismatch("enum name", value))?;
                Self::from_name(name).ok_or_else(|| $crate::MirrorError::UnknownEnumValue {
                    enum_name: stringify!($name),
                    value: name.to_string(),
                })
            }
        }

        $crate::impl_leaf_node!($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mirrored;

    mirrored_enum! {
        enum Phase {
            #[default]
            Setup,
            Playing,
            Finished,
        }
    }

    #[test]
    fn integers_check_range() {
        assert_eq!(i8::from_value(&Value::Integer(-128)).unwrap(), -128);
        assert_eq!(
            u8::from_value(&Value::Integer(300)),
            Err(MirrorError::IntegerOutOfRange {
                value: 300,
                target: "u8"
            })
        );
        assert!(matches!(
            i32::from_value(&Value::Text("1".into())),
            Err(MirrorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn u64_keeps_high_values() {
        let big = u64::MAX - 5;
        assert_eq!(u64::from_value(&big.to_value()).unwrap(), big);
    }

    #[test]
    fn floats_accept_integers() {
        assert_eq!(f64::from_value(&Value::Integer(2)).unwrap(), 2.0);
        assert_eq!(f32::from_value(&Value::Float(0.5)).unwrap(), 0.5);
    }

    #[test]
    fn nan_travels_as_null() {
        assert_eq!(f64::NAN.to_value(), Value::Null);
        assert!(f64::from_value(&Value::Null).unwrap().is_nan());
        assert!(f32::from_value(&f32::NAN.to_value()).unwrap().is_nan());
        assert!(f64::NAN.content_equals(&-f64::NAN));
    }

    #[test]
    fn floats_compare_by_bits() {
        assert!(!0.0f64.content_equals(&-0.0));
        assert!(!0.0f32.content_equals(&-0.0));
        assert!(1.5f64.content_equals(&1.5));
        assert_eq!(
            f64::from_value(&(-0.0f64).to_value()).unwrap().to_bits(),
            (-0.0f64).to_bits()
        );
    }

    #[test]
    fn char_requires_one_character() {
        assert_eq!(char::from_value(&Value::from("x")).unwrap(), 'x');
        assert!(char::from_value(&Value::from("xy")).is_err());
    }

    #[test]
    fn enum_by_name() {
        assert_eq!(Phase::Playing.to_value(), Value::from("Playing"));
        assert_eq!(Phase::from_value(&Value::from("Finished")).unwrap(), Phase::Finished);
        assert_eq!(Phase::VARIANTS.len(), 3);
        assert_eq!(Phase::default(), Phase::Setup);
    }

    #[test]
    fn unknown_enum_name_is_fatal() {
        let err = Phase::from_value(&Value::from("Paused")).unwrap_err();
        assert_eq!(
            err,
            MirrorError::UnknownEnumValue {
                enum_name: "Phase",
                value: "Paused".into()
            }
        );
        assert!(err.is_version_skew());
    }

    #[test]
    fn leaf_contract() {
        let mut x = 5i32;
        assert!(!x.is_dirty());
        assert!(x.is_leaf());
        assert_eq!(x.write(true).unwrap(), Value::Integer(5));
        x.read(&Value::Integer(9)).unwrap();
        assert_eq!(x, 9);
        x.mark_clean();
        assert!(x.content_equals(&9));

        let mut s = String::new();
        Phase::Playing.describe(&mut s, 0);
        assert_eq!(s, "Playing");
    }
}
