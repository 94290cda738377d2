//! Typed elements of packed and numeric arrays.
//!
//! Array payloads are written in native byte order, element after element. Reading goes
//! through [`ArrayElement::read_ne`] one element at a time, so views into a decoded buffer
//! never need to be aligned.
use nalgebra::Complex;

use crate::encoding::magic::ArrayElementType;

mod sealed {
    pub trait Sealed {}
}

/// A machine number that can be stored in a numeric array.
pub trait ArrayElement: Copy + sealed::Sealed {
    /// Element type byte written in the array header.
    const ELEMENT_TYPE: ArrayElementType;

    /// Append the native-order bytes of `self` to `out`.
    fn write_ne(&self, out: &mut Vec<u8>);

    /// Read one element from exactly `ELEMENT_TYPE.size()` bytes.
    fn read_ne(bytes: &[u8]) -> Self;
}

/// Marker for element types that packed arrays accept (no unsigned integers).
pub trait PackedArrayElement: ArrayElement {}

macro_rules! impl_array_element {
    (@packed $ty:ty, true) => {
        impl PackedArrayElement for $ty {}
    };
    (@packed $ty:ty, false) => {};
    ($($ty:ty => $variant:ident, packed = $packed:tt;)*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl ArrayElement for $ty {
                const ELEMENT_TYPE: ArrayElementType = ArrayElementType::$variant;

                #[inline]
                fn write_ne(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_ne_bytes());
                }

                #[inline]
                fn read_ne(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }
            }

            impl_array_element!(@packed $ty, $packed);
        )*
    };
}

impl_array_element! {
    i8 => Integer8, packed = true;
    i16 => Integer16, packed = true;
    i32 => Integer32, packed = true;
    i64 => Integer64, packed = true;
    u8 => UnsignedInteger8, packed = false;
    u16 => UnsignedInteger16, packed = false;
    u32 => UnsignedInteger32, packed = false;
    u64 => UnsignedInteger64, packed = false;
    f32 => Real32, packed = true;
    f64 => Real64, packed = true;
}

macro_rules! impl_complex_element {
    ($($component:ty => $variant:ident;)*) => {
        $(
            impl sealed::Sealed for Complex<$component> {}

            impl ArrayElement for Complex<$component> {
                const ELEMENT_TYPE: ArrayElementType = ArrayElementType::$variant;

                #[inline]
                fn write_ne(&self, out: &mut Vec<u8>) {
                    self.re.write_ne(out);
                    self.im.write_ne(out);
                }

                #[inline]
                fn read_ne(bytes: &[u8]) -> Self {
                    let (re, im) = bytes.split_at(bytes.len() / 2);
                    Complex::new(<$component>::read_ne(re), <$component>::read_ne(im))
                }
            }

            impl PackedArrayElement for Complex<$component> {}
        )*
    };
}

impl_complex_element! {
    f32 => ComplexReal32;
    f64 => ComplexReal64;
}

/// Flatten `data` into native-order bytes.
pub fn to_ne_bytes<T: ArrayElement>(data: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * T::ELEMENT_TYPE.size());
    for value in data {
        value.write_ne(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_type_sizes_match_rust_types() {
        fn check<T: ArrayElement>() {
            assert_eq!(T::ELEMENT_TYPE.size(), std::mem::size_of::<T>());
        }
        check::<i8>();
        check::<i16>();
        check::<i32>();
        check::<i64>();
        check::<u8>();
        check::<u16>();
        check::<u32>();
        check::<u64>();
        check::<f32>();
        check::<f64>();
        check::<Complex<f32>>();
        check::<Complex<f64>>();
    }

    #[test]
    fn complex_is_real_then_imaginary() {
        let bytes = to_ne_bytes(&[Complex::new(1.5f32, -2.0f32)]);
        assert_eq!(&bytes[..4], &1.5f32.to_ne_bytes());
        assert_eq!(&bytes[4..], &(-2.0f32).to_ne_bytes());
        assert_eq!(
            Complex::<f32>::read_ne(&bytes),
            Complex::new(1.5f32, -2.0f32)
        );
    }

    #[test]
    fn unaligned_reads() {
        let mut bytes = vec![0xAA];
        bytes.extend_from_slice(&to_ne_bytes(&[-7i32, 9i32]));
        let view = &bytes[1..];
        assert_eq!(i32::read_ne(&view[..4]), -7);
        assert_eq!(i32::read_ne(&view[4..]), 9);
    }
}
