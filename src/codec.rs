use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::io::{Read, Write};

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::order::cmp_text_keys;
use crate::{CborError, ErrorCode};

/// Encode a value into canonical CBOR using the streaming encoder.
pub trait CborEncode {
    /// Encode `self` into the provided encoder.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound is exceeded or the sink fails.
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError>;
}

/// Decode a value from a streaming decoder.
pub trait CborDecode: Sized {
    /// Decode `Self` from a streaming decoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the CBOR value does not match the expected type, is not canonical, or
    /// violates a bound.
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError>;
}

/// Marker trait for values that can appear as CBOR array elements.
///
/// `u8` deliberately does not implement it, so `Vec<u8>` and `[u8; N]` encode as byte strings
/// while `Vec<T>` and `[T; N]` encode as arrays.
pub trait CborArrayElem {}

/// Encode a value into a fresh buffer.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_to_vec<T: CborEncode + ?Sized>(value: &T) -> Result<Vec<u8>, CborError> {
    let mut enc = Encoder::new();
    value.encode(&mut enc)?;
    Ok(enc.into_vec())
}

/// Encode a value into `writer`, returning the number of bytes written.
///
/// # Errors
///
/// Returns an error if encoding fails or the writer fails.
pub fn encode_into<W: Write, T: CborEncode + ?Sized>(
    writer: W,
    value: &T,
) -> Result<u64, CborError> {
    let mut enc = Encoder::from_writer(writer);
    value.encode(&mut enc)?;
    Ok(enc.position())
}

/// Decode exactly one value occupying all of `bytes`.
///
/// # Errors
///
/// Returns `TrailingBytes` if input remains after the value, or any decode error.
pub fn decode_from_slice<T: CborDecode>(bytes: &[u8]) -> Result<T, CborError> {
    let mut dec = Decoder::from_slice(bytes);
    let value = T::decode(&mut dec)?;
    if !dec.is_at_end()? {
        return Err(CborError::new(ErrorCode::TrailingBytes, dec.position()));
    }
    Ok(value)
}

/// Decode one value from `reader`, returning it with the number of bytes consumed.
///
/// Nothing past the value is read.
///
/// # Errors
///
/// Returns any decode error.
pub fn decode_from_reader<R: Read, T: CborDecode>(reader: R) -> Result<(T, u64), CborError> {
    let mut dec = Decoder::new(reader);
    let value = T::decode(&mut dec)?;
    Ok((value, dec.position()))
}

impl CborEncode for bool {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        enc.bool(*self)
    }
}

impl CborDecode for bool {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        dec.read_bool()
    }
}

macro_rules! uint_codec {
    ($($t:ty),*) => {$(
        impl CborEncode for $t {
            fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
                let v = u64::try_from(*self).map_err(|_| enc.err(ErrorCode::Overflow))?;
                enc.uint(v)
            }
        }

        impl CborDecode for $t {
            fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
                let off = dec.position();
                let v = dec.read_uint()?;
                Self::try_from(v).map_err(|_| CborError::new(ErrorCode::Overflow, off))
            }
        }
    )*};
}

macro_rules! int_codec {
    ($($t:ty),*) => {$(
        impl CborEncode for $t {
            fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
                let v = i64::try_from(*self).map_err(|_| enc.err(ErrorCode::Overflow))?;
                enc.int(v)
            }
        }

        impl CborDecode for $t {
            fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
                let off = dec.position();
                let v = dec.read_int()?;
                Self::try_from(v).map_err(|_| CborError::new(ErrorCode::Overflow, off))
            }
        }

        impl CborArrayElem for $t {}
    )*};
}

uint_codec!(u8, u16, u32, u64, usize);
int_codec!(i8, i16, i32, i64, isize);

impl CborArrayElem for bool {}
impl CborArrayElem for u16 {}
impl CborArrayElem for u32 {}
impl CborArrayElem for u64 {}
impl CborArrayElem for usize {}

impl CborEncode for str {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        enc.text(self)
    }
}

impl CborEncode for String {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        enc.text(self)
    }
}

impl CborDecode for String {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        dec.read_text()
    }
}

impl CborArrayElem for String {}

impl CborEncode for [u8] {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        enc.bytes(self)
    }
}

impl CborEncode for Vec<u8> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        enc.bytes(self)
    }
}

impl CborDecode for Vec<u8> {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        dec.read_bytes()
    }
}

impl<const N: usize> CborEncode for [u8; N] {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        enc.bytes(self)
    }
}

impl<const N: usize> CborDecode for [u8; N] {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        dec.read_byte_array::<N>()
    }
}

impl<T: CborEncode + CborArrayElem> CborEncode for Vec<T> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        enc.array(self.len(), |a| {
            for item in self {
                a.value(item)?;
            }
            Ok(())
        })
    }
}

impl<T: CborDecode + CborArrayElem> CborDecode for Vec<T> {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        let len = dec.read_array_len()?;
        let mut out = Self::with_capacity(len);
        for _ in 0..len {
            out.push(T::decode(dec)?);
        }
        Ok(out)
    }
}

impl<T: CborEncode + CborArrayElem, const N: usize> CborEncode for [T; N] {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        enc.array(N, |a| {
            for item in self {
                a.value(item)?;
            }
            Ok(())
        })
    }
}

impl<T: CborDecode + CborArrayElem, const N: usize> CborDecode for [T; N] {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        let off = dec.position();
        let len = dec.read_array_len()?;
        if len != N {
            return Err(CborError::new(ErrorCode::ArityMismatch, off));
        }
        let mut out = Vec::with_capacity(N);
        for _ in 0..N {
            out.push(T::decode(dec)?);
        }
        out.try_into()
            .map_err(|_| CborError::new(ErrorCode::ArityMismatch, off))
    }
}

impl<T> CborArrayElem for Vec<T> {}
impl<T, const N: usize> CborArrayElem for [T; N] {}

impl<T: CborEncode> CborEncode for Option<T> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        match self {
            Some(v) => v.encode(enc),
            None => enc.null(),
        }
    }
}

impl<T: CborDecode> CborDecode for Option<T> {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        if dec.take_null()? {
            return Ok(None);
        }
        T::decode(dec).map(Some)
    }
}

impl<T: CborArrayElem> CborArrayElem for Option<T> {}

impl<T: CborEncode + ?Sized> CborEncode for Box<T> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        (**self).encode(enc)
    }
}

impl<T: CborDecode> CborDecode for Box<T> {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        T::decode(dec).map(Self::new)
    }
}

impl<T: CborArrayElem + ?Sized> CborArrayElem for Box<T> {}

impl<T: CborEncode + ?Sized> CborEncode for &T {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        (**self).encode(enc)
    }
}

fn encode_sorted_entries<'a, W, V, I>(
    enc: &mut Encoder<W>,
    len: usize,
    entries: I,
) -> Result<(), CborError>
where
    W: Write,
    V: CborEncode + 'a,
    I: Iterator<Item = (&'a String, &'a V)>,
{
    let mut sorted: Vec<(&String, &V)> = entries.collect();
    sorted.sort_by(|a, b| cmp_text_keys(a.0, b.0));
    enc.map(len, |m| {
        for (k, v) in sorted {
            m.value(k, v)?;
        }
        Ok(())
    })
}

impl<V: CborEncode> CborEncode for BTreeMap<String, V> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        encode_sorted_entries(enc, self.len(), self.iter())
    }
}

impl<V: CborDecode> CborDecode for BTreeMap<String, V> {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        let len = dec.read_map_len()?;
        let mut out = Self::new();
        for _ in 0..len {
            let key = dec.read_text()?;
            let value = V::decode(dec)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

impl<V: CborEncode, S: BuildHasher> CborEncode for HashMap<String, V, S> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        encode_sorted_entries(enc, self.len(), self.iter())
    }
}

impl<V: CborDecode, S: BuildHasher + Default> CborDecode for HashMap<String, V, S> {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        let len = dec.read_map_len()?;
        let mut out = Self::with_capacity_and_hasher(len, S::default());
        for _ in 0..len {
            let key = dec.read_text()?;
            let value = V::decode(dec)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

impl<K: Ord, V> CborArrayElem for BTreeMap<K, V> {}
impl<K: Hash + Eq, V, S> CborArrayElem for HashMap<K, V, S> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_width_overflow() {
        let err = decode_from_slice::<u8>(&[0x19, 0x01, 0x00]).unwrap_err();
        assert_eq!(err.code, ErrorCode::Overflow);
        let err = decode_from_slice::<u8>(&[0x20]).unwrap_err();
        assert_eq!(err.code, ErrorCode::WrongMajorType);
    }

    #[test]
    fn signed_width_overflow() {
        assert_eq!(decode_from_slice::<i8>(&[0x38, 0x7f]).unwrap(), -128);
        let err = decode_from_slice::<i8>(&[0x38, 0x80]).unwrap_err();
        assert_eq!(err.code, ErrorCode::Overflow);
    }

    #[test]
    fn byte_vectors_are_byte_strings() {
        assert_eq!(encode_to_vec(&vec![1u8, 2]).unwrap(), vec![0x42, 1, 2]);
        assert_eq!(encode_to_vec(&vec![1u16, 2]).unwrap(), vec![0x82, 1, 2]);
    }

    #[test]
    fn fixed_arrays_require_exact_length() {
        let err = decode_from_slice::<[u8; 3]>(&[0x42, 1, 2]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ArityMismatch);
        let err = decode_from_slice::<[u32; 1]>(&[0x82, 1, 2]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ArityMismatch);
        assert_eq!(decode_from_slice::<[u32; 2]>(&[0x82, 1, 2]).unwrap(), [1, 2]);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = decode_from_slice::<u8>(&[0x01, 0x02]).unwrap_err();
        assert_eq!(err.code, ErrorCode::TrailingBytes);
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn duplicate_map_keys_keep_last_value() {
        let bytes = [0xa2, 0x61, b'a', 0x01, 0x61, b'a', 0x02];
        let map: BTreeMap<String, u8> = decode_from_slice(&bytes).unwrap();
        assert_eq!(map.get("a"), Some(&2));
    }
}
