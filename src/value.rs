// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The tagged-union value type stored inline in every FBX node.

use crate::error::{Error, Kind};
use crate::inflate;
use std::cell::RefCell;

/// How a typed array's payload is stored on disk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArrayEncoding {
    /// Raw little-endian elements, no compression.
    Raw,
    /// Zlib-wrapped DEFLATE; decoded length must equal `count * elem_size`.
    Deflate,
}

/// A typed array value. The payload is kept as a raw byte span and decoded
/// lazily; for `Deflate`-encoded arrays the decoded bytes are memoised the
/// first time any element is read.
pub struct TypedArray<T> {
    count: usize,
    encoding: ArrayEncoding,
    elem_size: usize,
    raw: Box<[u8]>,
    decoded: RefCell<Option<Box<[u8]>>>,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Clone for TypedArray<T> {
    fn clone(&self) -> Self {
        TypedArray {
            count: self.count,
            encoding: self.encoding,
            elem_size: self.elem_size,
            raw: self.raw.clone(),
            decoded: RefCell::new(self.decoded.borrow().clone()),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for TypedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TypedArray")
            .field("count", &self.count)
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl<T: Copy + FromLeBytes> TypedArray<T> {
    /// Wraps a raw (possibly compressed) byte span as a typed array.
    pub fn new(count: usize, encoding: ArrayEncoding, elem_size: usize, raw: Box<[u8]>) -> Self {
        TypedArray { count, encoding, elem_size, raw, decoded: RefCell::new(None), _marker: std::marker::PhantomData }
    }

    /// Number of elements in the array.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the array has zero elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn ensure_decoded(&self) -> Result<(), Error> {
        if self.decoded.borrow().is_some() {
            return Ok(());
        }
        let bytes = match self.encoding {
            ArrayEncoding::Raw => self.raw.clone(),
            ArrayEncoding::Deflate => {
                let want = self.count * self.elem_size;
                inflate::inflate_sized(&self.raw, want)?.into_boxed_slice()
            }
        };
        if bytes.len() != self.count * self.elem_size {
            return Err(Error::new(Kind::MalformedBinary));
        }
        *self.decoded.borrow_mut() = Some(bytes);
        Ok(())
    }

    /// Decodes (if necessary) and returns the array elements as a vector.
    pub fn to_vec(&self) -> Result<Vec<T>, Error> {
        self.ensure_decoded()?;
        let decoded = self.decoded.borrow();
        let bytes = decoded.as_ref().unwrap();
        Ok((0..self.count)
            .map(|i| T::from_le_bytes(&bytes[i * self.elem_size..(i + 1) * self.elem_size]))
            .collect())
    }

    /// Returns a single element without decoding the whole array twice on
    /// repeated calls (the decode is memoised).
    pub fn get(&self, index: usize) -> Result<T, Error> {
        if index >= self.count {
            return Err(Error::new(Kind::BadIndex));
        }
        self.ensure_decoded()?;
        let decoded = self.decoded.borrow();
        let bytes = decoded.as_ref().unwrap();
        Ok(T::from_le_bytes(&bytes[index * self.elem_size..(index + 1) * self.elem_size]))
    }
}

/// Converts a little-endian byte slice into a scalar. Implemented for the
/// primitive element types FBX typed arrays may hold.
pub trait FromLeBytes {
    /// Parses `bytes` (exactly `size_of::<Self>()` long) as a little-endian
    /// value of this type.
    fn from_le_bytes(bytes: &[u8]) -> Self;
}

macro_rules! impl_from_le_bytes {
    ($($t:ty),*) => {
        $(impl FromLeBytes for $t {
            fn from_le_bytes(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(bytes);
                <$t>::from_le_bytes(buf)
            }
        })*
    };
}
impl_from_le_bytes!(i8, i32, i64, f32, f64);

impl FromLeBytes for bool {
    fn from_le_bytes(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// A single value attached to a node, mirroring the FBX binary type codes.
///
/// Narrower integer widths (`bool`/`i8`/`i16`/`i32`) are widened to `i64`
/// at this layer and `f32` is widened to `f64`; the original width is not
/// retained here, matching the scope of this reader (no re-encoding).
#[derive(Debug)]
pub enum Value {
    /// `C`/`Y`/`I`/`L`: any integer scalar, widened to 64 bits.
    Int(i64),
    /// `F`/`D`: any floating scalar, widened to 64 bits.
    Float(f64),
    /// `S`: a string, not assumed to be valid UTF-8 at this layer.
    String(Box<[u8]>),
    /// `R`: an opaque binary blob.
    Blob(Box<[u8]>),
    /// `i`: typed array of 32-bit integers.
    ArrayI32(TypedArray<i32>),
    /// `l`: typed array of 64-bit integers.
    ArrayI64(TypedArray<i64>),
    /// `f`: typed array of 32-bit floats.
    ArrayF32(TypedArray<f32>),
    /// `d`: typed array of 64-bit floats.
    ArrayF64(TypedArray<f64>),
    /// `b`: typed array of booleans, one byte per element.
    ArrayBool(TypedArray<bool>),
    /// `c`: typed array of raw bytes (signed 8-bit).
    ArrayI8(TypedArray<i8>),
}

impl Value {
    /// Narrows to an `i64`, accepting any integer-scalar representation.
    pub fn as_i64(&self) -> Result<i64, Error> {
        match self {
            Value::Int(v) => Ok(*v),
            _ => Err(Error::new(Kind::BadValueType)),
        }
    }

    /// Narrows to an `i32`; fails if the value does not fit.
    pub fn as_i32(&self) -> Result<i32, Error> {
        let v = self.as_i64()?;
        i32::try_from(v).map_err(|_| Error::new(Kind::BadValueType))
    }

    /// Narrows to an `f64`, accepting either integer or float scalars (FBX
    /// frequently stores what are semantically floats as integers when the
    /// value happens to be whole, e.g. `0`).
    pub fn as_f64(&self) -> Result<f64, Error> {
        match self {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            _ => Err(Error::new(Kind::BadValueType)),
        }
    }

    /// Narrows to an `f32`.
    pub fn as_f32(&self) -> Result<f32, Error> {
        self.as_f64().map(|v| v as f32)
    }

    /// Narrows to a UTF-8 string. Binary blobs are not implicitly treated
    /// as strings; only `Value::String` is accepted.
    pub fn as_str(&self) -> Result<&str, Error> {
        match self {
            Value::String(bytes) => std::str::from_utf8(bytes).map_err(|_| Error::new(Kind::BadValueType)),
            _ => Err(Error::new(Kind::BadValueType)),
        }
    }

    /// Narrows to a raw byte blob; both `R` blobs and strings expose their
    /// bytes this way.
    pub fn as_bytes(&self) -> Result<&[u8], Error> {
        match self {
            Value::Blob(bytes) | Value::String(bytes) => Ok(bytes),
            _ => Err(Error::new(Kind::BadValueType)),
        }
    }

    /// Narrows to a bool; `0`/non-zero is accepted from any integer value.
    pub fn as_bool(&self) -> Result<bool, Error> {
        Ok(self.as_i64()? != 0)
    }
}
