// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The length-prefixed binary node tokenizer (L3).
//!
//! Every node record opens with three fixed-width fields (32-bit before
//! FBX 7500, 64-bit from 7500 on): `end_offset`, `num_values`, and
//! `values_length`, followed by a one-byte name length and the name
//! itself. A terminator record with every field zero marks the end of a
//! child list. See `<https://code.blender.org/2013/08/fbx-binary-file-format-specification/>`.

use crate::dom::{Document, Node};
use crate::error::{Error, Kind};
use crate::value::{ArrayEncoding, TypedArray, Value};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

/// The binary envelope magic that precedes the version field.
pub const MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \0";
const MAGIC_TAIL: [u8; 2] = [0x1a, 0x00];

const VERSION_7500: u32 = 7500;
const NULL_RECORD_LEN_PRE_7500: u64 = 13;
const NULL_RECORD_LEN_7500: u64 = 25;

/// Returns `true` if `data` begins with the binary FBX magic sequence.
pub fn has_binary_magic(data: &[u8]) -> bool {
    data.len() >= MAGIC.len() + 2
        && &data[..MAGIC.len()] == &MAGIC[..]
        && data[MAGIC.len()..MAGIC.len() + 2] == MAGIC_TAIL
}

struct Reader<'a> {
    cursor: std::io::Cursor<&'a [u8]>,
    wide: bool,
}

impl<'a> Reader<'a> {
    fn pos(&self) -> u64 {
        self.cursor.position()
    }

    fn offset_field(&mut self) -> Result<u64, Error> {
        if self.wide {
            Ok(self.cursor.read_u64::<LittleEndian>()?)
        } else {
            Ok(self.cursor.read_u32::<LittleEndian>()? as u64)
        }
    }

    fn read_scalar(&mut self, type_code: u8) -> Result<Value, Error> {
        Ok(match type_code {
            b'C' => Value::Int(self.cursor.read_u8()? as i64),
            b'Y' => Value::Int(self.cursor.read_i16::<LittleEndian>()? as i64),
            b'I' => Value::Int(self.cursor.read_i32::<LittleEndian>()? as i64),
            b'L' => Value::Int(self.cursor.read_i64::<LittleEndian>()?),
            b'F' => Value::Float(self.cursor.read_f32::<LittleEndian>()? as f64),
            b'D' => Value::Float(self.cursor.read_f64::<LittleEndian>()?),
            _ => return Err(Error::new(Kind::MalformedBinary)),
        })
    }

    fn read_array_header(&mut self) -> Result<(usize, ArrayEncoding, usize), Error> {
        let count = self.cursor.read_u32::<LittleEndian>()? as usize;
        let encoding = match self.cursor.read_u32::<LittleEndian>()? {
            0 => ArrayEncoding::Raw,
            1 => ArrayEncoding::Deflate,
            _ => return Err(Error::new(Kind::MalformedBinary)),
        };
        let compressed_len = self.cursor.read_u32::<LittleEndian>()? as usize;
        Ok((count, encoding, compressed_len))
    }

    fn read_array_bytes(&mut self, byte_len: usize) -> Result<Box<[u8]>, Error> {
        let mut buf = vec![0u8; byte_len];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf.into_boxed_slice())
    }

    fn read_array_value(&mut self, type_code: u8) -> Result<Value, Error> {
        let (count, encoding, payload_len) = self.read_array_header()?;
        let elem_size = match type_code {
            b'b' | b'c' => 1,
            b'i' | b'f' => 4,
            b'l' | b'd' => 8,
            _ => return Err(Error::new(Kind::MalformedBinary)),
        };
        let raw = self.read_array_bytes(payload_len)?;
        Ok(match type_code {
            b'i' => Value::ArrayI32(TypedArray::new(count, encoding, elem_size, raw)),
            b'l' => Value::ArrayI64(TypedArray::new(count, encoding, elem_size, raw)),
            b'f' => Value::ArrayF32(TypedArray::new(count, encoding, elem_size, raw)),
            b'd' => Value::ArrayF64(TypedArray::new(count, encoding, elem_size, raw)),
            b'b' => Value::ArrayBool(TypedArray::new(count, encoding, elem_size, raw)),
            b'c' => Value::ArrayI8(TypedArray::new(count, encoding, elem_size, raw)),
            _ => unreachable!(),
        })
    }

    fn read_string_or_blob(&mut self, is_string: bool) -> Result<Value, Error> {
        let len = self.cursor.read_u32::<LittleEndian>()? as usize;
        let bytes = self.read_array_bytes(len)?;
        Ok(if is_string { Value::String(bytes) } else { Value::Blob(bytes) })
    }

    fn read_value(&mut self, type_code: u8) -> Result<Value, Error> {
        match type_code {
            b'C' | b'Y' | b'I' | b'L' | b'F' | b'D' => self.read_scalar(type_code),
            b'i' | b'l' | b'f' | b'd' | b'b' | b'c' => self.read_array_value(type_code),
            b'S' => self.read_string_or_blob(true),
            b'R' => self.read_string_or_blob(false),
            other => Err(Error::new(Kind::MalformedBinary).push_path(&format!("<type 0x{:02x}>", other))),
        }
    }

    fn null_record_len(&self) -> u64 {
        if self.wide { NULL_RECORD_LEN_7500 } else { NULL_RECORD_LEN_PRE_7500 }
    }

    /// Reads one node record. Returns `None` on the all-zero terminator.
    fn read_node(&mut self) -> Result<Option<Node>, Error> {
        let end_offset = self.offset_field()?;
        if end_offset == 0 {
            // Terminator: the remaining num_values/values_length/name_len
            // fields are zero by construction; consume them to stay in sync.
            let remaining = self.null_record_len() - if self.wide { 8 } else { 4 };
            let mut buf = vec![0u8; remaining as usize];
            self.cursor.read_exact(&mut buf)?;
            return Ok(None);
        }
        let num_values = self.offset_field()? as usize;
        let _values_length = self.offset_field()?;
        let name_len = self.cursor.read_u8()? as usize;
        if name_len > 255 {
            return Err(Error::new(Kind::MalformedBinary));
        }
        let mut name_bytes = vec![0u8; name_len];
        self.cursor.read_exact(&mut name_bytes)?;
        let name = String::from_utf8_lossy(&name_bytes).into_owned().into_boxed_str();

        let mut values = Vec::with_capacity(num_values);
        for _ in 0..num_values {
            let type_code = self.cursor.read_u8()?;
            let value = self.read_value(type_code).map_err(|e| e.push_path(&name))?;
            values.push(value);
        }

        let mut children = Vec::new();
        let null_len = self.null_record_len();
        if self.pos() < end_offset {
            while self.pos() < end_offset.saturating_sub(null_len) {
                match self.read_node().map_err(|e| e.push_path(&name))? {
                    Some(child) => children.push(child),
                    None => break,
                }
            }
            if self.pos() != end_offset {
                // Tolerate trailing padding some exporters leave behind, but
                // never allow reads to run past the declared end.
                if self.pos() > end_offset {
                    return Err(Error::new(Kind::MalformedBinary).push_path(&name));
                }
                self.cursor.set_position(end_offset);
            }
        }

        Ok(Some(Node::new(name, values, children)))
    }
}

/// Parses a length-prefixed binary FBX byte stream (including the
/// `Kaydara FBX Binary  ` envelope) into a [`Document`].
pub fn parse(data: &[u8]) -> Result<Document, Error> {
    if data.is_empty() {
        return Err(Error::new(Kind::EmptyFile));
    }
    if !has_binary_magic(data) {
        return Err(Error::new(Kind::BadMagic));
    }
    let mut cursor = std::io::Cursor::new(data);
    cursor.set_position(MAGIC.len() as u64 + 2);
    let version = cursor.read_u32::<LittleEndian>()?;

    let mut reader = Reader { cursor, wide: version >= VERSION_7500 };
    let mut top_level = Vec::new();
    let data_len = data.len() as u64;
    while reader.pos() + 4 < data_len {
        match reader.read_node()? {
            Some(node) => top_level.push(node),
            None => break,
        }
    }
    let root = Node::new("".into(), Vec::new(), top_level);
    Ok(Document::new(version, root))
}

/// Encodes a node list as a minimal binary FBX envelope: magic, version,
/// the nodes themselves, and a zero-filled terminator record. Used by
/// tests and by tooling that wants to re-serialise an ASCII file into the
/// binary dialect; the main load pipeline never calls this.
pub fn encode_minimal(version: u32, nodes: &[Node]) -> Vec<u8> {
    let wide = version >= VERSION_7500;
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&MAGIC_TAIL);
    out.extend_from_slice(&version.to_le_bytes());
    for node in nodes {
        encode_node(node, wide, &mut out);
    }
    write_offset(&mut out, 0, wide);
    if wide {
        out.extend_from_slice(&[0u8; NULL_RECORD_LEN_7500 as usize - 8]);
    } else {
        out.extend_from_slice(&[0u8; NULL_RECORD_LEN_PRE_7500 as usize - 4]);
    }
    out
}

fn write_offset(out: &mut Vec<u8>, value: u64, wide: bool) {
    if wide {
        out.extend_from_slice(&value.to_le_bytes());
    } else {
        out.extend_from_slice(&(value as u32).to_le_bytes());
    }
}

fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(v) => {
            out.push(b'L');
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::Float(v) => {
            out.push(b'D');
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::String(bytes) => {
            out.push(b'S');
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        Value::Blob(bytes) => {
            out.push(b'R');
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        // Re-encoding arrays is out of scope for this minimal writer; the
        // loader never round-trips compressed arrays back to disk.
        Value::ArrayI32(_) | Value::ArrayI64(_) | Value::ArrayF32(_) | Value::ArrayF64(_)
        | Value::ArrayBool(_) | Value::ArrayI8(_) => {}
    }
}

fn encode_node(node: &Node, wide: bool, out: &mut Vec<u8>) {
    let end_offset_pos = out.len();
    write_offset(out, 0, wide); // patched below
    write_offset(out, node.values().len() as u64, wide);
    let values_length_pos = out.len();
    write_offset(out, 0, wide); // patched below
    out.push(node.name().len() as u8);
    out.extend_from_slice(node.name().as_bytes());
    let values_start = out.len();
    for value in node.values() {
        encode_value(value, out);
    }
    let values_length = (out.len() - values_start) as u64;

    for child in node.children() {
        encode_node(child, wide, out);
    }
    if !node.children().is_empty() {
        write_offset(out, 0, wide);
        let pad = if wide { NULL_RECORD_LEN_7500 - 8 } else { NULL_RECORD_LEN_PRE_7500 - 4 };
        out.extend(std::iter::repeat(0u8).take(pad as usize));
    }

    let end_offset = out.len() as u64;
    patch_offset(out, end_offset_pos, end_offset, wide);
    patch_offset(out, values_length_pos, values_length, wide);
}

fn patch_offset(out: &mut [u8], pos: usize, value: u64, wide: bool) {
    if wide {
        out[pos..pos + 8].copy_from_slice(&value.to_le_bytes());
    } else {
        out[pos..pos + 4].copy_from_slice(&(value as u32).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_rejected() {
        let err = parse(&[]).unwrap_err();
        assert!(matches!(err.kind(), Kind::EmptyFile));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let err = parse(b"not an fbx file at all..........").unwrap_err();
        assert!(matches!(err.kind(), Kind::BadMagic));
    }

    #[test]
    fn magic_bytes_are_exact() {
        assert_eq!(&MAGIC[..], b"Kaydara FBX Binary  \0");
    }

    #[test]
    fn encode_minimal_envelope_is_byte_exact() {
        let doc = crate::ascii::parse(b"Node: 1 {Sub:2,3}").unwrap();
        let bytes = encode_minimal(7400, doc.root().children());
        assert_eq!(&bytes[0..21], b"Kaydara FBX Binary  \0");
        assert_eq!(&bytes[21..23], &[0x1a, 0x00]);
        assert_eq!(u32::from_le_bytes(bytes[23..27].try_into().unwrap()), 7400);
        let terminator_start = bytes.len() - NULL_RECORD_LEN_PRE_7500 as usize;
        assert!(bytes[terminator_start..].iter().all(|&b| b == 0));
    }

    #[test]
    fn encoded_minimal_round_trips_through_parse() {
        let ascii_doc = crate::ascii::parse(b"Node: 1 {Sub:2,3}").unwrap();
        let mut bytes = encode_minimal(7400, ascii_doc.root().children());
        bytes.extend_from_slice(&[0u8; 4]);
        let doc = parse(&bytes).unwrap();
        assert_eq!(doc.version(), 7400);
        let nodes = doc.root().children();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name(), "Node");
        let sub = nodes[0].child("Sub").unwrap();
        assert_eq!(sub.value(0).unwrap().as_i64().unwrap(), 2);
        assert_eq!(sub.value(1).unwrap().as_i64().unwrap(), 3);
    }
}
