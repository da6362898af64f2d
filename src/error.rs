// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

/// Sub-codes returned by the inflate (DEFLATE) decoder.
///
/// Numerically stable: callers may match on these values directly.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum InflateErrorKind {
    /// Ran out of input bits before the block finished.
    Truncated = -1,
    /// `CMF`/`FLG` header failed the `FCHECK` modulo-31 test.
    HeaderCheck = -3,
    /// Stored block `LEN` did not match the one's complement of `NLEN`.
    StoredBlockLength = -4,
    /// Unknown `BTYPE` value (`0b11`).
    BadBlockType = -7,
    /// Huffman code length alphabet failed to build a canonical tree.
    BadCodeLengthHuffman = -8,
    /// A decoded symbol extended the output past the literal/length alphabet.
    LiteralOverflow = -10,
    /// A decoded distance code referenced a distance not yet produced.
    BadDistance = -11,
    /// The dynamic literal/length Huffman tree was over- or under-subscribed.
    BadLiteralHuffman = -22,
    /// The dynamic distance Huffman tree was over- or under-subscribed.
    BadDistanceHuffman = -23,
    /// `FDICT` was set; preset dictionaries are not supported.
    PresetDictionary = -30,
    /// Adler-32 checksum at the end of the stream did not match.
    ChecksumMismatch = -31,
}

impl fmt::Display for InflateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match *self {
            InflateErrorKind::Truncated => "truncated deflate stream",
            InflateErrorKind::HeaderCheck => "zlib header failed FCHECK",
            InflateErrorKind::StoredBlockLength => "stored block LEN/NLEN mismatch",
            InflateErrorKind::BadBlockType => "invalid deflate block type",
            InflateErrorKind::BadCodeLengthHuffman => "invalid code-length Huffman tree",
            InflateErrorKind::LiteralOverflow => "invalid literal/length symbol",
            InflateErrorKind::BadDistance => "distance exceeds produced output",
            InflateErrorKind::BadLiteralHuffman => "invalid literal/length Huffman tree",
            InflateErrorKind::BadDistanceHuffman => "invalid distance Huffman tree",
            InflateErrorKind::PresetDictionary => "preset dictionaries are unsupported",
            InflateErrorKind::ChecksumMismatch => "adler-32 checksum mismatch",
        };
        f.write_str(msg)
    }
}

/// A bounded stack of node names recording the DOM path where a failure
/// occurred. Only the innermost `MAX_DEPTH` names are kept; this keeps
/// error values cheap to construct even for deeply nested scenes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DomPath(Vec<String>);

const MAX_DEPTH: usize = 32;

impl DomPath {
    /// Constructs an empty path.
    pub fn new() -> Self {
        DomPath(Vec::new())
    }

    /// Pushes a node name onto the path.
    pub fn push(&mut self, name: &str) {
        if self.0.len() < MAX_DEPTH {
            self.0.push(name.to_string());
        }
    }

    /// Pops the most recently pushed node name.
    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// Returns the path components, root first.
    pub fn components(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for DomPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// The closed set of ways a load can fail.
#[derive(Debug)]
pub enum Kind {
    /// The requested file does not exist.
    FileNotFound,
    /// The input contained zero bytes.
    EmptyFile,
    /// A referenced external file (texture content, cache payload) could
    /// not be found.
    ExternalFileNotFound(String),
    /// Binary envelope magic bytes did not match `Kaydara FBX Binary  `.
    BadMagic,
    /// The file version is outside the supported range.
    UnsupportedVersion(u32),
    /// The stream ended before a complete record could be read.
    Truncated,
    /// The ASCII dialect could not be lexed.
    MalformedAscii {
        /// Byte offset into the source at which lexing failed.
        offset: usize,
    },
    /// The binary dialect's node tree was structurally invalid.
    MalformedBinary,
    /// A typed array payload failed to inflate.
    Deflate(InflateErrorKind),
    /// A value was requested as a type it cannot be narrowed to.
    BadValueType,
    /// The parent/child node graph contains a cycle.
    NodeCycle,
    /// A connection, template, or clip referenced an object that does not
    /// exist in the scene.
    MissingObject(u64),
    /// Two objects declared the same id.
    DuplicateObjectId(u64),
    /// An index (e.g. a polygon vertex index) was out of bounds.
    BadIndex,
    /// The allocation-count limit for an allocator was exceeded.
    AllocationLimit,
    /// A byte-count memory limit was exceeded.
    MemoryLimit,
    /// The load was aborted by the progress callback.
    Cancelled,
    /// An I/O error occurred on the byte source.
    Io(String),
    /// Any other failure.
    Unknown(String),
}

/// An error encountered while loading an FBX scene.
#[derive(Debug)]
pub struct Error {
    kind: Kind,
    path: DomPath,
}

impl Error {
    /// Constructs an error with an empty DOM path.
    pub fn new(kind: Kind) -> Self {
        Error { kind, path: DomPath::new() }
    }

    /// Constructs an error already carrying a DOM path.
    pub fn with_path(kind: Kind, path: DomPath) -> Self {
        Error { kind, path }
    }

    /// The error's kind.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The DOM path at which the error occurred, innermost node last.
    pub fn path(&self) -> &DomPath {
        &self.path
    }

    /// Attaches (or extends) a DOM path onto this error. Used by the
    /// tokenizer as it unwinds out of `enter`/`leave` pairs.
    pub fn push_path(mut self, name: &str) -> Self {
        self.path.push(name);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            Kind::FileNotFound => write!(f, "file not found"),
            Kind::EmptyFile => write!(f, "empty file"),
            Kind::ExternalFileNotFound(uri) => write!(f, "external file not found: {}", uri),
            Kind::BadMagic => write!(f, "not an FBX file (bad magic)"),
            Kind::UnsupportedVersion(v) => write!(f, "unsupported FBX version {}", v),
            Kind::Truncated => write!(f, "truncated input"),
            Kind::MalformedAscii { offset } => write!(f, "malformed ASCII FBX at byte {}", offset),
            Kind::MalformedBinary => write!(f, "malformed binary FBX"),
            Kind::Deflate(sub) => write!(f, "deflate error: {} ({})", sub, *sub as i32),
            Kind::BadValueType => write!(f, "value has an incompatible type"),
            Kind::NodeCycle => write!(f, "node parent graph contains a cycle"),
            Kind::MissingObject(id) => write!(f, "connection references missing object {}", id),
            Kind::DuplicateObjectId(id) => write!(f, "duplicate object id {}", id),
            Kind::BadIndex => write!(f, "index out of bounds"),
            Kind::AllocationLimit => write!(f, "allocator exceeded its allocation-count limit"),
            Kind::MemoryLimit => write!(f, "allocator exceeded its memory limit"),
            Kind::Cancelled => write!(f, "load cancelled by progress callback"),
            Kind::Io(msg) => write!(f, "i/o error: {}", msg),
            Kind::Unknown(msg) => write!(f, "{}", msg),
        }?;
        if !self.path.components().is_empty() {
            write!(f, " (at {})", self.path)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(Kind::Io(e.to_string()))
    }
}
