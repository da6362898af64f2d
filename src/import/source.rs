// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Byte sources (L0): in-memory span, a generic `Read` stream, or a file
//! opened by path. Mirrors the teacher's own `Source` customization
//! point, synchronous rather than futures-based.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// A byte-providing source for the loader. `skip` has a default
/// implementation synthesised from `read`; implementors that can seek
/// should override it.
pub trait Source {
    /// Writes up to `buf.len()` bytes into `buf`, returning the number
    /// written. Returns `Ok(0)` only on clean end-of-stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Advances the stream by `n` bytes without materialising them.
    fn skip(&mut self, n: u64) -> io::Result<()> {
        let mut remaining = n;
        let mut scratch = [0u8; 4096];
        while remaining > 0 {
            let want = remaining.min(scratch.len() as u64) as usize;
            let got = self.read(&mut scratch[..want])?;
            if got == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "skip past end of stream"));
            }
            remaining -= got as u64;
        }
        Ok(())
    }

    /// Total byte length, if known up front.
    fn size(&self) -> Option<u64> {
        None
    }
}

/// A zero-copy source over an in-memory byte span.
pub struct Memory<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Memory<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Memory { data, pos: 0 }
    }

    pub fn as_slice(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}

impl<'a> Source for Memory<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn skip(&mut self, n: u64) -> io::Result<()> {
        self.pos = (self.pos as u64 + n).min(self.data.len() as u64) as usize;
        Ok(())
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// Wraps any `std::io::Read` as a [`Source`].
pub struct Stream<R> {
    inner: R,
}

impl<R: Read> Stream<R> {
    pub fn new(inner: R) -> Self {
        Stream { inner }
    }
}

impl<R: Read> Source for Stream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Opens a file by path, buffered with the loader's configured readahead.
pub struct FromPath {
    reader: BufReader<File>,
    size: u64,
}

impl FromPath {
    pub fn open<P: AsRef<Path>>(path: P, buffer_size: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(FromPath { reader: BufReader::with_capacity(buffer_size.max(4096), file), size })
    }
}

impl Source for FromPath {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    fn size(&self) -> Option<u64> {
        Some(self.size)
    }
}

/// Resolves an externally referenced file (embedded texture, cache
/// payload, ...) relative to the file that referenced it. If absent,
/// such references are simply left unloaded.
pub trait OpenFile {
    fn open(&mut self, relative: &str) -> io::Result<Vec<u8>>;
}

/// The trivial [`OpenFile`] that resolves paths relative to a base
/// directory on the local filesystem.
pub struct OpenFromDir {
    base: PathBuf,
}

impl OpenFromDir {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        OpenFromDir { base: base.as_ref().to_path_buf() }
    }
}

impl OpenFile for OpenFromDir {
    fn open(&mut self, relative: &str) -> io::Result<Vec<u8>> {
        let path = self.base.join(relative);
        std::fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_reads_and_skips() {
        let mut src = Memory::new(b"hello world");
        let mut buf = [0u8; 5];
        assert_eq!(src.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        src.skip(1).unwrap();
        let mut rest = [0u8; 5];
        assert_eq!(src.read(&mut rest).unwrap(), 5);
        assert_eq!(&rest, b"world");
    }

    #[test]
    fn memory_source_reports_size() {
        let src = Memory::new(b"abc");
        assert_eq!(src.size(), Some(3));
    }

    #[test]
    fn skip_past_end_is_an_error() {
        let mut src = Memory::new(b"ab");
        assert!(src.skip(10).is_err());
    }
}
