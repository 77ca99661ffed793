// Copyright 2022 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Module for input source handling.

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;

use super::error::SourceError;
use super::error::SourceErrorReason;

/// Trait representing a random-access byte stream (e.g. an audio file).
///
/// Decoders in this crate only seek to absolute positions and read blocks
/// of a known length. `read_block` may return fewer bytes than requested
/// only when the end of the stream is reached.
pub trait ByteSource {
    /// Moves the read head to `position` bytes from the beginning.
    ///
    /// Seeking beyond the end is not an error; subsequent reads return
    /// an empty block.
    #[allow(clippy::missing_errors_doc)]
    fn seek(&mut self, position: u64) -> Result<(), SourceError>;

    /// Reads up to `len` bytes from the current position.
    #[allow(clippy::missing_errors_doc)]
    fn read_block(&mut self, len: usize) -> Result<Vec<u8>, SourceError>;

    /// Requests exclusive read access for a sequence of reads.
    ///
    /// Use [`ReadAccess`] instead of calling this directly so that
    /// [`ByteSource::release`] is always paired with it.
    #[allow(clippy::missing_errors_doc)]
    fn acquire(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Ends the access requested by [`ByteSource::acquire`].
    fn release(&mut self) {}

    /// Utility function that seeks to `position` and calls `read_block`.
    #[allow(clippy::missing_errors_doc)]
    fn read_block_at(&mut self, position: u64, len: usize) -> Result<Vec<u8>, SourceError> {
        self.seek(position)?;
        self.read_block(len)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn seek(&mut self, position: u64) -> Result<(), SourceError> {
        (**self).seek(position)
    }

    fn read_block(&mut self, len: usize) -> Result<Vec<u8>, SourceError> {
        (**self).read_block(len)
    }

    fn acquire(&mut self) -> Result<(), SourceError> {
        (**self).acquire()
    }

    fn release(&mut self) {
        (**self).release();
    }
}

/// Scoped read access to a [`ByteSource`].
///
/// The access is acquired on construction and released when the guard is
/// dropped, including early returns via `?`.
///
/// # Examples
///
/// ```
/// # use mpegvbr::source::*;
/// let mut src = MemSource::from_bytes(b"0123456789".to_vec());
/// let block = {
///     let mut access = ReadAccess::acquire(&mut src).unwrap();
///     access.read_block_at(4, 3).unwrap()
/// };
/// assert_eq!(block, b"456");
/// ```
pub struct ReadAccess<'a, S: ByteSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: ByteSource + ?Sized> ReadAccess<'a, S> {
    /// Acquires read access to `source`.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`ByteSource::acquire`].
    pub fn acquire(source: &'a mut S) -> Result<Self, SourceError> {
        source.acquire()?;
        Ok(Self { source })
    }
}

impl<S: ByteSource + ?Sized> std::ops::Deref for ReadAccess<'_, S> {
    type Target = S;
    fn deref(&self) -> &S {
        self.source
    }
}

impl<S: ByteSource + ?Sized> std::ops::DerefMut for ReadAccess<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.source
    }
}

impl<S: ByteSource + ?Sized> Drop for ReadAccess<'_, S> {
    fn drop(&mut self) {
        self.source.release();
    }
}

/// `ByteSource` backed by a preloaded buffer.
#[derive(Clone, Debug, Default)]
pub struct MemSource {
    bytes: Vec<u8>,
    position: usize,
}

impl MemSource {
    /// Constructs `MemSource` that owns `bytes`.
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, position: 0 }
    }

    /// Reads the whole file at `path` into a `MemSource`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` when the file cannot be opened or read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let bytes = std::fs::read(&path)
            .map_err(|e| SourceError::from_io_error(e).set_path(&path))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Returns the number of bytes in the source.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the source contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl ByteSource for MemSource {
    fn seek(&mut self, position: u64) -> Result<(), SourceError> {
        self.position = usize::try_from(position)
            .map_err(|_| SourceError::by_reason(SourceErrorReason::InvalidPosition))?;
        Ok(())
    }

    fn read_block(&mut self, len: usize) -> Result<Vec<u8>, SourceError> {
        let begin = std::cmp::min(self.position, self.bytes.len());
        let end = std::cmp::min(begin.saturating_add(len), self.bytes.len());
        self.position = begin + (end - begin);
        Ok(self.bytes[begin..end].to_vec())
    }
}

/// `ByteSource` that wraps any [`Read`] + [`Seek`] object.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read + Seek> ReaderSource<R> {
    /// Wraps `inner`.
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwraps and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn seek(&mut self, position: u64) -> Result<(), SourceError> {
        self.inner
            .seek(SeekFrom::Start(position))
            .map_err(SourceError::from_io_error)?;
        Ok(())
    }

    fn read_block(&mut self, len: usize) -> Result<Vec<u8>, SourceError> {
        let mut buf = Vec::with_capacity(std::cmp::min(len, 1 << 16));
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(SourceError::from_io_error)?;
        Ok(buf)
    }
}

/// `ByteSource` that reads a file from a path.
///
/// The file is opened lazily on the first access. When the file is opened
/// by [`ByteSource::acquire`], it is closed again by the matching
/// [`ByteSource::release`].
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    reader: Option<ReaderSource<BufReader<File>>>,
    opened_by_acquire: bool,
}

impl FileSource {
    /// Constructs `FileSource` without opening the file.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            reader: None,
            opened_by_acquire: false,
        }
    }

    /// Returns the path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the file is currently open.
    pub const fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn open(&mut self) -> Result<&mut ReaderSource<BufReader<File>>, SourceError> {
        if self.reader.is_none() {
            let file = File::open(&self.path).map_err(|_e| {
                SourceError::by_reason(SourceErrorReason::Open).set_path(&self.path)
            })?;
            self.reader = Some(ReaderSource::new(BufReader::new(file)));
        }
        self.reader
            .as_mut()
            .ok_or_else(|| SourceError::by_reason(SourceErrorReason::Open).set_path(&self.path))
    }
}

impl ByteSource for FileSource {
    fn seek(&mut self, position: u64) -> Result<(), SourceError> {
        let path = self.path.clone();
        self.open()?.seek(position).map_err(|e| e.set_path(path))
    }

    fn read_block(&mut self, len: usize) -> Result<Vec<u8>, SourceError> {
        let path = self.path.clone();
        self.open()?.read_block(len).map_err(|e| e.set_path(path))
    }

    fn acquire(&mut self) -> Result<(), SourceError> {
        if self.reader.is_none() {
            self.open()?;
            self.opened_by_acquire = true;
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.opened_by_acquire {
            self.reader = None;
            self.opened_by_acquire = false;
        }
    }
}

/// Returns `position + len`, or [`SourceErrorReason::InvalidPosition`] on overflow.
pub(crate) fn advance(position: u64, len: u64) -> Result<u64, SourceError> {
    position
        .checked_add(len)
        .ok_or_else(|| SourceError::by_reason(SourceErrorReason::InvalidPosition))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn mem_source_reads_partially_at_end() {
        let mut src = MemSource::from_bytes(vec![1, 2, 3, 4, 5]);
        assert_eq!(src.read_block_at(3, 4).unwrap(), vec![4, 5]);
        assert_eq!(src.read_block(1).unwrap(), Vec::<u8>::new());
        assert_eq!(src.read_block_at(10, 4).unwrap(), Vec::<u8>::new());
        assert_eq!(src.read_block_at(0, 2).unwrap(), vec![1, 2]);
        assert_eq!(src.read_block(2).unwrap(), vec![3, 4]);
    }

    #[test]
    fn reader_source_matches_mem_source() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let mut mem = MemSource::from_bytes(bytes.clone());
        let mut reader = ReaderSource::new(Cursor::new(bytes));
        for (pos, len) in [(0u64, 16usize), (250, 16), (300, 1), (17, 0)] {
            assert_eq!(
                mem.read_block_at(pos, len).unwrap(),
                reader.read_block_at(pos, len).unwrap()
            );
        }
    }

    #[test]
    fn file_source_closes_after_scoped_access() {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(b"0123456789").expect("failed to write");
        file.flush().expect("failed to flush");

        let mut src = FileSource::new(file.path());
        assert!(!src.is_open());
        {
            let mut access = ReadAccess::acquire(&mut src).unwrap();
            assert_eq!(access.read_block_at(2, 3).unwrap(), b"234");
            assert!(access.is_open());
        }
        assert!(!src.is_open());

        // direct reads keep the file open
        assert_eq!(src.read_block_at(8, 8).unwrap(), b"89");
        assert!(src.is_open());
        {
            let _access = ReadAccess::acquire(&mut src).unwrap();
        }
        assert!(src.is_open());
    }

    #[test]
    fn file_source_reports_missing_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("missing.mp3");
        let mut src = FileSource::new(&path);
        let err = src.read_block_at(0, 4).unwrap_err();
        assert!(matches!(err.reason(), SourceErrorReason::Open));
        assert!(ReadAccess::acquire(&mut src).is_err());
        assert!(!src.is_open());
    }

    #[test]
    fn advance_rejects_overflowing_position() {
        assert_eq!(advance(100, 24).unwrap(), 124);
        let err = advance(u64::MAX - 3, 4).unwrap_err();
        assert!(matches!(err.reason(), SourceErrorReason::InvalidPosition));
    }
}
