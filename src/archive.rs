/*
MIT License

Copyright (c) 2026 The tar-seek developers

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/
//! Module for [`TarArchive`] and the query operations built on the header
//! scans of [`BlockReader`].

use crate::{BlockReader, PosixHeader, TarFormatString, TypeFlag, PATH_LEN};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use thiserror::Error;

/// A full entry path as reported by [`TarArchive::list`]. Large enough for
/// the maximum `prefix` + `/` + `name` combination.
pub type EntryPath = TarFormatString<PATH_LEN>;

/// Classification of an archive entry found by [`TarArchive::locate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file (including the legacy NUL typeflag alias).
    RegularFile,
    /// A directory.
    Directory,
    /// A hard link to a previously archived entry.
    HardLink,
    /// A symbolic link.
    SymbolicLink,
}

impl EntryKind {
    fn from_type_flag(flag: TypeFlag) -> Option<Self> {
        match flag {
            TypeFlag::REGTYPE | TypeFlag::AREGTYPE => Some(Self::RegularFile),
            TypeFlag::DIRTYPE => Some(Self::Directory),
            TypeFlag::LINK => Some(Self::HardLink),
            TypeFlag::SYMTYPE => Some(Self::SymbolicLink),
            _ => None,
        }
    }
}

/// Structural failures reported by [`TarArchive::check`]. The `index` is the
/// position of the offending header in the archive, counting from zero.
///
/// The checks run in a fixed priority order per header (magic, then version,
/// then checksum) and the first violation of the first bad header wins.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The magic field of a header is not "ustar" followed by a NULL byte.
    #[error("invalid magic value in header #{index}")]
    InvalidMagic { index: u64 },
    /// The version field of a header is not "00".
    #[error("invalid version value in header #{index}")]
    InvalidVersion { index: u64 },
    /// The declared checksum of a header does not match the computed one, or
    /// is not parsable at all.
    #[error("invalid checksum in header #{index} (computed {computed})")]
    InvalidChecksum {
        index: u64,
        /// The declared value, if the field was parsable.
        declared: Option<u32>,
        computed: u32,
    },
    /// The underlying stream failed. Kept distinct from the structural
    /// failures so callers can tell corruption from storage trouble.
    #[error("read error while scanning the archive")]
    Io(#[from] io::Error),
}

/// Failures of [`TarArchive::read_file`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// No regular file entry exists at the given path.
    #[error("no regular file entry at the given path")]
    NotFound,
    /// The requested offset points at or behind the end of the file.
    #[error("offset {offset} is outside the file of {size} bytes")]
    OffsetOutOfRange { offset: u64, size: u64 },
    /// The underlying stream failed.
    #[error("read error while scanning the archive")]
    Io(#[from] io::Error),
}

/// Outcome of a successful [`TarArchive::read_file`] call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FileRead {
    /// Number of bytes written to the destination buffer.
    pub bytes_read: usize,
    /// Bytes left between the end of this read and the end of the file. Zero
    /// means the file was read to completion; a follow-up call with
    /// `offset + bytes_read` continues where this read stopped.
    pub remaining: u64,
}

/// Read-only view of an uncompressed ustar archive behind a seekable stream.
///
/// The stream handle is owned by the caller for its whole lifetime; this type
/// never opens or closes anything. Every query repositions the stream to the
/// start of the archive and scans forward, so the archive itself must begin
/// at stream offset 0. Queries are independent: no state is kept between
/// calls and a failed query leaves the next one unaffected.
///
/// Operations take `&mut self` because they move the shared stream cursor.
/// Concurrent queries therefore need one handle per caller (or external
/// serialization); see the crate docs.
#[derive(Debug)]
pub struct TarArchive<R> {
    stream: R,
}

impl<R: Read + Seek> TarArchive<R> {
    /// Interprets the stream as a Tar archive starting at offset 0.
    pub const fn new(stream: R) -> Self {
        Self { stream }
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> R {
        self.stream
    }

    /// Checks whether the archive is structurally valid.
    ///
    /// Each non-terminator header of a valid archive has a magic value of
    /// "ustar" plus NULL, a version value of "00" without NULL and a declared
    /// checksum equal to the computed one. On success, the number of
    /// non-terminator headers is returned.
    ///
    /// # Errors
    /// The first violation in scan order, see [`CheckError`].
    pub fn check(&mut self) -> Result<u64, CheckError> {
        self.stream.seek(SeekFrom::Start(0))?;
        let mut reader = BlockReader::new(&mut self.stream);
        let mut count = 0;
        while let Some(header) = reader.next_header()? {
            if !header.has_valid_magic() {
                return Err(CheckError::InvalidMagic { index: count });
            }
            if !header.has_valid_version() {
                return Err(CheckError::InvalidVersion { index: count });
            }
            let computed = header.compute_checksum();
            let declared = header.cksum.as_number::<u32>().ok();
            if declared != Some(computed) {
                return Err(CheckError::InvalidChecksum {
                    index: count,
                    declared,
                    computed,
                });
            }
            count += 1;
        }
        Ok(count)
    }

    /// Looks up the entry at `path` and classifies it by type.
    ///
    /// The comparison is exact (including any trailing slash of directory
    /// names) against the full path, i.e. `prefix` + `/` + `name`. The first
    /// matching entry wins; an entry of a type outside [`EntryKind`] at the
    /// path yields `None`, as does a missing entry.
    ///
    /// # Errors
    /// Propagates I/O errors of the underlying stream.
    pub fn locate(&mut self, path: &str) -> io::Result<Option<EntryKind>> {
        let header = self.find_header(path)?;
        Ok(header
            .and_then(|h| h.typeflag.try_to_type_flag().ok())
            .and_then(EntryKind::from_type_flag))
    }

    /// Whether a regular file entry exists at `path`.
    ///
    /// # Errors
    /// Propagates I/O errors of the underlying stream.
    pub fn is_file(&mut self, path: &str) -> io::Result<bool> {
        Ok(self.locate(path)? == Some(EntryKind::RegularFile))
    }

    /// Whether a directory entry exists at `path`.
    ///
    /// # Errors
    /// Propagates I/O errors of the underlying stream.
    pub fn is_dir(&mut self, path: &str) -> io::Result<bool> {
        Ok(self.locate(path)? == Some(EntryKind::Directory))
    }

    /// Whether a symbolic link entry exists at `path`.
    ///
    /// # Errors
    /// Propagates I/O errors of the underlying stream.
    pub fn is_symlink(&mut self, path: &str) -> io::Result<bool> {
        Ok(self.locate(path)? == Some(EntryKind::SymbolicLink))
    }

    /// Lists the immediate children of the directory at `path` into the
    /// caller-allocated `entries` slice and returns how many were stored.
    ///
    /// The listing does not recurse: an entry is reported iff its full path
    /// extends `path` and contains no further slash except as its final byte
    /// (sub-directories appear as their own entries, their content does not).
    /// The directory itself is not reported. Matches beyond the capacity of
    /// `entries` are silently dropped and not counted. A count of zero means
    /// nothing is listed under that path.
    ///
    /// If `path` names a symbolic link, it is resolved to its link target
    /// once (with a trailing slash appended if missing) before listing.
    ///
    /// # Errors
    /// Propagates I/O errors of the underlying stream.
    pub fn list(&mut self, path: &str, entries: &mut [EntryPath]) -> io::Result<usize> {
        let dir = match self.find_header(path)? {
            Some(h) if matches!(h.typeflag.try_to_type_flag(), Ok(TypeFlag::SYMTYPE)) => {
                let target = link_target(&h)?;
                if target.ends_with('/') {
                    target.to_string()
                } else {
                    format!("{target}/")
                }
            }
            _ => path.to_string(),
        };

        self.stream.seek(SeekFrom::Start(0))?;
        let mut reader = BlockReader::new(&mut self.stream);
        let mut count = 0;
        while let Some(header) = reader.next_header()? {
            let full = header.full_name();
            let Ok(full_str) = full.as_str() else {
                continue;
            };
            let Some(rest) = full_str.strip_prefix(dir.as_str()) else {
                continue;
            };
            // skip the directory itself and anything deeper than one level
            if rest.is_empty() || rest.strip_suffix('/').unwrap_or(rest).contains('/') {
                continue;
            }
            if count < entries.len() {
                entries[count] = full;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Reads up to `dest.len()` bytes of the regular file at `path`, starting
    /// `offset` bytes into its content.
    ///
    /// Name matches of non-file entries are skipped: the scan looks for a
    /// regular file at the path. If `path` names a symbolic link, it is
    /// resolved to its link target once; a second level of indirection is not
    /// followed. The returned [`FileRead`] reports how many bytes were
    /// written and how many remain after them; repeated calls with advancing
    /// offsets read the file to completion.
    ///
    /// # Errors
    /// [`ReadError::NotFound`] if no regular file is found,
    /// [`ReadError::OffsetOutOfRange`] if `offset >= file size` (also for
    /// `offset == size`: reading at the end is not a zero-length success).
    pub fn read_file(
        &mut self,
        path: &str,
        offset: u64,
        dest: &mut [u8],
    ) -> Result<FileRead, ReadError> {
        let mut target = path.to_string();
        let mut remaining_hops = 1;
        loop {
            self.stream.seek(SeekFrom::Start(0))?;
            let mut reader = BlockReader::new(&mut self.stream);
            let header = loop {
                let Some(header) = reader.next_header()? else {
                    return Err(ReadError::NotFound);
                };
                if header.full_name().as_str() != Ok(target.as_str()) {
                    continue;
                }
                match header.typeflag.try_to_type_flag() {
                    Ok(flag) if flag.is_regular_file() => break header,
                    Ok(TypeFlag::SYMTYPE) => break header,
                    _ => {}
                }
            };

            if matches!(header.typeflag.try_to_type_flag(), Ok(TypeFlag::SYMTYPE)) {
                if remaining_hops == 0 {
                    return Err(ReadError::NotFound);
                }
                remaining_hops -= 1;
                target = link_target(&header)?.to_string();
                continue;
            }

            // the stream is positioned at the first content byte here
            let size = header.size.as_number::<u64>().map_err(|e| {
                io::Error::new(
                    ErrorKind::InvalidData,
                    format!("unparsable size field in header: {e}"),
                )
            })?;
            if offset >= size {
                return Err(ReadError::OffsetOutOfRange { offset, size });
            }
            let to_read = u64::min(size - offset, dest.len() as u64) as usize;
            self.stream.seek(SeekFrom::Current(offset as i64))?;
            self.stream.read_exact(&mut dest[..to_read])?;
            return Ok(FileRead {
                bytes_read: to_read,
                remaining: size - offset - to_read as u64,
            });
        }
    }

    /// Scans for the first entry whose full path equals `path`, of any type.
    fn find_header(&mut self, path: &str) -> io::Result<Option<PosixHeader>> {
        self.stream.seek(SeekFrom::Start(0))?;
        let mut reader = BlockReader::new(&mut self.stream);
        while let Some(header) = reader.next_header()? {
            if header.full_name().as_str() == Ok(path) {
                return Ok(Some(header));
            }
        }
        Ok(None)
    }
}

/// Extracts the link target of a symlink header.
fn link_target(header: &PosixHeader) -> io::Result<&str> {
    header.linkname.as_str().map_err(|e| {
        io::Error::new(
            ErrorKind::InvalidData,
            format!("linkname field is not valid UTF-8: {e}"),
        )
    })
}
