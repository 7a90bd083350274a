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
//! Library to query uncompressed USTAR Tar archives through any seekable
//! reader (`io::Read + io::Seek`), without loading the archive into memory.
//! If you need full feature support or archive creation, I recommend the use
//! of <https://crates.io/crates/tar> instead.
//!
//! The crate is read-only and only supports "basic" ustar archives, therefore
//! no extensions, such as GNU Longname, sparse files or PAX headers. The
//! maximum supported entry path length is 256 bytes (using the ustar
//! name/prefix split). All queries are forward scans over 512-byte blocks:
//! nothing is cached between calls and headers are never retained beyond the
//! scan step that produced them.
//!
//! The entry point is [`TarArchive`], which wraps a caller-owned stream and
//! exposes:
//! - [`TarArchive::check`]: structural validation (magic, version, checksum),
//! - [`TarArchive::locate`]: existence and type lookup for a single path,
//! - [`TarArchive::list`]: non-recursive listing of a directory,
//! - [`TarArchive::read_file`]: offset-based reads of a regular file.
//!
//! [This link](https://www.gnu.org/software/tar/manual/html_section/Formats.html)
//! gives a good overview over possible archive formats and their limitations.

#![deny(unsafe_code)]
#![deny(rustdoc::all)]
#![allow(rustdoc::missing_doc_code_examples)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]

/// Each archive record (either header or data block) is a block of 512 bytes.
pub const BLOCKSIZE: usize = 512;

/// Width of the `name` field of a header.
pub const NAME_LEN: usize = 100;

/// Width of the `prefix` field of a header.
pub const PREFIX_LEN: usize = 155;

/// Maximum length of a full entry path (`prefix` + `/` + `name`).
pub const PATH_LEN: usize = PREFIX_LEN + 1 + NAME_LEN;

mod archive;
mod block;
mod header;
mod tar_format_types;

pub use archive::*;
pub use block::*;
pub use header::*;
pub use tar_format_types::*;
