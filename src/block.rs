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
//! Module for [`BlockReader`]: one-block-at-a-time reads off the underlying
//! stream, end-of-archive detection and uniform skipping of content blocks.

use crate::{PosixHeader, BLOCKSIZE};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// Reads exactly one 512-byte block from the stream.
///
/// Returns `None` if the stream holds no further block: either zero bytes
/// remain (true end of stream) or only a truncated block remains, which is
/// logged and treated as a pragmatic end of archive.
///
/// # Errors
/// Only an underlying I/O error ends up as `Err`; end of stream does not.
pub fn read_block<R: Read>(stream: &mut R) -> io::Result<Option<[u8; BLOCKSIZE]>> {
    let mut block = [0; BLOCKSIZE];
    let mut filled = 0;
    while filled < BLOCKSIZE {
        match stream.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(None),
        BLOCKSIZE => Ok(Some(block)),
        _ => {
            log::warn!("Truncated block of {filled} bytes at end of archive!");
            Ok(None)
        }
    }
}

/// Forward cursor over the headers of an archive. Every query operation of
/// [`crate::TarArchive`] drives one of these from the start of the stream.
///
/// The cursor yields one [`PosixHeader`] per entry and skips the content
/// blocks of regular files, so consecutive calls always land on header
/// boundaries, also for archives with non-block-aligned file sizes. The skip
/// is deferred until the following call: directly after [`Self::next_header`]
/// returns a header, the stream is positioned at the first byte of that
/// entry's content region.
#[derive(Debug)]
pub struct BlockReader<'a, R> {
    stream: &'a mut R,
    pending_skip: u64,
    done: bool,
}

impl<'a, R: Read + Seek> BlockReader<'a, R> {
    /// Creates a cursor reading from the current stream position.
    pub fn new(stream: &'a mut R) -> Self {
        Self {
            stream,
            pending_skip: 0,
            done: false,
        }
    }

    /// Returns the next header, or `None` once the archive is exhausted.
    ///
    /// End of archive is detected by the canonical rule: two consecutive
    /// all-zero blocks (a single zero block directly before the physical end
    /// of the stream also counts). A lone zero block followed by a further
    /// non-zero header is a format anomaly; it is logged and the scan
    /// continues with that header.
    ///
    /// # Errors
    /// Propagates I/O errors of the underlying stream. An unparsable size
    /// field on a regular file surfaces as [`ErrorKind::InvalidData`],
    /// because the scan cannot know how many content blocks to skip.
    pub fn next_header(&mut self) -> io::Result<Option<PosixHeader>> {
        if self.done {
            return Ok(None);
        }
        if self.pending_skip > 0 {
            self.stream.seek(SeekFrom::Current(self.pending_skip as i64))?;
            self.pending_skip = 0;
        }

        let Some(block) = read_block(self.stream)? else {
            log::warn!("Reached end of Tar archive without finding zero/end blocks!");
            self.done = true;
            return Ok(None);
        };
        let mut header = PosixHeader::from_block(block);

        if header.is_zero_block() {
            match read_block(self.stream)? {
                None => {
                    log::warn!("Zero block found at end of Tar archive, but only one instead of two!");
                    self.done = true;
                    return Ok(None);
                }
                Some(second) => {
                    let second = PosixHeader::from_block(second);
                    if second.is_zero_block() {
                        // gracefully terminated archive
                        log::debug!("End of Tar archive with two zero blocks!");
                        self.done = true;
                        return Ok(None);
                    }
                    log::warn!("Lone zero block inside the Tar archive, continuing with next header!");
                    header = second;
                }
            }
        }

        // Only regular files carry content blocks that must be stepped over
        // before the next header.
        if matches!(header.typeflag.try_to_type_flag(), Ok(flag) if flag.is_regular_file()) {
            let blocks = header.payload_block_count().map_err(|e| {
                io::Error::new(
                    ErrorKind::InvalidData,
                    format!("unparsable size field in header: {e}"),
                )
            })?;
            self.pending_skip = (blocks * BLOCKSIZE) as u64;
        }

        Ok(Some(header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Raw blocks of a single regular file entry: header plus zero-padded
    /// content.
    fn file_entry(path: &str, content: &[u8]) -> Vec<u8> {
        let mut header = tar::Header::new_ustar();
        header.set_path(path).unwrap();
        header.set_size(content.len() as u64);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_cksum();

        let mut blocks = header.as_bytes().to_vec();
        blocks.extend_from_slice(content);
        blocks.resize(BLOCKSIZE + content.len().div_ceil(BLOCKSIZE) * BLOCKSIZE, 0);
        blocks
    }

    #[test]
    fn test_read_block_empty_stream() {
        let mut stream = Cursor::new(Vec::new());
        assert!(read_block(&mut stream).unwrap().is_none());
    }

    #[test]
    fn test_read_block_truncated() {
        let mut stream = Cursor::new(vec![1; 100]);
        assert!(read_block(&mut stream).unwrap().is_none());
    }

    #[test]
    fn test_next_header_skips_content() {
        let mut data = file_entry("a.txt", &[b'x'; 513]);
        data.extend_from_slice(&file_entry("b.txt", b"hi"));
        data.extend_from_slice(&[0; 2 * BLOCKSIZE]);
        let mut stream = Cursor::new(data);

        let mut reader = BlockReader::new(&mut stream);
        let first = reader.next_header().unwrap().unwrap();
        assert_eq!(first.name.as_str(), Ok("a.txt"));
        let second = reader.next_header().unwrap().unwrap();
        assert_eq!(second.name.as_str(), Ok("b.txt"));
        assert!(reader.next_header().unwrap().is_none());
        // exhausted cursors stay exhausted
        assert!(reader.next_header().unwrap().is_none());
    }

    #[test]
    fn test_stream_position_after_header() {
        let data = file_entry("a.txt", b"hello");
        let mut stream = Cursor::new(data);

        let mut reader = BlockReader::new(&mut stream);
        reader.next_header().unwrap().unwrap();
        assert_eq!(stream.position(), BLOCKSIZE as u64);
    }

    #[test]
    fn test_lone_zero_block_is_not_a_terminator() {
        let mut data = file_entry("a.txt", b"hi");
        data.extend_from_slice(&[0; BLOCKSIZE]);
        data.extend_from_slice(&file_entry("b.txt", b"hi"));
        data.extend_from_slice(&[0; 2 * BLOCKSIZE]);
        let mut stream = Cursor::new(data);

        let mut reader = BlockReader::new(&mut stream);
        assert_eq!(
            reader.next_header().unwrap().unwrap().name.as_str(),
            Ok("a.txt")
        );
        assert_eq!(
            reader.next_header().unwrap().unwrap().name.as_str(),
            Ok("b.txt")
        );
        assert!(reader.next_header().unwrap().is_none());
    }

    #[test]
    fn test_single_zero_block_before_eof_terminates() {
        let mut data = file_entry("a.txt", b"hi");
        data.extend_from_slice(&[0; BLOCKSIZE]);
        let mut stream = Cursor::new(data);

        let mut reader = BlockReader::new(&mut stream);
        assert!(reader.next_header().unwrap().is_some());
        assert!(reader.next_header().unwrap().is_none());
    }

    #[test]
    fn test_missing_terminator() {
        let data = file_entry("a.txt", b"hi");
        let mut stream = Cursor::new(data);

        let mut reader = BlockReader::new(&mut stream);
        assert!(reader.next_header().unwrap().is_some());
        assert!(reader.next_header().unwrap().is_none());
    }
}
