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
//! TAR header definition taken from <https://www.gnu.org/software/tar/manual/html_node/Standard.html>.
//! A Tar archive is a collection of 512-byte sized blocks. Unfortunately there
//! are several TAR-like archive specifications. An overview can be found here:
//! <https://www.gnu.org/software/tar/manual/html_node/Formats.html#Formats>
//!
//! This library focuses on the ustar format: headers must carry the "ustar"
//! magic with a terminating NULL and the "00" version without one. Decoding a
//! block into a [`PosixHeader`] never fails; whether the header is *valid*
//! (magic, version, checksum) is a question answered by
//! [`crate::TarArchive::check`].

#![allow(non_upper_case_globals)]

use crate::{TarFormatDecimal, TarFormatOctal, TarFormatString, BLOCKSIZE, NAME_LEN, PATH_LEN, PREFIX_LEN};
use core::fmt::{Debug, Display, Formatter};
use core::num::ParseIntError;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Expected content of the `magic` field: "ustar" plus a terminating NULL.
pub const MAGIC_USTAR: &[u8; 6] = b"ustar\0";

/// Expected content of the `version` field: "00" without a terminating NULL.
pub const VERSION_USTAR: &[u8; 2] = b"00";

/// Byte range of the `cksum` field inside a header block. During checksum
/// computation these bytes count as ASCII spaces.
const CHKSUM_RANGE: core::ops::Range<usize> = 148..156;

/// Errors that may happen when parsing the [`ModeFlags`].
#[derive(Debug)]
pub enum ModeError {
    ParseInt(ParseIntError),
    IllegalMode,
}

/// Wrapper around the UNIX file permissions given in octal ASCII.
#[derive(Copy, Clone, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(transparent)]
pub struct Mode(TarFormatOctal<8>);

impl Mode {
    /// Parses the [`ModeFlags`] from the mode string.
    ///
    /// # Errors
    /// Fails if the field is not a parsable octal number or encodes unknown
    /// permission bits.
    pub fn to_flags(self) -> Result<ModeFlags, ModeError> {
        let bits = self.0.as_number::<u64>().map_err(ModeError::ParseInt)?;
        ModeFlags::from_bits(bits).ok_or(ModeError::IllegalMode)
    }
}

impl Debug for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.to_flags(), f)
    }
}

/// Header of the TAR format as specified by POSIX (POSIX 1003.1-1990).
///
/// Each entry is started by such a header, which describes the size and the
/// file name. After that, the content stands in chunks of 512 bytes. The
/// number of blocks can be derived from the size.
///
/// A header is decoded fresh from every 512-byte block read off the stream
/// ([`Self::from_block`]) and never retained beyond the scan step that
/// produced it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct PosixHeader {
    pub name: TarFormatString<NAME_LEN>,
    pub mode: Mode,
    pub uid: TarFormatOctal<8>,
    pub gid: TarFormatOctal<8>,
    // confusing; size is stored as ASCII string
    pub size: TarFormatOctal<12>,
    pub mtime: TarFormatDecimal<12>,
    pub cksum: TarFormatOctal<8>,
    pub typeflag: TypeFlagRaw,
    /// Name of the linked-to entry for hard and symbolic links. There is
    /// always a null byte, therefore the max len is 99.
    pub linkname: TarFormatString<NAME_LEN>,
    pub magic: TarFormatString<6>,
    pub version: TarFormatString<2>,
    /// Username. There is always a null byte, therefore the max len is N-1.
    pub uname: TarFormatString<32>,
    /// Groupname. There is always a null byte, therefore the max len is N-1.
    pub gname: TarFormatString<32>,
    pub dev_major: TarFormatOctal<8>,
    pub dev_minor: TarFormatOctal<8>,
    pub prefix: TarFormatString<PREFIX_LEN>,
    // padding => to BLOCKSIZE bytes
    pub _pad: [u8; 12],
}

impl PosixHeader {
    /// Decodes a raw 512-byte block as a header. This never fails: malformed
    /// bytes yield a header that fails validation later, not a decode error.
    #[must_use]
    pub fn from_block(block: [u8; BLOCKSIZE]) -> Self {
        zerocopy::transmute!(block)
    }

    /// Computes the checksum over the raw header bytes: the sum of all bytes
    /// as unsigned values, with the eight bytes of the `cksum` field counted
    /// as ASCII spaces. Compare against the declared value in [`Self::cksum`].
    #[must_use]
    pub fn compute_checksum(&self) -> u32 {
        self.as_bytes()
            .iter()
            .enumerate()
            .map(|(i, &byte)| {
                if CHKSUM_RANGE.contains(&i) {
                    u32::from(b' ')
                } else {
                    u32::from(byte)
                }
            })
            .sum()
    }

    /// Whether the `magic` field matches "ustar" with a terminating NULL.
    #[must_use]
    pub fn has_valid_magic(&self) -> bool {
        self.magic.raw() == MAGIC_USTAR
    }

    /// Whether the `version` field matches "00" (no terminating NULL).
    #[must_use]
    pub fn has_valid_version(&self) -> bool {
        self.version.raw() == VERSION_USTAR
    }

    /// Returns the full path of the entry. For most archives this is just the
    /// `name` field; entries with paths longer than 100 bytes store the
    /// leading directories in `prefix`, joined with a slash.
    #[must_use]
    pub fn full_name(&self) -> TarFormatString<PATH_LEN> {
        let mut name = TarFormatString::<PATH_LEN>::default();
        if !self.prefix.is_empty() {
            name.append(&self.prefix);
            name.append(&TarFormatString::new([b'/']));
        }
        name.append(&self.name);
        name
    }

    /// Returns the number of blocks that are required to read the whole
    /// content of the entry.
    ///
    /// # Errors
    /// Fails if the size can't be parsed from the header.
    pub fn payload_block_count(&self) -> Result<usize, ParseIntError> {
        let parsed_size = self.size.as_number::<usize>()?;
        Ok(parsed_size.div_ceil(BLOCKSIZE))
    }

    /// A Tar archive is terminated by an end-of-archive marker, which
    /// (canonically) consists of two 512-byte blocks of zero bytes.
    #[must_use]
    pub fn is_zero_block(&self) -> bool {
        self.as_bytes().iter().all(|&byte| byte == 0)
    }
}

#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Eq)]
pub struct InvalidTypeFlagError(u8);

impl Display for InvalidTypeFlagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{:x} is not a valid TypeFlag", self.0))
    }
}

impl std::error::Error for InvalidTypeFlagError {}

/// The raw type-classification byte of a header. Not interpreted at decode
/// time: corrupt archives can hold any value here.
#[derive(Copy, Clone, PartialOrd, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(transparent)]
pub struct TypeFlagRaw(u8);

impl TypeFlagRaw {
    /// Tries to parse the underlying value as [`TypeFlag`]. This fails if the
    /// Tar file is corrupt and the type is invalid.
    ///
    /// # Errors
    /// Fails on a byte outside the ustar type set.
    pub fn try_to_type_flag(self) -> Result<TypeFlag, InvalidTypeFlagError> {
        TypeFlag::try_from(self)
    }
}

impl Debug for TypeFlagRaw {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.try_to_type_flag(), f)
    }
}

/// Describes the kind of payload that follows after a [`PosixHeader`]. The
/// properties of this payload are described inside the header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeFlag {
    /// Represents a regular file. In order to be compatible with older
    /// versions of tar, a typeflag value of AREGTYPE should be silently
    /// recognized as a regular file.
    REGTYPE = b'0',
    /// Legacy alias for a regular file, treated as equivalent to REGTYPE
    /// everywhere.
    AREGTYPE = b'\0',
    /// This flag represents a file linked to another file, of any type,
    /// previously archived. The linked-to name is specified in the linkname
    /// field with a trailing null.
    LINK = b'1',
    /// This represents a symbolic link to another file. The linked-to name is
    /// specified in the linkname field with a trailing null.
    SYMTYPE = b'2',
    /// Represents a character special file. The devmajor and devminor fields
    /// contain the major and minor device numbers.
    CHRTYPE = b'3',
    /// Represents a block special file. The devmajor and devminor fields
    /// contain the major and minor device numbers.
    BLKTYPE = b'4',
    /// This flag specifies a directory or sub-directory. The directory name in
    /// the name field should end with a slash.
    DIRTYPE = b'5',
    /// This specifies a FIFO special file. The archiving of a FIFO file
    /// archives the existence of this file and not its contents.
    FIFOTYPE = b'6',
    /// This specifies a contiguous file, which is the same as a normal file
    /// except that its space is allocated contiguously on the disk.
    CONTTYPE = b'7',
    /// Extended header referring to the next file in the archive.
    XHDTYPE = b'x',
    /// Global extended header.
    XGLTYPE = b'g',
}

impl TypeFlag {
    /// Whether we have a regular file. The legacy NUL alias counts as a
    /// regular file per the ustar standard.
    #[must_use]
    pub fn is_regular_file(self) -> bool {
        self == Self::AREGTYPE || self == Self::REGTYPE
    }
}

impl TryFrom<TypeFlagRaw> for TypeFlag {
    type Error = InvalidTypeFlagError;

    fn try_from(value: TypeFlagRaw) -> Result<Self, Self::Error> {
        match value.0 {
            b'0' => Ok(Self::REGTYPE),
            b'\0' => Ok(Self::AREGTYPE),
            b'1' => Ok(Self::LINK),
            b'2' => Ok(Self::SYMTYPE),
            b'3' => Ok(Self::CHRTYPE),
            b'4' => Ok(Self::BLKTYPE),
            b'5' => Ok(Self::DIRTYPE),
            b'6' => Ok(Self::FIFOTYPE),
            b'7' => Ok(Self::CONTTYPE),
            b'x' => Ok(Self::XHDTYPE),
            b'g' => Ok(Self::XGLTYPE),
            e => Err(InvalidTypeFlagError(e)),
        }
    }
}

bitflags::bitflags! {
    /// UNIX file permissions in octal format.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeFlags: u64 {
        /// Set UID on execution.
        const SetUID = 0o4000;
        /// Set GID on execution.
        const SetGID = 0o2000;
        /// Reserved.
        const TSVTX = 0o1000;
        /// Owner read.
        const OwnerRead = 0o400;
        /// Owner write.
        const OwnerWrite = 0o200;
        /// Owner execute.
        const OwnerExec = 0o100;
        /// Group read.
        const GroupRead = 0o040;
        /// Group write.
        const GroupWrite = 0o020;
        /// Group execute.
        const GroupExec = 0o010;
        /// Others read.
        const OthersRead = 0o004;
        /// Others write.
        const OthersWrite = 0o002;
        /// Others execute.
        const OthersExec = 0o001;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BLOCKSIZE;
    use std::mem::size_of;

    /// A raw ustar header block for a regular file, built with the `tar`
    /// crate so field encodings match what real archivers produce.
    fn file_header_block(path: &str, size: u64) -> [u8; BLOCKSIZE] {
        let mut header = tar::Header::new_ustar();
        header.set_path(path).unwrap();
        header.set_size(size);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_cksum();
        *header.as_bytes()
    }

    #[test]
    fn test_size() {
        assert_eq!(BLOCKSIZE, size_of::<PosixHeader>());
    }

    #[test]
    fn test_decode_file_header() {
        let header = PosixHeader::from_block(file_header_block("foo/bar.txt", 513));
        assert_eq!(header.name.as_str(), Ok("foo/bar.txt"));
        assert_eq!(header.full_name().as_str(), Ok("foo/bar.txt"));
        assert_eq!(header.size.as_number::<u64>(), Ok(513));
        assert_eq!(header.payload_block_count(), Ok(2));
        assert_eq!(header.typeflag.try_to_type_flag(), Ok(TypeFlag::REGTYPE));
        assert!(header.has_valid_magic());
        assert!(header.has_valid_version());
        assert!(!header.is_zero_block());
    }

    #[test]
    fn test_checksum_matches_declared() {
        let header = PosixHeader::from_block(file_header_block("hello.txt", 5));
        let declared = header.cksum.as_number::<u32>().unwrap();
        assert_eq!(declared, header.compute_checksum());
    }

    #[test]
    fn test_checksum_detects_tampering() {
        let mut block = file_header_block("hello.txt", 5);
        block[0] ^= 0x01; // flip one bit in the name field
        let header = PosixHeader::from_block(block);
        let declared = header.cksum.as_number::<u32>().unwrap();
        assert_ne!(declared, header.compute_checksum());
    }

    #[test]
    fn test_full_name_with_prefix() {
        // 110 bytes in total, forcing the prefix/name split
        let long_path = format!("{}/file.txt", "d".repeat(100));
        let header = PosixHeader::from_block(file_header_block(&long_path, 0));
        assert!(!header.prefix.is_empty());
        assert_eq!(header.full_name().as_str(), Ok(long_path.as_str()));
    }

    #[test]
    fn test_zero_block() {
        let header = PosixHeader::from_block([0; BLOCKSIZE]);
        assert!(header.is_zero_block());
        assert_eq!(
            header.typeflag.try_to_type_flag(),
            Ok(TypeFlag::AREGTYPE),
            "a zero byte is the legacy regular file alias"
        );
    }

    #[test]
    fn test_mode_flags() {
        let header = PosixHeader::from_block(file_header_block("hello.txt", 5));
        let flags = header.mode.to_flags().unwrap();
        assert!(flags.contains(ModeFlags::OwnerRead | ModeFlags::OwnerWrite));
        assert!(!flags.contains(ModeFlags::OwnerExec));
    }

    #[test]
    fn test_invalid_type_flag() {
        let flag = TypeFlagRaw(b'z');
        assert!(flag.try_to_type_flag().is_err());
    }
}
