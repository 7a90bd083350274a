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
//! Fixed-width field primitives of the ustar header: optionally
//! NUL-terminated strings and radix-encoded numbers stored as ASCII.

use core::fmt::{Debug, Formatter};
use core::str::{from_utf8, Utf8Error};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Base type for strings embedded in a Tar header. The length depends on the
/// context. The returned string is likely to be UTF-8/ASCII, which is verified
/// by getters, such as [`TarFormatString::as_str`].
///
/// An optionally null terminated string. The contents are either:
/// 1. A fully populated string with no null termination or
/// 2. A partially populated string where the unused bytes are zero.
#[derive(Copy, Clone, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct TarFormatString<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> TarFormatString<N> {
    /// Constructor.
    ///
    /// # Panics
    /// Panics if `N` is zero, i.e., the underlying array has no length.
    #[must_use]
    pub const fn new(bytes: [u8; N]) -> Self {
        assert!(N > 0, "array should have at least one element");
        Self { bytes }
    }

    /// True if the string is empty (ignoring NULL bytes).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }

    /// Returns the length of the payload in bytes. This is either the full
    /// capacity `N` or the data until the first NULL byte.
    #[must_use]
    pub fn size(&self) -> usize {
        memchr::memchr(0, &self.bytes).unwrap_or(N)
    }

    /// Returns the underlying bytes, including any trailing NULL bytes.
    #[must_use]
    pub const fn raw(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Returns a str ref without terminating or intermediate NULL bytes. The
    /// string is truncated at the first NULL byte, in case not the full length
    /// was used.
    ///
    /// # Errors
    /// Returns a [`Utf8Error`] error for invalid strings.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        from_utf8(&self.bytes[0..self.size()])
    }

    /// Wrapper around [`Self::as_str`] that stops as soon as the first space
    /// is found. This is necessary to properly parse certain Tar-style encoded
    /// numbers. Some ustar implementations pad spaces which prevents the proper
    /// parsing as number.
    ///
    /// # Errors
    /// Returns a [`Utf8Error`] error for invalid strings.
    pub fn as_str_until_first_space(&self) -> Result<&str, Utf8Error> {
        from_utf8(&self.bytes[0..self.size()]).map(|str| {
            let end_index_exclusive = str.find(' ').unwrap_or(str.len());
            &str[0..end_index_exclusive]
        })
    }

    /// Append to end of string.
    ///
    /// # Panics
    /// Panics if there is not enough capacity.
    pub fn append<const S: usize>(&mut self, other: &TarFormatString<S>) {
        let len = self.size();
        let other_len = other.size();
        let resulting_length = len + other_len;

        assert!(resulting_length <= N, "Result too long for capacity {N}");

        self.bytes[len..resulting_length].copy_from_slice(&other.bytes[0..other_len]);
        if resulting_length < N {
            self.bytes[resulting_length] = 0;
        }
    }
}

impl<const N: usize> Default for TarFormatString<N> {
    /// An empty (all-zero) string.
    fn default() -> Self {
        Self::new([0; N])
    }
}

impl<const N: usize> Debug for TarFormatString<N> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        let sub_array = &self.bytes[0..self.size()];
        write!(
            f,
            "str='{:?}',byte_usage={}/{}",
            from_utf8(sub_array),
            self.size(),
            N
        )
    }
}

/// A number with a specified base. Trailing spaces in the string are ignored.
#[derive(Copy, Clone, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct TarFormatNumber<const N: usize, const R: u32>(TarFormatString<N>);

/// An octal number. Trailing spaces in the string are ignored.
#[derive(Copy, Clone, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct TarFormatOctal<const N: usize>(TarFormatNumber<N, 8>);

/// A decimal number. Trailing spaces in the string are ignored.
#[derive(Copy, Clone, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct TarFormatDecimal<const N: usize>(TarFormatNumber<N, 10>);

impl<const N: usize, const R: u32> TarFormatNumber<N, R> {
    #[cfg(test)]
    const fn new(bytes: [u8; N]) -> Self {
        Self(TarFormatString::<N> { bytes })
    }

    /// Interprets the underlying value as a number of the specified type using
    /// its respective radix.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying value cannot be parsed as a number
    /// of the specified type and respective radix.
    pub fn as_number<T>(&self) -> core::result::Result<T, T::FromStrRadixErr>
    where
        T: num_traits::Num,
    {
        let str = self.0.as_str_until_first_space().unwrap_or("0");
        T::from_str_radix(str, R)
    }

    /// Returns the underlying [`TarFormatString`].
    #[must_use]
    pub const fn as_inner(&self) -> &TarFormatString<N> {
        &self.0
    }
}

impl<const N: usize, const R: u32> Debug for TarFormatNumber<N, R> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        let sub_array = &self.0.bytes[0..self.0.size()];
        match self.as_number::<u64>() {
            Err(msg) => write!(f, "{} [{:?}]", msg, from_utf8(sub_array)),
            Ok(val) => write!(f, "{} [{:?}]", val, from_utf8(sub_array)),
        }
    }
}

impl<const N: usize> Debug for TarFormatOctal<N> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

impl<const N: usize> Debug for TarFormatDecimal<N> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

impl<const N: usize> TarFormatOctal<N> {
    #[cfg(test)]
    pub(crate) const fn new(bytes: [u8; N]) -> Self {
        Self(TarFormatNumber::<N, 8>::new(bytes))
    }

    /// Interprets the underlying value as a number of the specified type using
    /// its respective radix.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying value cannot be parsed as a number
    /// of the specified type and respective radix.
    pub fn as_number<T>(&self) -> core::result::Result<T, T::FromStrRadixErr>
    where
        T: num_traits::Num,
    {
        self.0.as_number::<T>()
    }

    /// Returns the underlying [`TarFormatString`].
    #[must_use]
    pub const fn as_inner(&self) -> &TarFormatString<N> {
        self.0.as_inner()
    }
}

impl<const N: usize> TarFormatDecimal<N> {
    /// Interprets the underlying value as a number of the specified type using
    /// its respective radix.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying value cannot be parsed as a number
    /// of the specified type and respective radix.
    pub fn as_number<T>(&self) -> core::result::Result<T, T::FromStrRadixErr>
    where
        T: num_traits::Num,
    {
        self.0.as_number::<T>()
    }

    /// Returns the underlying [`TarFormatString`].
    #[must_use]
    pub const fn as_inner(&self) -> &TarFormatString<N> {
        self.0.as_inner()
    }
}
