//! Big-endian field reading for EIF structures.
//!
//! Every multi-byte integer in an EIF file is stored most-significant byte
//! first. Fields are consumed strictly in on-disk order; the position of a
//! field is defined only by the widths of the fields before it.

/// Bounds-checked cursor over a byte slice.
///
/// All reads return `None` once the slice is exhausted and never advance
/// past the end.
pub struct BigEndianReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BigEndianReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Read a fixed number of bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(count)?;
        let slice = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(slice)
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.read_bytes(N)?.try_into().ok()
    }

    #[inline]
    pub fn read_u16_be(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    #[inline]
    pub fn read_u32_be(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    #[inline]
    pub fn read_u64_be(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_be_bytes)
    }

    /// Read `N` consecutive big-endian u64 values.
    pub fn read_u64_array_be<const N: usize>(&mut self) -> Option<[u64; N]> {
        let mut values = [0u64; N];
        for value in &mut values {
            *value = self.read_u64_be()?;
        }
        Some(values)
    }

    /// Current position in the buffer.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Remaining bytes in the buffer.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }
}
