//! Element types that may appear in a record payload

/// Trait for plain values stored in record payloads
///
/// Payloads are little-endian. Implementors are [`bytemuck::Pod`] so a chunk
/// of payload bytes can be reinterpreted without unsafe code; `from_le` then
/// fixes the byte order on big-endian hosts.
pub trait RecordElement: bytemuck::Pod + PartialEq {
    /// Size of one element on disk
    const SIZE: usize = core::mem::size_of::<Self>();

    /// Convert a value read in little-endian order to native order
    fn from_le(raw: Self) -> Self;

    /// Convert a native value to little-endian order
    fn to_le(self) -> Self;

    /// Decode one element from exactly `SIZE` bytes
    fn read_le(bytes: &[u8]) -> Self {
        Self::from_le(bytemuck::pod_read_unaligned(bytes))
    }
}

impl RecordElement for i32 {
    fn from_le(raw: Self) -> Self {
        i32::from_le(raw)
    }

    fn to_le(self) -> Self {
        i32::to_le(self)
    }
}

impl RecordElement for f64 {
    fn from_le(raw: Self) -> Self {
        f64::from_bits(u64::from_le(raw.to_bits()))
    }

    fn to_le(self) -> Self {
        f64::from_bits(self.to_bits().to_le())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_le() {
        assert_eq!(i32::read_le(&7i32.to_le_bytes()), 7);
        assert_eq!(i32::read_le(&(-3i32).to_le_bytes()), -3);
        assert_eq!(f64::read_le(&1.5f64.to_le_bytes()), 1.5);
        assert_eq!(<f64 as RecordElement>::SIZE, 8);
        assert_eq!(<i32 as RecordElement>::SIZE, 4);
    }
}
