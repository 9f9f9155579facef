/// Byte order applied to every fixed-width read and write on a `ByteBuffer`.
///
/// Switching the order on a buffer only affects subsequent operations; bytes
/// already written are never reinterpreted or re-encoded.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}
