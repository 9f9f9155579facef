use crate::bytes::{ByteBufferError, ByteOrder};
use crate::constants::{INITIAL_BUFFER_CAPACITY, MAX_UTF_STRING_BYTES};

/// Growable byte container with a read/write cursor and selectable byte
/// order.
///
/// `ByteBuffer` is the primitive everything else in this crate is built on:
/// the transport stages inbound and outbound data in one, and the RPC frame
/// codec reads and writes through one. It has no knowledge of transports or
/// protocols.
///
/// Three quantities describe the buffer at all times, with the invariant
/// `position <= length <= capacity`:
///
/// - `capacity` — allocated storage size.
/// - `length` — logical size. Raising it past `capacity` reallocates to
///   `max(requested, capacity * 2)`; lowering it below `capacity`
///   reallocates to exactly the new size. The asymmetry is deliberate:
///   growth is amortized, shrink is exact, and callers that oscillate the
///   length will thrash reallocation.
/// - `position` — the cursor. Every typed read and write advances it.
///   Setting `length` never touches it, so shrinking below the current
///   cursor leaves the cursor dangling until the caller seeks; it is not
///   auto-clamped.
pub struct ByteBuffer {
    storage: Vec<u8>,
    len: usize,
    pos: usize,
    order: ByteOrder,
}

impl ByteBuffer {
    /// Creates an empty buffer with a small initial allocation.
    pub fn new() -> Self {
        Self {
            storage: vec![0u8; INITIAL_BUFFER_CAPACITY],
            len: 0,
            pos: 0,
            order: ByteOrder::Little,
        }
    }

    /// Creates a buffer over a copy of `data`, with `capacity == length ==
    /// data.len()` and the cursor at 0.
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            storage: data.to_vec(),
            len: data.len(),
            pos: 0,
            order: ByteOrder::Little,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Retags the byte order for subsequent fixed-width operations. Bytes
    /// already written keep whatever order they were written with.
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor. No bounds check is applied; a cursor past `length`
    /// fails on the next read rather than here.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn bytes_available(&self) -> usize {
        self.len.saturating_sub(self.pos)
    }

    /// Sets the logical length, reallocating per the growth/shrink rules
    /// described on the type. The cursor is left untouched.
    pub fn set_len(&mut self, value: usize) {
        let capacity = self.storage.len();
        if value > capacity {
            self.resize_storage(value.max(capacity * 2));
        } else if value < capacity {
            self.resize_storage(value);
        }
        self.len = value;
    }

    /// Resets `length` and `position` to 0. The allocation is retained.
    pub fn clear(&mut self) {
        self.len = 0;
        self.pos = 0;
    }

    /// The logical contents, `[0, length)`.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    fn resize_storage(&mut self, new_capacity: usize) {
        let mut storage = vec![0u8; new_capacity];
        let keep = self.storage.len().min(new_capacity);
        storage[..keep].copy_from_slice(&self.storage[..keep]);
        self.storage = storage;
    }

    /// Raises `length` (and the allocation, if needed) to at least `bound`
    /// ahead of a write at `position`.
    fn ensure_write(&mut self, bound: usize) {
        if self.len < bound {
            if bound > self.storage.len() {
                let doubled = self.storage.len() * 2;
                self.resize_storage(bound.max(doubled));
            }
            self.len = bound;
        }
    }

    fn read_fixed<const N: usize>(
        &mut self,
        op: &'static str,
    ) -> Result<[u8; N], ByteBufferError> {
        if self.pos + N > self.len {
            return Err(ByteBufferError::OutOfBounds { op });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.storage[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    fn write_fixed<const N: usize>(&mut self, bytes: [u8; N]) {
        self.ensure_write(self.pos + N);
        self.storage[self.pos..self.pos + N].copy_from_slice(&bytes);
        self.pos += N;
    }

    // Fixed-width reads. Each fails with `OutOfBounds` if fewer than the
    // required bytes remain before `length`, and advances the cursor by the
    // width on success.

    pub fn get_u8(&mut self) -> Result<u8, ByteBufferError> {
        Ok(self.read_fixed::<1>("get_u8")?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, ByteBufferError> {
        let b = self.read_fixed::<2>("get_u16")?;
        Ok(match self.order {
            ByteOrder::Big => u16::from_be_bytes(b),
            ByteOrder::Little => u16::from_le_bytes(b),
        })
    }

    pub fn get_u32(&mut self) -> Result<u32, ByteBufferError> {
        let b = self.read_fixed::<4>("get_u32")?;
        Ok(match self.order {
            ByteOrder::Big => u32::from_be_bytes(b),
            ByteOrder::Little => u32::from_le_bytes(b),
        })
    }

    pub fn get_i16(&mut self) -> Result<i16, ByteBufferError> {
        let b = self.read_fixed::<2>("get_i16")?;
        Ok(match self.order {
            ByteOrder::Big => i16::from_be_bytes(b),
            ByteOrder::Little => i16::from_le_bytes(b),
        })
    }

    pub fn get_i32(&mut self) -> Result<i32, ByteBufferError> {
        let b = self.read_fixed::<4>("get_i32")?;
        Ok(match self.order {
            ByteOrder::Big => i32::from_be_bytes(b),
            ByteOrder::Little => i32::from_le_bytes(b),
        })
    }

    pub fn get_f32(&mut self) -> Result<f32, ByteBufferError> {
        let b = self.read_fixed::<4>("get_f32")?;
        Ok(match self.order {
            ByteOrder::Big => f32::from_be_bytes(b),
            ByteOrder::Little => f32::from_le_bytes(b),
        })
    }

    pub fn get_f64(&mut self) -> Result<f64, ByteBufferError> {
        let b = self.read_fixed::<8>("get_f64")?;
        Ok(match self.order {
            ByteOrder::Big => f64::from_be_bytes(b),
            ByteOrder::Little => f64::from_le_bytes(b),
        })
    }

    /// Reads one byte as a signed value.
    pub fn read_byte(&mut self) -> Result<i8, ByteBufferError> {
        Ok(self.read_fixed::<1>("read_byte")?[0] as i8)
    }

    // Fixed-width writes. Each grows the buffer via `ensure_write` and then
    // advances the cursor; writes cannot fail.

    pub fn write_u8(&mut self, value: u8) {
        self.write_fixed([value]);
    }

    pub fn write_u16(&mut self, value: u16) {
        match self.order {
            ByteOrder::Big => self.write_fixed(value.to_be_bytes()),
            ByteOrder::Little => self.write_fixed(value.to_le_bytes()),
        }
    }

    pub fn write_u32(&mut self, value: u32) {
        match self.order {
            ByteOrder::Big => self.write_fixed(value.to_be_bytes()),
            ByteOrder::Little => self.write_fixed(value.to_le_bytes()),
        }
    }

    pub fn write_i16(&mut self, value: i16) {
        match self.order {
            ByteOrder::Big => self.write_fixed(value.to_be_bytes()),
            ByteOrder::Little => self.write_fixed(value.to_le_bytes()),
        }
    }

    pub fn write_i32(&mut self, value: i32) {
        match self.order {
            ByteOrder::Big => self.write_fixed(value.to_be_bytes()),
            ByteOrder::Little => self.write_fixed(value.to_le_bytes()),
        }
    }

    pub fn write_f32(&mut self, value: f32) {
        match self.order {
            ByteOrder::Big => self.write_fixed(value.to_be_bytes()),
            ByteOrder::Little => self.write_fixed(value.to_le_bytes()),
        }
    }

    pub fn write_f64(&mut self, value: f64) {
        match self.order {
            ByteOrder::Big => self.write_fixed(value.to_be_bytes()),
            ByteOrder::Little => self.write_fixed(value.to_le_bytes()),
        }
    }

    /// Writes one byte as a signed value.
    pub fn write_byte(&mut self, value: i8) {
        self.write_fixed([value as u8]);
    }

    /// Copies a range of `source` into the buffer at the cursor, growing as
    /// needed. `length == 0` means "the rest of `source` from `offset`". A
    /// range that does not exist in `source` fails with `OutOfBounds`.
    pub fn write_array_buffer(
        &mut self,
        source: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<(), ByteBufferError> {
        if offset > source.len() {
            return Err(ByteBufferError::OutOfBounds {
                op: "write_array_buffer",
            });
        }
        let length = if length == 0 {
            source.len() - offset
        } else {
            length
        };
        if offset + length > source.len() {
            return Err(ByteBufferError::OutOfBounds {
                op: "write_array_buffer",
            });
        }
        self.ensure_write(self.pos + length);
        self.storage[self.pos..self.pos + length]
            .copy_from_slice(&source[offset..offset + length]);
        self.pos += length;
        Ok(())
    }

    /// Copies all of `source` into the buffer at the cursor.
    pub fn write_bytes(&mut self, source: &[u8]) {
        self.ensure_write(self.pos + source.len());
        self.storage[self.pos..self.pos + source.len()].copy_from_slice(source);
        self.pos += source.len();
    }

    // String codecs.
    //
    // Two distinct encodings live here. The first is UTF-8 driven by 16-bit
    // code units: 1/2/3-byte sequences, surrogate pairs encoded as two
    // 3-byte sequences rather than one 4-byte sequence (CESU-8 style), with
    // a matching permissive decoder. The second, `get_custom_string` /
    // `write_custom_string`, is a compact mixed-width codec counted in
    // characters rather than bytes. Both match the wire peers bit for bit
    // and must not be swapped for standards-strict Unicode handling.

    fn utf_byte_len(text: &str) -> usize {
        text.encode_utf16()
            .map(|unit| {
                if unit <= 0x7F {
                    1
                } else if unit <= 0x7FF {
                    2
                } else {
                    3
                }
            })
            .sum()
    }

    /// Appends `text` using the multi-byte UTF encoding described above.
    pub fn write_utf_bytes(&mut self, text: &str) {
        for unit in text.encode_utf16() {
            let c = unit as u32;
            if c <= 0x7F {
                self.write_fixed([c as u8]);
            } else if c <= 0x7FF {
                self.write_fixed([0xC0 | (c >> 6) as u8, 0x80 | (c & 0x3F) as u8]);
            } else {
                self.write_fixed([
                    0xE0 | (c >> 12) as u8,
                    0x80 | ((c >> 6) & 0x3F) as u8,
                    0x80 | (c & 0x3F) as u8,
                ]);
            }
        }
    }

    /// Writes a 2-byte length prefix (byte count of the encoded payload, in
    /// the buffer's current byte order) followed by the payload.
    ///
    /// If the payload would exceed 65535 bytes the call fails with
    /// `LengthOverflow` and nothing is appended; the length is computed
    /// before any byte is written.
    pub fn write_utf_string(&mut self, value: &str) -> Result<(), ByteBufferError> {
        let byte_len = Self::utf_byte_len(value);
        if byte_len > MAX_UTF_STRING_BYTES {
            return Err(ByteBufferError::LengthOverflow);
        }
        self.write_u16(byte_len as u16);
        self.write_utf_bytes(value);
        Ok(())
    }

    /// Inverse of `write_utf_string`.
    pub fn read_utf_string(&mut self) -> Result<String, ByteBufferError> {
        let byte_len = self.get_u16()? as usize;
        self.read_utf_bytes(byte_len)
    }

    /// Alias for [`read_utf_string`](Self::read_utf_string).
    pub fn get_string(&mut self) -> Result<String, ByteBufferError> {
        self.read_utf_string()
    }

    /// Decodes `len` bytes starting at the cursor with the permissive UTF
    /// decoder. Fails with `OutOfBounds` if fewer than `len` bytes remain.
    pub fn read_utf_bytes(&mut self, len: usize) -> Result<String, ByteBufferError> {
        if len == 0 {
            return Ok(String::new());
        }
        if len > self.bytes_available() {
            return Err(ByteBufferError::OutOfBounds {
                op: "read_utf_bytes",
            });
        }
        Ok(self.decode_utf(len))
    }

    /// Permissive decode: continuation bytes are masked and shifted, never
    /// validated; NUL bytes in the single-byte arm are skipped; the 4-byte
    /// arm keeps the peer codec's arithmetic (non-standard masking, 16-bit
    /// truncation) so both sides of the wire agree.
    fn decode_utf(&mut self, len: usize) -> String {
        let max = self.pos + len;
        let mut units: Vec<u16> = Vec::with_capacity(len);
        while self.pos < max {
            let c = self.take_raw() as u32;
            if c < 0x80 {
                if c != 0 {
                    units.push(c as u16);
                }
            } else if c < 0xE0 {
                let c1 = self.take_raw() as u32;
                units.push(((c & 0x3F) << 6 | (c1 & 0x7F)) as u16);
            } else if c < 0xF0 {
                let c1 = self.take_raw() as u32;
                let c2 = self.take_raw() as u32;
                units.push(((c & 0x1F) << 12 | (c1 & 0x7F) << 6 | (c2 & 0x7F)) as u16);
            } else {
                let c1 = self.take_raw() as u32;
                let c2 = self.take_raw() as u32;
                let c3 = self.take_raw() as u32;
                units.push(
                    ((c & 0x0F) << 18 | (c1 & 0x7F) << 12 | (c2 << 6) & 0x7F | (c3 & 0x7F))
                        as u16,
                );
            }
        }
        String::from_utf16_lossy(&units)
    }

    // A multi-byte sequence may run past the decode window; missing bytes
    // read as zero.
    fn take_raw(&mut self) -> u8 {
        let b = self.storage.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        b
    }

    /// Reads `len` *characters* of the compact mixed-width codec: a byte
    /// below 0x80 is one literal character; a byte `0x80 + n` announces `n`
    /// consecutive characters packed as 2-byte little-endian values.
    pub fn get_custom_string(&mut self, len: usize) -> Result<String, ByteBufferError> {
        let mut remaining = len as isize;
        let mut units: Vec<u16> = Vec::with_capacity(len);
        while remaining > 0 {
            let c = self.custom_raw()?;
            if c < 0x80 {
                units.push(c as u16);
                remaining -= 1;
            } else {
                let run = (c - 0x80) as isize;
                remaining -= run;
                for _ in 0..run {
                    let lo = self.custom_raw()? as u16;
                    let hi = self.custom_raw()? as u16;
                    units.push(hi << 8 | lo);
                }
            }
        }
        Ok(String::from_utf16_lossy(&units))
    }

    fn custom_raw(&mut self) -> Result<u8, ByteBufferError> {
        if self.pos + 1 > self.len {
            return Err(ByteBufferError::OutOfBounds {
                op: "get_custom_string",
            });
        }
        let b = self.storage[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Appends `text` in the compact mixed-width codec, chunking packed runs
    /// at 127 characters. Returns the character count, which is the argument
    /// `get_custom_string` needs to read the text back.
    pub fn write_custom_string(&mut self, text: &str) -> usize {
        let units: Vec<u16> = text.encode_utf16().collect();
        let mut count = 0;
        let mut i = 0;
        while i < units.len() {
            if units[i] < 0x80 {
                self.write_fixed([units[i] as u8]);
                i += 1;
                count += 1;
            } else {
                let start = i;
                while i < units.len() && units[i] >= 0x80 && i - start < 0x7F {
                    i += 1;
                }
                let run = i - start;
                self.write_fixed([(0x80 + run) as u8]);
                for &unit in &units[start..i] {
                    self.write_fixed([(unit & 0xFF) as u8, (unit >> 8) as u8]);
                }
                count += run;
            }
        }
        count
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}
