use crate::bytes::{ByteBuffer, ByteOrder};
use crate::transport::{InboundChunk, RawDuplex, TransportError};

/// Staples a pair of staging buffers to one duplex connection.
///
/// Outbound data is accumulated in `output` and shipped wholesale by
/// [`flush`](FramedTransport::flush); inbound chunks are appended to `input`
/// at a commit frontier that is tracked independently of the consumer's read
/// cursor, so a consumer always resumes exactly where it left off no matter
/// how the wire fragmented or aggregated the data.
///
/// A transport instance outlives individual connections: [`attach`]
/// (FramedTransport::attach) discards any prior connection and rebuilds both
/// buffers, which is how reconnects get a clean slate.
pub struct FramedTransport<D: RawDuplex> {
    conn: Option<D>,
    input: ByteBuffer,
    output: ByteBuffer,
    connected: bool,
    order: ByteOrder,
    input_commit: usize,
    /// When set, inbound chunks bypass the accumulation buffer entirely and
    /// are only handed to the consumer as-is.
    pub disable_input: bool,
}

impl<D: RawDuplex> FramedTransport<D> {
    pub fn new(order: ByteOrder) -> Self {
        let mut input = ByteBuffer::new();
        input.set_byte_order(order);
        let mut output = ByteBuffer::new();
        output.set_byte_order(order);
        Self {
            conn: None,
            input,
            output,
            connected: false,
            order,
            input_commit: 0,
            disable_input: false,
        }
    }

    /// Attaches a freshly established connection, cleanly releasing any
    /// prior one first. Both staging buffers are rebuilt and the transport
    /// is not considered connected until [`mark_open`]
    /// (FramedTransport::mark_open) is called.
    pub fn attach(&mut self, conn: D) {
        if let Some(mut old) = self.conn.take() {
            old.close();
        }
        self.connected = false;
        self.input = ByteBuffer::new();
        self.input.set_byte_order(self.order);
        self.output = ByteBuffer::new();
        self.output.set_byte_order(self.order);
        self.input_commit = 0;
        self.conn = Some(conn);
    }

    /// Closes and drops the connection, if any.
    pub fn detach(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
        self.connected = false;
    }

    pub fn mark_open(&mut self) {
        self.connected = true;
    }

    pub fn mark_closed(&mut self) {
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Retags both staging buffers. Buffered bytes are not re-encoded.
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
        self.input.set_byte_order(order);
        self.output.set_byte_order(order);
    }

    pub fn input(&self) -> &ByteBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut ByteBuffer {
        &mut self.input
    }

    pub fn output_mut(&mut self) -> &mut ByteBuffer {
        &mut self.output
    }

    /// Appends one inbound chunk at the commit frontier, restoring the
    /// consumer's cursor afterwards.
    ///
    /// If the buffer holds data but the consumer has drained all of it, the
    /// buffer is cleared and the frontier reset first; steady-state traffic
    /// therefore cannot grow the buffer without bound.
    pub fn absorb(&mut self, chunk: &InboundChunk) {
        if self.disable_input {
            return;
        }
        if self.input.len() > 0 && self.input.bytes_available() < 1 {
            self.input.clear();
            self.input_commit = 0;
        }
        let pre = self.input.position();
        self.input.seek(self.input_commit);
        match chunk {
            InboundChunk::Text(text) => self.input.write_utf_bytes(text),
            InboundChunk::Binary(data) => self.input.write_bytes(data),
        }
        self.input_commit = self.input.position();
        self.input.seek(pre);
    }

    /// Passes bytes straight to the underlying stream.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        match self.conn.as_mut() {
            Some(conn) => conn.send(bytes),
            None => Err(TransportError::NotConnected),
        }
    }

    /// Ships `[0, length)` of the output buffer, then re-applies the
    /// configured byte order and clears the buffer regardless of whether the
    /// send succeeded. A failure is *returned* for the caller to surface as
    /// an error event instead of being propagated mid-flush.
    #[must_use]
    pub fn flush(&mut self) -> Option<TransportError> {
        if self.output.len() == 0 {
            return None;
        }
        let result = match self.conn.as_mut() {
            Some(conn) => conn.send(self.output.as_slice()),
            None => Err(TransportError::NotConnected),
        };
        self.output.set_byte_order(self.order);
        self.output.clear();
        result.err()
    }
}
