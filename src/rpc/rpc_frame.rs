use crate::bytes::{ByteBuffer, ByteOrder};
use crate::constants::{FRAME_MIN_SIZE, FRAME_REQUEST_ID_SIZE, FRAME_ROUTE_LEN_SIZE};
use crate::rpc::{ClientError, ProtocolError};

/// One complete application message as transmitted on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcFrame {
    /// String key identifying the message type; doubles as the schema
    /// lookup key.
    pub route: String,

    /// Opaque payload bytes, interpreted by the schema codec for `route`.
    pub payload: Vec<u8>,

    /// Correlation token. 0 means "no reply expected".
    pub request_id: u32,
}

/// Encodes and decodes the wire framing:
///
/// `u8 nameLen | nameLen route bytes | payload bytes | u32_be requestId`
///
/// The length byte and the trailing request ID are always big-endian
/// regardless of the transport's configured default; the payload length is
/// implicit in the total frame length.
pub struct RpcFrameCodec;

impl RpcFrameCodec {
    /// Writes one frame into `out` at its cursor. Forces the buffer
    /// big-endian first, as the framing fields are protocol-fixed.
    pub fn encode_into(
        out: &mut ByteBuffer,
        request_id: u32,
        route: &str,
        payload: &[u8],
    ) -> Result<(), ClientError> {
        if route.len() > u8::MAX as usize || !route.is_ascii() {
            return Err(ProtocolError::InvalidRoute(route.to_string()).into());
        }
        out.set_byte_order(ByteOrder::Big);
        out.write_u8(route.len() as u8);
        out.write_utf_bytes(route);
        out.write_array_buffer(payload, 0, 0)?;
        out.write_u32(request_id);
        Ok(())
    }

    /// Encodes a frame into a standalone byte vector.
    pub fn encode(frame: &RpcFrame) -> Result<Vec<u8>, ClientError> {
        let mut buf = ByteBuffer::new();
        Self::encode_into(&mut buf, frame.request_id, &frame.route, &frame.payload)?;
        Ok(buf.as_slice().to_vec())
    }

    /// Parses one complete binary frame.
    pub fn decode(bytes: &[u8]) -> Result<RpcFrame, ProtocolError> {
        if bytes.len() < FRAME_MIN_SIZE {
            return Err(ProtocolError::IncompleteFrame { len: bytes.len() });
        }
        let mut buf = ByteBuffer::from_slice(bytes);
        buf.set_byte_order(ByteOrder::Big);

        let name_len = buf
            .get_u8()
            .map_err(|_| ProtocolError::IncompleteFrame { len: bytes.len() })?
            as usize;
        if FRAME_ROUTE_LEN_SIZE + name_len + FRAME_REQUEST_ID_SIZE > bytes.len() {
            return Err(ProtocolError::IncompleteFrame { len: bytes.len() });
        }
        let route = buf
            .read_utf_bytes(name_len)
            .map_err(|_| ProtocolError::IncompleteFrame { len: bytes.len() })?;

        // Everything between the route name and the trailing ID.
        let payload =
            bytes[FRAME_ROUTE_LEN_SIZE + name_len..bytes.len() - FRAME_REQUEST_ID_SIZE].to_vec();

        buf.seek(bytes.len() - FRAME_REQUEST_ID_SIZE);
        let request_id = buf
            .get_u32()
            .map_err(|_| ProtocolError::IncompleteFrame { len: bytes.len() })?;

        Ok(RpcFrame {
            route,
            payload,
            request_id,
        })
    }
}
