// Wire frame layout constants
/// Size in bytes of the route-name length field (u8).
pub const FRAME_ROUTE_LEN_SIZE: usize = 1;

/// Size in bytes of the trailing request-correlation ID (u32, big-endian).
pub const FRAME_REQUEST_ID_SIZE: usize = 4;

/// Smallest possible frame: empty route name, empty payload.
pub const FRAME_MIN_SIZE: usize = FRAME_ROUTE_LEN_SIZE + FRAME_REQUEST_ID_SIZE;

/// Request ID reserved for one-way messages. A frame carrying this ID never
/// correlates with a pending callback; on receipt it is dispatched as a
/// route-named push event instead.
pub const ONE_WAY_REQUEST_ID: u32 = 0;

/// Route name of the liveness probe sent by the heartbeat state machine.
pub const HEARTBEAT_ROUTE: &str = "HeartbeatRequest";

// Byte buffer sizing
/// Initial allocation of an empty `ByteBuffer`.
pub const INITIAL_BUFFER_CAPACITY: usize = 8;

/// Longest UTF-8 payload representable by the 2-byte length prefix of
/// `write_utf_string`.
pub const MAX_UTF_STRING_BYTES: usize = u16::MAX as usize;

// Protocol timing defaults, in milliseconds
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_GAP_THRESHOLD_MS: u64 = 100;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;
