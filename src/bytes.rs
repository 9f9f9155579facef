mod byte_buffer;
mod byte_buffer_error;
mod byte_order;

pub use byte_buffer::ByteBuffer;
pub use byte_buffer_error::ByteBufferError;
pub use byte_order::ByteOrder;
