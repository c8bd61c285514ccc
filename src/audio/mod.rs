mod buffer;

pub use buffer::ChunkBuffer;
