use bytes::Bytes;

/// Accumulates raw audio chunks between diarization submissions.
///
/// The owner guards the buffer with a single lock so append and drain never
/// interleave partially: `drain` hands back the complete snapshot and clears
/// the buffer in one step.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Bytes>,
    /// Cached total payload size
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            total_bytes: 0,
        }
    }

    pub fn append(&mut self, chunk: Bytes) {
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    /// Concatenate all chunks in arrival order and clear the buffer.
    pub fn drain(&mut self) -> Vec<u8> {
        let mut joined = Vec::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            joined.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;
        joined
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
