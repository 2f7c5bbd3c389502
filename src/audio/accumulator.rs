use tracing::{debug, info};

/// Buffers raw audio fragments until enough material has accumulated for a
/// transcription pass.
///
/// Browser media recorders emit a container header only in the very first
/// fragment; later fragments are bare continuation data. The accumulator
/// retains that first non-empty fragment and prepends it to every segment
/// after the first accepted one so each segment stays independently
/// decodable.
pub struct AudioAccumulator {
    batch_size: usize,
    min_segment_bytes: usize,
    pending: Vec<Vec<u8>>,
    header: Option<Vec<u8>>,
    fragments_received: u64,
    first_batch_processed: bool,
}

impl AudioAccumulator {
    pub fn new(batch_size: usize, min_segment_bytes: usize) -> Self {
        Self {
            batch_size,
            min_segment_bytes,
            pending: Vec::new(),
            header: None,
            fragments_received: 0,
            first_batch_processed: false,
        }
    }

    /// Append a fragment. Returns a segment ready for transcription once
    /// `batch_size` fragments are pending and the combined blob passes the
    /// minimum-size check.
    pub fn submit(&mut self, fragment: &[u8]) -> Option<Vec<u8>> {
        if self.header.is_none() && !fragment.is_empty() {
            self.header = Some(fragment.to_vec());
        }

        self.pending.push(fragment.to_vec());
        self.fragments_received += 1;

        if self.pending.len() >= self.batch_size {
            self.cut_segment()
        } else {
            None
        }
    }

    /// Force whatever is pending out as a final segment. Used at session
    /// end; the header-prepend rule and minimum-size check still apply.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            return None;
        }
        self.cut_segment()
    }

    fn cut_segment(&mut self) -> Option<Vec<u8>> {
        let fragment_count = self.pending.len();
        let mut blob: Vec<u8> = Vec::new();

        // Segments after the first accepted one need the retained header to
        // remain decodable.
        if self.first_batch_processed {
            if let Some(header) = &self.header {
                blob.extend_from_slice(header);
            }
        }

        for fragment in self.pending.drain(..) {
            blob.extend_from_slice(&fragment);
        }

        if blob.len() < self.min_segment_bytes {
            debug!(
                "Dropping undersized segment: {} bytes from {} fragments",
                blob.len(),
                fragment_count
            );
            return None;
        }

        self.first_batch_processed = true;

        info!(
            "Segment ready: {} bytes from {} fragments",
            blob.len(),
            fragment_count
        );

        Some(blob)
    }

    pub fn fragments_received(&self) -> u64 {
        self.fragments_received
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
