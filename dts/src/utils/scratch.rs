/// Fixed-capacity accumulator for frame headers split across input chunks.
///
/// The capacity is set once, at construction, to the largest header any
/// enabled frame family can produce. The buffer is reused for every frame and
/// never grows.
#[derive(Debug)]
pub struct ScratchBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl ScratchBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes accumulated for the current header.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Restarts accumulation with the four bytes of a matched sync word.
    pub fn seed(&mut self, sync_word: u32) {
        self.data[..4].copy_from_slice(&sync_word.to_be_bytes());
        self.len = 4;
    }

    /// Copies bytes from `source` until `target_len` bytes are accumulated or
    /// `source` runs out. Returns the number of bytes taken from `source`.
    pub fn continue_read(&mut self, source: &[u8], target_len: usize) -> usize {
        debug_assert!(target_len <= self.capacity());

        let to_read = source.len().min(target_len.saturating_sub(self.len));
        self.data[self.len..self.len + to_read].copy_from_slice(&source[..to_read]);
        self.len += to_read;

        to_read
    }

    /// Drops accumulated bytes beyond `len`.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

#[test]
fn header_accumulates_across_chunks() {
    let mut scratch = ScratchBuffer::with_capacity(18);
    scratch.seed(0x7FFE_8001);

    assert_eq!(scratch.continue_read(&[1, 2, 3], 8), 3);
    assert_eq!(scratch.len(), 7);
    assert_eq!(scratch.continue_read(&[4, 5, 6, 7], 8), 1);
    assert_eq!(scratch.as_slice(), &[0x7F, 0xFE, 0x80, 0x01, 1, 2, 3, 4]);

    // Already at target: nothing more is taken.
    assert_eq!(scratch.continue_read(&[9], 8), 0);

    scratch.truncate(5);
    assert_eq!(scratch.as_slice(), &[0x7F, 0xFE, 0x80, 0x01, 1]);
    assert_eq!(scratch.capacity(), 18);

    scratch.clear();
    assert!(scratch.is_empty());
}
