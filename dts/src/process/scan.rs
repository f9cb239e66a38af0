use crate::structs::sync::FrameFamily;

/// A sync word found by [`SyncScanner::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncMatch {
    pub word: u32,
    pub family: FrameFamily,
}

/// Rolling 32-bit window over the input, matched against the sync words after
/// every byte.
///
/// The window survives across calls, so a sync word split between two input
/// chunks is still found.
#[derive(Debug, Default)]
pub struct SyncScanner {
    window: u32,
}

impl SyncScanner {
    /// Shifts bytes of `data` into the window until a sync word of a family
    /// allowed by `accept` completes.
    ///
    /// Returns the number of bytes consumed, which is all of `data` when no
    /// sync word is found.
    pub fn scan<F>(&mut self, data: &[u8], accept: F) -> (usize, Option<SyncMatch>)
    where
        F: Fn(FrameFamily) -> bool,
    {
        for (i, &byte) in data.iter().enumerate() {
            self.window = (self.window << 8) | byte as u32;

            match FrameFamily::from_sync_word(self.window) {
                Some(family) if accept(family) => {
                    let word = self.window;
                    self.window = 0;

                    return (i + 1, Some(SyncMatch { word, family }));
                }
                _ => {}
            }
        }

        (data.len(), None)
    }

    pub fn reset(&mut self) {
        self.window = 0;
    }
}
