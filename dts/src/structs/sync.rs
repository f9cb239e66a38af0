//! Sync words and frame family classification.
//!
//! ## Sync Words
//!
//! **Core** (0x7FFE8001): legacy DTS core frame. Also found byte-swapped
//! (0xFE7F0180) and in 14-bit word packing (0x1FFFE800, 0xFF1F00E8).
//! **Extension substream** (0x64582025): DTS-HD / DTS Express header.
//! **FTOC sync** (0x40411BF2): synchronized DTS:X (UHD) frame.
//! **FTOC non-sync** (0x71C442E8): UHD frame that depends on state carried
//! from the previous synchronized frame.

use std::fmt::{Display, Formatter};

/// Core sync word, 16-bit big-endian words.
pub const SYNC_CORE_BE: u32 = 0x7F_FE_80_01;

/// Core sync word, 16-bit little-endian words.
pub const SYNC_CORE_LE: u32 = 0xFE_7F_01_80;

/// Core sync word, 14-bit big-endian words.
pub const SYNC_CORE_14B_BE: u32 = 0x1F_FF_E8_00;

/// Core sync word, 14-bit little-endian words.
pub const SYNC_CORE_14B_LE: u32 = 0xFF_1F_00_E8;

pub const SYNC_EXTSS: u32 = 0x64_58_20_25;

pub const SYNC_FTOC: u32 = 0x40_41_1B_F2;

pub const SYNC_FTOC_NON_SYNC: u32 = 0x71_C4_42_E8;

/// Length of every sync word, in bytes.
pub const SYNC_WORD_LEN: usize = 4;

/// Frame family, identified by the sync word that starts the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameFamily {
    Core,
    ExtensionSubstream,
    UhdSync,
    UhdNonSync,
}

impl FrameFamily {
    pub fn from_sync_word(word: u32) -> Option<Self> {
        if is_core_sync_word(word) {
            Some(Self::Core)
        } else if is_extension_substream_sync_word(word) {
            Some(Self::ExtensionSubstream)
        } else if is_uhd_ftoc_sync_word(word) {
            Some(Self::UhdSync)
        } else if is_uhd_ftoc_non_sync_word(word) {
            Some(Self::UhdNonSync)
        } else {
            None
        }
    }

    pub fn is_uhd(&self) -> bool {
        matches!(self, Self::UhdSync | Self::UhdNonSync)
    }
}

impl Display for FrameFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameFamily::Core => "core",
            FrameFamily::ExtensionSubstream => "extension substream",
            FrameFamily::UhdSync => "UHD sync",
            FrameFamily::UhdNonSync => "UHD non-sync",
        };

        f.write_str(name)
    }
}

pub fn is_core_sync_word(word: u32) -> bool {
    matches!(
        word,
        SYNC_CORE_BE | SYNC_CORE_LE | SYNC_CORE_14B_BE | SYNC_CORE_14B_LE
    )
}

pub fn is_extension_substream_sync_word(word: u32) -> bool {
    word == SYNC_EXTSS
}

pub fn is_uhd_ftoc_sync_word(word: u32) -> bool {
    word == SYNC_FTOC
}

pub fn is_uhd_ftoc_non_sync_word(word: u32) -> bool {
    word == SYNC_FTOC_NON_SYNC
}

#[test]
fn classify_sync_words() {
    for word in [SYNC_CORE_BE, SYNC_CORE_LE, SYNC_CORE_14B_BE, SYNC_CORE_14B_LE] {
        assert_eq!(FrameFamily::from_sync_word(word), Some(FrameFamily::Core));
    }
    assert_eq!(
        FrameFamily::from_sync_word(SYNC_EXTSS),
        Some(FrameFamily::ExtensionSubstream)
    );
    assert_eq!(
        FrameFamily::from_sync_word(SYNC_FTOC),
        Some(FrameFamily::UhdSync)
    );
    assert_eq!(
        FrameFamily::from_sync_word(SYNC_FTOC_NON_SYNC),
        Some(FrameFamily::UhdNonSync)
    );
    assert_eq!(FrameFamily::from_sync_word(0x7FFE_8000), None);
    assert_eq!(FrameFamily::from_sync_word(0), None);

    assert!(FrameFamily::UhdNonSync.is_uhd());
    assert!(!FrameFamily::Core.is_uhd());
}
