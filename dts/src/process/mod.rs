/// Sync word detection.
///
/// Provides the [`SyncScanner`](scan::SyncScanner) that finds frame starts in
/// unaligned, arbitrarily chunked input.
pub mod scan;

/// Header decoding.
///
/// Provides the [`HeaderDecoder`](parse::HeaderDecoder) seam between the reader
/// and the header layouts, and its standard implementation
/// [`DtsHeaderDecoder`](parse::DtsHeaderDecoder).
pub mod parse;

/// Track registration and sample output.
pub mod output;

/// Incremental frame reader.
///
/// Provides the [`DtsReader`](reader::DtsReader) state machine that turns a
/// chunked elementary stream into timestamped samples.
pub mod reader;

#[cfg(test)]
pub(crate) mod test_streams;

/// A 96-byte core frame: 5.1 channels at 48 kHz, 512 samples, 768 kbit/s.
pub const EXAMPLE_CORE_FRAME: &[u8] = &[
    0x7F, 0xFE, 0x80, 0x01, 0xFC, 0x3C, 0x05, 0xF2, 0x75, 0xE0, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x29, 0x72, 0xBB, 0x09, 0x52, 0x9B, 0xE4, 0x32, 0x7B, 0xC4, 0x12, 0x5B, 0xA4, 0xED,
    0x3B, 0x84, 0xCD, 0x1B, 0x64, 0xAD, 0xF6, 0x44, 0x8D, 0xD6, 0x24, 0x6D, 0xB6, 0x04, 0x4D, 0x96,
    0xDF, 0x2D, 0x76, 0xBF, 0x0D, 0x56, 0x9F, 0xE8, 0x36, 0x7F, 0xC8, 0x16, 0x5F, 0xA8, 0xF1, 0x3F,
    0x88, 0xD1, 0x1F, 0x68, 0xB1, 0xFA, 0x48, 0x91, 0xDA, 0x28, 0x71, 0xBA, 0x08, 0x51, 0x9A, 0xE3,
    0x31, 0x7A, 0xC3, 0x11, 0x5A, 0xA3, 0xEC, 0x3A, 0x83, 0xCC, 0x1A, 0x63, 0xAC, 0xF5, 0x43, 0x8C,
];
