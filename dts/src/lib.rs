#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! ### Frame Families
//!
//! - **Core**: DTS Coherent Acoustics frames with a fixed 18-byte header, in
//!   16-bit or 14-bit words of either byte order
//! - **Extension substream**: DTS-HD headers of up to 4096 bytes, whose size
//!   is read from the first 7 bytes
//! - **UHD**: DTS:X frames starting with a frame table of contents (FTOC) of
//!   up to 5408 bytes. Sync frames carry the stream parameters, non-sync
//!   frames depend on the preceding sync frame
//!
//! ### Reading
//!
//! [`process::reader::DtsReader`] is a state machine that scans for sync
//! words, accumulates headers across chunk boundaries, asks a
//! [`process::parse::HeaderDecoder`] for the header and frame sizes, and
//! streams the rest of the frame to the output. Sample timestamps come from
//! upstream packets and are extrapolated by frame duration in between.

/// Processing stages of the reader.
///
/// 1. **Sync Scanning** ([`process::scan`]): Rolling sync word detection.
///
/// 2. **Header Decoding** ([`process::parse`]): Header size discovery and
///    decoding per frame family.
///
/// 3. **Reading** ([`process::reader`]): The chunked frame reader.
///
/// 4. **Output** ([`process::output`]): Track registration and sample sinks.
pub mod process;

/// Data structures representing DTS header components.
///
/// - **Sync Words** ([`structs::sync`]): Frame family classification
/// - **Core** ([`structs::core`]): Core frame header
/// - **Extension Substream** ([`structs::extss`]): DTS-HD header
/// - **UHD** ([`structs::uhd`]): DTS:X frame table of contents
/// - **Format** ([`structs::format`]): Published track format
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **CRC Validation** ([`utils::crc`]): FTOC checksum
/// - **Error Handling** ([`utils::errors`]): Error types
/// - **Scratch Buffer** ([`utils::scratch`]): Header accumulation
/// - **Timing** ([`utils::timing`]): Sample timestamps
pub mod utils;
