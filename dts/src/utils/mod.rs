//! Utility functions and supporting infrastructure.
//!
//! Provides bitstream I/O, CRC validation, error handling, header
//! accumulation and presentation time tracking.

pub mod bitstream_io;
pub mod crc;
pub mod errors;
pub mod scratch;
pub mod timing;
