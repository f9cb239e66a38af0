//! Data structures representing DTS frame headers.
//!
//! Contains the sync word classification, the header layouts of the core,
//! extension substream and UHD frame families, and the format descriptor
//! published to track outputs.

pub mod core;
pub mod extss;
pub mod format;
pub mod sync;
pub mod uhd;
