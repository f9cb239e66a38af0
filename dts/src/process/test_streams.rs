//! Synthetic frames for tests.
//!
//! Payload bytes stay below 0x40 so they can double as noise that contains no
//! sync word.

use bitstream_io::{BigEndian, BitWrite, BitWriter};

use crate::structs::core::CORE_HEADER_SIZE;
use crate::structs::sync::{SYNC_CORE_BE, SYNC_EXTSS, SYNC_FTOC, SYNC_FTOC_NON_SYNC};
use crate::utils::crc::Crc16Ccitt;

type Writer = BitWriter<Vec<u8>, BigEndian>;

fn writer() -> Writer {
    BitWriter::new(Vec::new())
}

fn finish(mut w: Writer, len: usize) -> Vec<u8> {
    w.byte_align().unwrap();
    let mut bytes = w.into_writer();
    assert!(bytes.len() <= len, "{} header bytes do not fit in {len}", bytes.len());
    bytes.resize(len, 0);
    bytes
}

/// Writes a variable-length integer using its narrowest code.
fn write_var_int(w: &mut Writer, widths: [u32; 4], value: u32) {
    assert!(value < 1 << widths[0], "{value} needs a wider code");
    w.write_bit(false).unwrap();
    w.write_unsigned_var(widths[0], value).unwrap();
}

pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| ((i * 7 + seed as usize) % 0x3F) as u8)
        .collect()
}

/// Core frame with the given FSIZE+1, NBLKS, AMODE, SFREQ and LFF.
pub fn core_frame(frame_size: usize, blocks: u8, amode: u8, sfreq: u8, lfe: u8) -> Vec<u8> {
    let mut w = writer();
    w.write_unsigned_var(32, SYNC_CORE_BE).unwrap();
    w.write_bit(true).unwrap();
    w.write_unsigned_var(5, 31u8).unwrap();
    w.write_bit(false).unwrap();
    w.write_unsigned_var(7, blocks).unwrap();
    w.write_unsigned_var(14, (frame_size - 1) as u16).unwrap();
    w.write_unsigned_var(6, amode).unwrap();
    w.write_unsigned_var(4, sfreq).unwrap();
    w.write_unsigned_var(5, 15u8).unwrap();
    w.write_unsigned_var(10, 0u16).unwrap();
    w.write_unsigned_var(2, lfe).unwrap();

    let mut frame = finish(w, CORE_HEADER_SIZE);
    frame.extend(payload(frame_size - CORE_HEADER_SIZE, 1));
    frame
}

#[derive(Debug, Clone)]
pub struct ExtssFrame {
    pub header_size: usize,
    pub frame_size: usize,
    /// Frame duration is 512 * (code + 1) periods of a 48 kHz clock.
    pub duration_code: u32,
    pub sample_rate_index: u32,
    pub channel_count: u32,
    pub assets: u32,
}

impl Default for ExtssFrame {
    fn default() -> Self {
        Self {
            header_size: 24,
            frame_size: 64,
            duration_code: 0,
            sample_rate_index: 12,
            channel_count: 2,
            assets: 1,
        }
    }
}

pub fn extss_frame(params: &ExtssFrame) -> Vec<u8> {
    let mut w = writer();
    w.write_unsigned_var(32, SYNC_EXTSS).unwrap();
    w.write_unsigned_var(8, 0u8).unwrap();
    // Substream index 0, short size fields
    w.write_unsigned_var(2, 0u8).unwrap();
    w.write_bit(false).unwrap();
    w.write_unsigned_var(8, (params.header_size - 1) as u32).unwrap();
    w.write_unsigned_var(16, (params.frame_size - 1) as u32).unwrap();

    // Static fields: 48 kHz clock, no timestamp, one presentation
    w.write_bit(true).unwrap();
    w.write_unsigned_var(2, 2u8).unwrap();
    w.write_unsigned_var(3, params.duration_code).unwrap();
    w.write_bit(false).unwrap();
    w.write_unsigned_var(3, 0u8).unwrap();
    w.write_unsigned_var(3, params.assets - 1).unwrap();
    w.write_unsigned_var(1, 1u8).unwrap();
    w.write_unsigned_var(8, 1u8).unwrap();
    w.write_bit(false).unwrap();

    // Asset descriptor
    w.write_unsigned_var(16, (params.frame_size - params.header_size) as u32)
        .unwrap();
    w.write_unsigned_var(9, 0u16).unwrap();
    w.write_unsigned_var(3, 0u8).unwrap();
    w.write_bit(false).unwrap();
    w.write_bit(false).unwrap();
    w.write_bit(false).unwrap();
    w.write_unsigned_var(5, 23u8).unwrap();
    w.write_unsigned_var(4, params.sample_rate_index).unwrap();
    w.write_unsigned_var(8, params.channel_count - 1).unwrap();

    let mut frame = finish(w, params.header_size);
    frame.extend(payload(params.frame_size - params.header_size, 2));
    frame
}

#[derive(Debug, Clone)]
pub struct UhdSyncFrame {
    pub header_size: usize,
    pub metadata_size: u32,
    pub chunk_id: u32,
    /// Ignored when `chunk_id` is 0.
    pub audio_size: u32,
    /// Frame duration is 480 * (code + 1) samples at 48 kHz.
    pub duration_code: u32,
    /// Sample rate and count are scaled by `1 << rate_multiplier`.
    pub rate_multiplier: u32,
}

impl Default for UhdSyncFrame {
    fn default() -> Self {
        Self {
            header_size: 16,
            metadata_size: 8,
            chunk_id: 1,
            audio_size: 100,
            duration_code: 1,
            rate_multiplier: 0,
        }
    }
}

pub fn uhd_sync_frame(params: &UhdSyncFrame) -> Vec<u8> {
    let mut w = writer();
    w.write_unsigned_var(32, SYNC_FTOC).unwrap();
    write_var_int(&mut w, [5, 8, 10, 12], params.header_size as u32 - 1);

    // Full channel mix, 480 sample base duration, 48 kHz clock, no timestamp
    w.write_bit(true).unwrap();
    w.write_unsigned_var(2, 1u8).unwrap();
    w.write_unsigned_var(3, params.duration_code).unwrap();
    w.write_unsigned_var(2, 2u8).unwrap();
    w.write_bit(false).unwrap();
    w.write_unsigned_var(2, params.rate_multiplier).unwrap();

    write_var_int(&mut w, [6, 9, 12, 15], params.metadata_size);
    write_var_int(&mut w, [2, 4, 6, 8], params.chunk_id);
    let audio_size = if params.chunk_id != 0 {
        write_var_int(&mut w, [9, 11, 13, 16], params.audio_size);
        params.audio_size
    } else {
        0
    };

    let mut frame = finish(w, params.header_size - 2);
    let crc = Crc16Ccitt::checksum(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame.extend(payload((params.metadata_size + audio_size) as usize, 3));
    frame
}

/// Non-sync frame. `audio_size` must be set exactly when the carried audio
/// chunk id is non-zero.
pub fn uhd_non_sync_frame(header_size: usize, audio_size: Option<u32>) -> Vec<u8> {
    let mut w = writer();
    w.write_unsigned_var(32, SYNC_FTOC_NON_SYNC).unwrap();
    write_var_int(&mut w, [5, 8, 10, 12], header_size as u32 - 1);
    if let Some(size) = audio_size {
        write_var_int(&mut w, [9, 11, 13, 16], size);
    }

    let mut frame = finish(w, header_size);
    frame.extend(payload(audio_size.unwrap_or(0) as usize, 4));
    frame
}

#[test]
fn payload_has_no_sync_bytes() {
    assert!(payload(1000, 9).iter().all(|&byte| byte < 0x40));
}
