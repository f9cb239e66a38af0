//! Core (DTS Coherent Acoustics) frame header.
//!
//! The header occupies the first 18 bytes of a core frame in every word mode.
//! Little-endian and 14-bit frames are normalized to big-endian 16-bit words
//! before the fields are read.

use log::Level::{Error, Warn};

use crate::log_or_err;
use crate::process::parse::ParserState;
use crate::structs::format::{CodecVariant, DecodedHeader, FrameGeometry};
use crate::structs::sync::{
    FrameFamily, SYNC_CORE_14B_BE, SYNC_CORE_14B_LE, SYNC_CORE_BE, SYNC_CORE_LE,
};
use crate::utils::bitstream_io::{BsIoSliceReader, normalize_frame};
use crate::utils::errors::HeaderError;

/// Size of the core header in bytes, sync word included.
pub const CORE_HEADER_SIZE: usize = 18;

const CHANNELS_BY_AMODE: [u32; 16] = [1, 2, 2, 2, 2, 3, 3, 4, 4, 5, 6, 6, 6, 7, 8, 8];

/// Zero marks a reserved SFREQ code.
const SAMPLE_RATE_BY_SFREQ: [u32; 16] = [
    0, 8000, 16000, 32000, 0, 0, 11025, 22050, 44100, 0, 0, 12000, 24000, 48000, 0, 0,
];

/// Codes 29..=31 are reserved.
const TWICE_BITRATE_KBPS_BY_RATE: [u32; 29] = [
    64, 112, 128, 192, 224, 256, 384, 448, 512, 640, 768, 896, 1024, 1152, 1280, 1536, 1920, 2048,
    2304, 2560, 2688, 2816, 2823, 2944, 3072, 3840, 4096, 6144, 7680,
];

/// Word packing of a core frame, given by its sync word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordMode {
    Be16,
    Le16,
    Be14,
    Le14,
}

impl WordMode {
    pub fn from_sync_word(word: u32) -> Option<Self> {
        match word {
            SYNC_CORE_BE => Some(Self::Be16),
            SYNC_CORE_LE => Some(Self::Le16),
            SYNC_CORE_14B_BE => Some(Self::Be14),
            SYNC_CORE_14B_LE => Some(Self::Le14),
            _ => None,
        }
    }

    pub fn is_14_bit(&self) -> bool {
        matches!(self, Self::Be14 | Self::Le14)
    }
}

#[derive(Debug, Clone)]
pub struct CoreHeader {
    pub word_mode: WordMode,
    /// FTYPE: set for normal frames, clear for termination frames.
    pub normal_frame: bool,
    /// SHORT: deficit sample count.
    pub deficit_samples: u8,
    pub crc_present: bool,
    /// NBLKS: number of 32-sample PCM blocks, minus one.
    pub blocks: u8,
    /// FSIZE: frame size in bytes, minus one.
    pub frame_size_code: u16,
    pub amode: u8,
    pub sfreq: u8,
    pub rate: u8,
    /// LFF: low frequency effects flag.
    pub lfe: u8,

    pub channel_count: u32,
    pub sample_rate: u32,
    pub bitrate: Option<u32>,
}

impl CoreHeader {
    pub fn read(state: &ParserState, header: &[u8]) -> Result<Self, HeaderError> {
        if header.len() < CORE_HEADER_SIZE {
            return Err(HeaderError::Truncated {
                family: FrameFamily::Core,
                len: header.len(),
                min: CORE_HEADER_SIZE,
            });
        }

        let sync_word = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let word_mode =
            WordMode::from_sync_word(sync_word).ok_or(HeaderError::InvalidSyncWord(sync_word))?;

        let normalized = normalize_frame(&header[..CORE_HEADER_SIZE])?;
        let reader = &mut BsIoSliceReader::from_slice(&normalized);

        reader.skip_n(32)?;
        let normal_frame = reader.get()?;
        let deficit_samples = reader.get_n::<u8>(5)?;
        let crc_present = reader.get()?;
        let blocks = reader.get_n::<u8>(7)?;
        let frame_size_code = reader.get_n::<u16>(14)?;
        let amode = reader.get_n::<u8>(6)?;
        let sfreq = reader.get_n::<u8>(4)?;
        let rate = reader.get_n::<u8>(5)?;
        // MIX DYNF TIMEF AUXF HDCD EXT_AUDIO_ID(3) EXT_AUDIO ASPF
        reader.skip_n(10)?;
        let lfe = reader.get_n::<u8>(2)?;

        if blocks < 5 {
            log_or_err!(state, Warn, HeaderError::CoreBlockCountTooLow(blocks));
        }

        if frame_size_code < 95 {
            log_or_err!(state, Warn, HeaderError::CoreFrameSizeTooLow(frame_size_code));
        }

        let Some(&channels) = CHANNELS_BY_AMODE.get(amode as usize) else {
            return Err(HeaderError::InvalidChannelArrangement(amode));
        };
        let channel_count = channels + u32::from(lfe != 0);

        let sample_rate = SAMPLE_RATE_BY_SFREQ[sfreq as usize];
        if sample_rate == 0 {
            log_or_err!(state, Error, HeaderError::InvalidCoreSampleRate(sfreq));
        }

        let bitrate = match TWICE_BITRATE_KBPS_BY_RATE.get(rate as usize) {
            Some(&twice_kbps) => Some(twice_kbps * 1000 / 2),
            None => {
                log_or_err!(state, Warn, HeaderError::InvalidCoreBitrate(rate));
                None
            }
        };

        Ok(Self {
            word_mode,
            normal_frame,
            deficit_samples,
            crc_present,
            blocks,
            frame_size_code,
            amode,
            sfreq,
            rate,
            lfe,
            channel_count,
            sample_rate,
            bitrate,
        })
    }

    /// Frame size in bytes as stored in the stream.
    pub fn frame_size(&self) -> usize {
        let size = self.frame_size_code as usize + 1;
        if self.word_mode.is_14_bit() {
            size * 16 / 14
        } else {
            size
        }
    }

    pub fn sample_count(&self) -> u32 {
        (self.blocks as u32 + 1) * 32
    }

    pub fn decoded(&self, chunk_id: u32) -> DecodedHeader {
        DecodedHeader {
            codec: CodecVariant::Dts,
            channel_count: Some(self.channel_count),
            sample_rate: Some(self.sample_rate),
            bitrate: self.bitrate,
            geometry: FrameGeometry {
                frame_size: self.frame_size(),
                sample_count: self.sample_count(),
                sample_rate: self.sample_rate,
            },
            chunk_id,
        }
    }
}
