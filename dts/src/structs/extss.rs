//! Extension substream (DTS-HD) header.
//!
//! Only streams with a single audio presentation carrying a single asset are
//! supported, which covers DTS Express.

use crate::process::parse::ParserState;
use crate::structs::format::{CodecVariant, DecodedHeader, FrameGeometry};
use crate::structs::sync::{FrameFamily, SYNC_EXTSS};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

/// Bytes needed to read the header size: sync word, user bits, substream
/// index and the widest size field.
pub const EXTSS_SIZE_PREFIX_LEN: usize = 7;

/// Largest header the 12-bit size field can describe.
pub const EXTSS_HEADER_SIZE_MAX: usize = 1 << 12;

const SAMPLE_RATE_BY_INDEX: [u32; 16] = [
    8000, 16000, 32000, 64000, 128000, 22050, 44100, 88200, 176400, 352800, 12000, 24000, 48000,
    96000, 192000, 384000,
];

fn check_sync(reader: &mut BsIoSliceReader) -> Result<(), HeaderError> {
    match reader.get_n::<u32>(32)? {
        SYNC_EXTSS => Ok(()),
        word => Err(HeaderError::InvalidSyncWord(word)),
    }
}

/// Reads the total header size from the first [`EXTSS_SIZE_PREFIX_LEN`] bytes.
pub fn read_header_size(prefix: &[u8]) -> Result<usize, HeaderError> {
    if prefix.len() < EXTSS_SIZE_PREFIX_LEN {
        return Err(HeaderError::Truncated {
            family: FrameFamily::ExtensionSubstream,
            len: prefix.len(),
            min: EXTSS_SIZE_PREFIX_LEN,
        });
    }

    let reader = &mut BsIoSliceReader::from_slice(prefix);
    check_sync(reader)?;

    // UserDefinedBits, nExtSSIndex
    reader.skip_n(8 + 2)?;
    let size_bits = if reader.get()? { 12 } else { 8 };

    Ok(reader.get_n::<u32>(size_bits)? as usize + 1)
}

#[derive(Debug, Clone, Default)]
pub struct ExtssHeader {
    pub substream_index: u8,
    pub header_size: usize,
    pub frame_size: usize,
    pub static_fields: Option<StaticFields>,
    pub asset: AssetDescriptor,
}

/// Stream constants, present in every header of a stream or in none.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFields {
    pub reference_clock: u32,
    /// Frame duration in reference clock periods.
    pub frame_duration: u32,
    pub timestamp: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssetDescriptor {
    pub bit_resolution: Option<u8>,
    pub max_sample_rate: Option<u32>,
    pub channel_count: Option<u32>,
}

impl ExtssHeader {
    pub fn read(_state: &ParserState, header: &[u8]) -> Result<Self, HeaderError> {
        let reader = &mut BsIoSliceReader::from_slice(header);
        check_sync(reader)?;

        reader.skip_n(8)?;
        let substream_index = reader.get_n::<u8>(2)?;
        let (header_size_bits, frame_size_bits) = if reader.get()? { (12, 20) } else { (8, 16) };
        let header_size = reader.get_n::<u32>(header_size_bits)? as usize + 1;
        let frame_size = reader.get_n::<u32>(frame_size_bits)? as usize + 1;

        let static_fields = if reader.get()? {
            Some(Self::read_static_fields(reader, substream_index)?)
        } else {
            None
        };

        // nuAssetFsize, nuAssetDescriptFsize, nuAssetIndex
        reader.skip_n(frame_size_bits + 9 + 3)?;

        let mut asset = AssetDescriptor::default();
        if static_fields.is_some() {
            // bAssetTypeDescrPresent, nuAssetTypeDescriptor
            if reader.get()? {
                reader.skip_n(4)?;
            }
            // bLanguageDescrPresent, LanguageDescriptor
            if reader.get()? {
                reader.skip_n(24)?;
            }
            // bInfoTextPresent, nuInfoTextByteSize, InfoTextString
            if reader.get()? {
                let text_len = reader.get_n::<u32>(10)? + 1;
                reader.skip_n(text_len * 8)?;
            }

            asset.bit_resolution = Some(reader.get_n::<u8>(5)? + 1);
            asset.max_sample_rate = Some(SAMPLE_RATE_BY_INDEX[reader.get_n::<u8>(4)? as usize]);
            asset.channel_count = Some(reader.get_n::<u32>(8)? + 1);
        }

        Ok(Self {
            substream_index,
            header_size,
            frame_size,
            static_fields,
            asset,
        })
    }

    fn read_static_fields(
        reader: &mut BsIoSliceReader,
        substream_index: u8,
    ) -> Result<StaticFields, HeaderError> {
        let reference_clock = match reader.get_n::<u8>(2)? {
            0 => 32000,
            1 => 44100,
            2 => 48000,
            code => return Err(HeaderError::InvalidReferenceClock(code)),
        };
        let frame_duration = 512 * (reader.get_n::<u32>(3)? + 1);

        let timestamp = if reader.get()? {
            // nuTimeStamp, nLSB
            let high = reader.get_n::<u64>(32)?;
            let low = reader.get_n::<u64>(4)?;
            Some((high << 4) | low)
        } else {
            None
        };

        let presentations = reader.get_n::<u8>(3)? + 1;
        let assets = reader.get_n::<u8>(3)? + 1;
        if presentations > 1 || assets > 1 {
            return Err(HeaderError::MultipleAssets {
                presentations,
                assets,
            });
        }

        let active_substreams = reader.get_n::<u8>(substream_index as u32 + 1)?;
        for index in 0..=substream_index {
            if active_substreams >> index & 1 != 0 {
                // nuActiveAssetMask
                reader.skip_n(8)?;
            }
        }

        // bMixMetadataEnbl
        if reader.get()? {
            // nuMixMetadataAdjLevel
            reader.skip_n(2)?;
            let mask_bits = (reader.get_n::<u32>(2)? + 1) << 2;
            let configs = reader.get_n::<u32>(2)? + 1;
            reader.skip_n(mask_bits * configs)?;
        }

        Ok(StaticFields {
            reference_clock,
            frame_duration,
            timestamp,
        })
    }

    pub fn decoded(&self, chunk_id: u32) -> DecodedHeader {
        let (sample_count, sample_rate) = self
            .static_fields
            .map(|fields| (fields.frame_duration, fields.reference_clock))
            .unwrap_or_default();

        DecodedHeader {
            codec: CodecVariant::DtsExpress,
            channel_count: self.asset.channel_count,
            sample_rate: self.asset.max_sample_rate,
            bitrate: None,
            geometry: FrameGeometry {
                frame_size: self.frame_size,
                sample_count,
                sample_rate,
            },
            chunk_id,
        }
    }
}
