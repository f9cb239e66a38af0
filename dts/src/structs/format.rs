//! Track format descriptor and per-frame decode results.

use std::fmt::{Display, Formatter};

use crate::utils::timing::sample_count_to_duration_us;

/// Codec variant carried by a frame family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecVariant {
    /// Core DTS (DTS Coherent Acoustics).
    Dts,
    /// DTS Express (low bitrate), carried in extension substreams.
    DtsExpress,
    /// DTS:X profile 2, carried in UHD frames.
    DtsUhd,
}

impl CodecVariant {
    pub fn mime_type(&self) -> &'static str {
        match self {
            CodecVariant::Dts => "audio/vnd.dts",
            CodecVariant::DtsExpress => "audio/vnd.dts.hd;profile=lbr",
            CodecVariant::DtsUhd => "audio/vnd.dts.uhd;profile=p2",
        }
    }
}

impl Display for CodecVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Format published to a track output.
///
/// Replaced, never mutated, when the stream parameters change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub id: String,
    pub codec: CodecVariant,
    pub channel_count: Option<u32>,
    pub sample_rate: Option<u32>,
    /// Average bitrate in bits per second, when the header declares one.
    pub bitrate: Option<u32>,
    pub language: Option<String>,
}

impl Format {
    pub fn from_header(id: &str, header: &DecodedHeader, language: Option<&str>) -> Self {
        Self {
            id: id.to_owned(),
            codec: header.codec,
            channel_count: header.channel_count,
            sample_rate: header.sample_rate,
            bitrate: header.bitrate,
            language: language.map(str::to_owned),
        }
    }

    /// Whether `header` describes the same codec, channel count and sample
    /// rate as this format.
    pub fn matches(&self, header: &DecodedHeader) -> bool {
        self.codec == header.codec
            && self.channel_count == header.channel_count
            && self.sample_rate == header.sample_rate
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.codec, self.id)?;
        if let Some(channels) = self.channel_count {
            write!(f, ", {channels} ch")?;
        }
        if let Some(rate) = self.sample_rate {
            write!(f, ", {rate} Hz")?;
        }
        if let Some(bitrate) = self.bitrate {
            write!(f, ", {bitrate} bps")?;
        }
        if let Some(language) = &self.language {
            write!(f, ", {language}")?;
        }

        Ok(())
    }
}

/// Size and timing of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Total frame size in bytes, header included.
    pub frame_size: usize,
    /// PCM samples per frame at `sample_rate`.
    pub sample_count: u32,
    /// Rate the sample count is expressed in. Zero when unknown.
    pub sample_rate: u32,
}

impl FrameGeometry {
    pub fn duration_us(&self) -> i64 {
        sample_count_to_duration_us(self.sample_count, self.sample_rate)
    }
}

/// Everything a header decoder extracts from one complete frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    pub codec: CodecVariant,
    pub channel_count: Option<u32>,
    pub sample_rate: Option<u32>,
    pub bitrate: Option<u32>,
    pub geometry: FrameGeometry,
    /// UHD audio chunk id to carry into the next frame. Frames of other
    /// families hand the incoming id back unchanged.
    pub chunk_id: u32,
}

#[test]
fn format_matches_ignores_bitrate_and_language() {
    let header = DecodedHeader {
        codec: CodecVariant::Dts,
        channel_count: Some(6),
        sample_rate: Some(48_000),
        bitrate: Some(768_000),
        geometry: FrameGeometry {
            frame_size: 96,
            sample_count: 512,
            sample_rate: 48_000,
        },
        chunk_id: 0,
    };
    let format = Format::from_header("1/256", &header, Some("eng"));
    assert_eq!(
        format.to_string(),
        "audio/vnd.dts [1/256], 6 ch, 48000 Hz, 768000 bps, eng"
    );

    let higher_bitrate = DecodedHeader {
        bitrate: Some(1_536_000),
        ..header.clone()
    };
    assert!(format.matches(&higher_bitrate));

    let stereo = DecodedHeader {
        channel_count: Some(2),
        ..header
    };
    assert!(!format.matches(&stereo));
}
