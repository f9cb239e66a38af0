use crate::structs::sync::FrameFamily;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("Header bitstream read failed: {0}")]
    Bitstream(#[from] std::io::Error),

    #[error("Not a DTS sync word: {0:#010X}")]
    InvalidSyncWord(u32),

    #[error("Header of {family} frame too short: {len} bytes, need {min}")]
    Truncated {
        family: FrameFamily,
        len: usize,
        min: usize,
    },

    #[error("Core NBLKS must be at least 5. Read {0}")]
    CoreBlockCountTooLow(u8),

    #[error("Core FSIZE must be at least 95. Read {0}")]
    CoreFrameSizeTooLow(u16),

    #[error("Reserved core AMODE {0}: user defined channel arrangements are not supported")]
    InvalidChannelArrangement(u8),

    #[error("Reserved core SFREQ {0}")]
    InvalidCoreSampleRate(u8),

    #[error("Reserved core RATE {0}")]
    InvalidCoreBitrate(u8),

    #[error("Multiple audio presentations or assets not supported: {presentations} presentations, {assets} assets")]
    MultipleAssets { presentations: u8, assets: u8 },

    #[error("Unsupported reference clock code in extension substream header: {0}")]
    InvalidReferenceClock(u8),

    #[error("UHD header size {size} does not cover its own size field ({min} bytes)")]
    UhdHeaderSizeTooSmall { size: usize, min: usize },

    #[error("FTOC CRC check failed. Residue {0:#06X}")]
    FtocCrcMismatch(u16),

    #[error("Only full channel mask based audio presentations are supported")]
    PartialChannelMix,

    #[error("Unsupported base duration index in UHD header: {0}")]
    InvalidBaseDuration(u8),

    #[error("Unsupported clock rate index in UHD header: {0}")]
    InvalidClockRate(u8),
}

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("{family} header size {size} outside {min}..={max}")]
    HeaderSizeOutOfRange {
        family: FrameFamily,
        size: usize,
        min: usize,
        max: usize,
    },

    #[error("Frame size {size} outside {min}..={max}")]
    FrameSizeOutOfRange { size: usize, min: usize, max: usize },

    #[error("create_tracks must be called before consuming data")]
    TracksNotCreated,

    #[error("generate_new_id must be called before reading track ids")]
    TrackIdNotGenerated,

    #[error("Track output failed: {0}")]
    Output(#[from] anyhow::Error),
}
