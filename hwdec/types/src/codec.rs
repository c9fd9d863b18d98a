/*!
    Codec identification.
*/

use std::fmt;

/**
    Codec families the decode session can drive.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
}

impl CodecId {
    /**
        Classify a codec name by substring.

        Anything containing `264` is H.264; anything containing `265`,
        `hevc` or `HEVC` is H.265. Returns `None` for every other name.
    */
    pub fn from_name(name: &str) -> Option<Self> {
        if name.contains("264") {
            Some(Self::H264)
        } else if name.contains("265") || name.contains("hevc") || name.contains("HEVC") {
            Some(Self::H265)
        } else {
            None
        }
    }

    /**
        Returns the short name of this codec family.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_h264() {
        assert_eq!(CodecId::from_name("h264"), Some(CodecId::H264));
        assert_eq!(CodecId::from_name("libx264"), Some(CodecId::H264));
        assert_eq!(CodecId::from_name("H264"), Some(CodecId::H264));
    }

    #[test]
    fn classify_hevc() {
        assert_eq!(CodecId::from_name("h265"), Some(CodecId::H265));
        assert_eq!(CodecId::from_name("hevc"), Some(CodecId::H265));
        assert_eq!(CodecId::from_name("HEVC"), Some(CodecId::H265));
        assert_eq!(CodecId::from_name("hevc_cuvid"), Some(CodecId::H265));
    }

    #[test]
    fn classify_unknown() {
        assert_eq!(CodecId::from_name("vp9"), None);
        assert_eq!(CodecId::from_name("Hevc"), None);
        assert_eq!(CodecId::from_name(""), None);
    }

    #[test]
    fn h264_wins_over_hevc_substrings() {
        // "264" is checked first
        assert_eq!(CodecId::from_name("hevc264"), Some(CodecId::H264));
    }
}
