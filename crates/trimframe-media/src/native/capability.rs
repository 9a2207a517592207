// crates/trimframe-media/src/native/capability.rs
//
// "Can this MIME type be recorded" against the linked ffmpeg build.
//
// A type is supported when its container family has a muxer and every codec
// it names has an encoder the family accepts. A bare container MIME stands
// for the family's default video codec.

use std::ffi::CString;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::codec::Id as CodecId;
use ffmpeg::encoder;
use trimframe_core::{CodecKind, ContainerFamily, MimeType};

use crate::host::CapabilityQuery;

#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegCapabilities;

impl CapabilityQuery for FfmpegCapabilities {
    fn is_type_supported(&self, mime: &str) -> bool {
        let parsed = MimeType::parse(mime);
        let Some(family) = ContainerFamily::from_mime(&parsed.essence) else { return false };
        let Some(mut kinds) = parsed.codec_kinds() else { return false };
        if kinds.is_empty() {
            kinds.push(family.default_video_codec());
        }
        muxer_available(family)
            && kinds.iter().all(|k| family.accepts(*k) && encoder_available(*k))
    }
}

pub fn codec_id(kind: CodecKind) -> CodecId {
    match kind {
        CodecKind::Vp8    => CodecId::VP8,
        CodecKind::Vp9    => CodecId::VP9,
        CodecKind::Av1    => CodecId::AV1,
        CodecKind::H264   => CodecId::H264,
        CodecKind::Opus   => CodecId::OPUS,
        CodecKind::Vorbis => CodecId::VORBIS,
        CodecKind::Aac    => CodecId::AAC,
    }
}

pub fn encoder_available(kind: CodecKind) -> bool {
    encoder::find(codec_id(kind)).is_some()
}

pub fn muxer_available(family: ContainerFamily) -> bool {
    let Ok(name) = CString::new(family.extension()) else { return false };
    unsafe {
        !ffmpeg::ffi::av_guess_format(name.as_ptr(), std::ptr::null(), std::ptr::null()).is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_families_and_codecs_are_rejected() {
        ffmpeg::init().unwrap();
        let caps = FfmpegCapabilities;
        assert!(!caps.is_type_supported("video/ogg"));
        assert!(!caps.is_type_supported("video/webm;codecs=theora"));
        assert!(!caps.is_type_supported("video/webm;codecs=avc1.42E01E"));
        assert!(!caps.is_type_supported(""));
    }

    #[test]
    fn bare_mime_matches_its_default_codec() {
        ffmpeg::init().unwrap();
        let caps = FfmpegCapabilities;
        for family in [ContainerFamily::WebM, ContainerFamily::Mp4] {
            let codec = family.default_video_codec();
            assert_eq!(
                caps.is_type_supported(family.mime()),
                muxer_available(family) && encoder_available(codec),
                "{family}",
            );
        }
    }
}
