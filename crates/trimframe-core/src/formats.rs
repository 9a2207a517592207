// crates/trimframe-core/src/formats.rs
//
// Container families, MIME parsing and RFC 6381 codec tokens.
//
// Only two output families exist: WebM and the MP4 family. Everything the
// capability probe and the recorder MIME selection need to know about them
// lives here so the ffmpeg backend only has to answer "is there an encoder".

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerFamily {
    WebM,
    Mp4,
}

impl ContainerFamily {
    /// Map a declared MIME type to its family. Parameters are ignored.
    ///
    /// ```
    /// use trimframe_core::formats::ContainerFamily;
    /// assert_eq!(ContainerFamily::from_mime("video/webm;codecs=vp9"), Some(ContainerFamily::WebM));
    /// assert_eq!(ContainerFamily::from_mime("video/quicktime"), Some(ContainerFamily::Mp4));
    /// assert_eq!(ContainerFamily::from_mime("video/ogg"), None);
    /// ```
    pub fn from_mime(mime: &str) -> Option<Self> {
        match MimeType::parse(mime).essence.as_str() {
            "video/webm" | "audio/webm" => Some(ContainerFamily::WebM),
            "video/mp4" | "audio/mp4" | "video/quicktime" | "video/x-m4v" | "video/3gpp" => {
                Some(ContainerFamily::Mp4)
            }
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ContainerFamily::WebM => "video/webm",
            ContainerFamily::Mp4  => "video/mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ContainerFamily::WebM => "webm",
            ContainerFamily::Mp4  => "mp4",
        }
    }

    /// The one codec string asked about when probing this family.
    pub fn probe_mime(self) -> &'static str {
        match self {
            ContainerFamily::WebM => "video/webm;codecs=vp8,opus",
            ContainerFamily::Mp4  => "video/mp4;codecs=avc1.42E01E,mp4a.40.2",
        }
    }

    /// Recorder MIME candidates for this family, most preferred first.
    pub fn recorder_candidates(self) -> &'static [&'static str] {
        match self {
            ContainerFamily::WebM => &[
                "video/webm;codecs=vp8",
                "video/webm;codecs=vp9",
                "video/webm",
            ],
            ContainerFamily::Mp4 => &[
                "video/mp4;codecs=avc1.42E01E",
                "video/mp4;codecs=h264",
                "video/mp4",
            ],
        }
    }

    /// Video codec used when a MIME names the container but no codecs.
    pub fn default_video_codec(self) -> CodecKind {
        match self {
            ContainerFamily::WebM => CodecKind::Vp8,
            ContainerFamily::Mp4  => CodecKind::H264,
        }
    }

    pub fn accepts(self, codec: CodecKind) -> bool {
        use CodecKind::*;
        match self {
            ContainerFamily::WebM => matches!(codec, Vp8 | Vp9 | Av1 | Opus | Vorbis),
            ContainerFamily::Mp4  => matches!(codec, H264 | Av1 | Vp9 | Aac | Opus),
        }
    }
}

impl std::fmt::Display for ContainerFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecKind {
    Vp8,
    Vp9,
    Av1,
    H264,
    Opus,
    Vorbis,
    Aac,
}

impl CodecKind {
    /// Parse one RFC 6381 codec token (`avc1.42E01E`, `vp09.00.10.08`, `mp4a.40.2`).
    pub fn from_token(token: &str) -> Option<Self> {
        let t = token.trim().to_ascii_lowercase();
        let head = t.split('.').next().unwrap_or("");
        match head {
            "vp8" => Some(CodecKind::Vp8),
            "vp9" | "vp09" => Some(CodecKind::Vp9),
            "av1" | "av01" => Some(CodecKind::Av1),
            "avc1" | "avc3" | "h264" => Some(CodecKind::H264),
            "opus" => Some(CodecKind::Opus),
            "vorbis" => Some(CodecKind::Vorbis),
            "mp4a" | "aac" => Some(CodecKind::Aac),
            _ => None,
        }
    }

    pub fn is_video(self) -> bool {
        matches!(self, CodecKind::Vp8 | CodecKind::Vp9 | CodecKind::Av1 | CodecKind::H264)
    }
}

/// A parsed `type/subtype;codecs=a,b` string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MimeType {
    pub essence: String,
    /// Raw codec tokens, in declaration order. Empty when no `codecs=` parameter.
    pub codecs:  Vec<String>,
}

impl MimeType {
    /// ```
    /// use trimframe_core::formats::MimeType;
    /// let m = MimeType::parse("Video/MP4; codecs=\"avc1.42E01E, mp4a.40.2\"");
    /// assert_eq!(m.essence, "video/mp4");
    /// assert_eq!(m.codecs, vec!["avc1.42E01E", "mp4a.40.2"]);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let mut codecs = Vec::new();
        for param in parts {
            let Some((key, value)) = param.split_once('=') else { continue };
            if !key.trim().eq_ignore_ascii_case("codecs") { continue; }
            codecs = value
                .trim()
                .trim_matches('"')
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        Self { essence, codecs }
    }

    /// `None` if any codec token is unknown.
    pub fn codec_kinds(&self) -> Option<Vec<CodecKind>> {
        self.codecs.iter().map(|c| CodecKind::from_token(c)).collect()
    }

    /// Subtype without parameters, e.g. `"ogg"` for `video/ogg`.
    pub fn subtype(&self) -> &str {
        self.essence.split_once('/').map(|(_, s)| s).unwrap_or("")
    }
}
