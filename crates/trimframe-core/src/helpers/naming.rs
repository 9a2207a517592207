// crates/trimframe-core/src/helpers/naming.rs
//
// Download name for an exported clip: `<stem>-trimmed.<ext>`.
// Object URLs and uploaded blobs often carry UUID-like names; those are
// replaced with a plain `video` stem.

use crate::formats::{ContainerFamily, MimeType};

/// ```
/// use trimframe_core::helpers::naming::trimmed_file_name;
/// assert_eq!(trimmed_file_name("clips/beach.mov", "video/mp4"), "beach-trimmed.mp4");
/// assert_eq!(
///     trimmed_file_name("blob:3f2a1c7e-8b9d-4e6f-a1b2-c3d4e5f6a7b8", "video/webm"),
///     "video-trimmed.webm",
/// );
/// ```
pub fn trimmed_file_name(source_name: &str, output_mime: &str) -> String {
    let base = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name);
    let base = base.rsplit_once(':').map(|(_, b)| b).unwrap_or(base);
    let stem = base.split('.').next().unwrap_or("");

    let stem = if stem.is_empty() || looks_generated(stem) { "video" } else { stem };

    let ext = match ContainerFamily::from_mime(output_mime) {
        Some(family) => family.extension().to_string(),
        None => {
            let m = MimeType::parse(output_mime);
            match m.subtype() {
                "" => ContainerFamily::Mp4.extension().to_string(),
                s  => s.to_string(),
            }
        }
    };
    format!("{stem}-trimmed.{ext}")
}

/// 32+ characters of hex digits and dashes: a UUID or hash, not a title.
fn looks_generated(stem: &str) -> bool {
    stem.len() >= 32 && stem.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_human_names() {
        assert_eq!(trimmed_file_name("holiday.webm", "video/webm"), "holiday-trimmed.webm");
        assert_eq!(trimmed_file_name("C:\\v\\cat.mp4", "video/mp4;codecs=avc1"), "cat-trimmed.mp4");
    }

    #[test]
    fn replaces_hash_names() {
        let name = "0123456789abcdef0123456789abcdef.mp4";
        assert_eq!(trimmed_file_name(name, "video/mp4"), "video-trimmed.mp4");
    }

    #[test]
    fn short_hex_is_kept() {
        assert_eq!(trimmed_file_name("cafe.mp4", "video/mp4"), "cafe-trimmed.mp4");
    }

    #[test]
    fn extension_follows_output_not_input() {
        assert_eq!(trimmed_file_name("clip.mp4", "video/webm"), "clip-trimmed.webm");
    }

    #[test]
    fn unknown_or_empty_mime() {
        assert_eq!(trimmed_file_name("clip.ogv", "video/ogg"), "clip-trimmed.ogg");
        assert_eq!(trimmed_file_name("", ""), "video-trimmed.mp4");
    }
}
