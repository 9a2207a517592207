// crates/trimframe-media/src/native/mod.rs
//
// FfmpegHost: the MediaHost backed by the linked ffmpeg libraries.
//
// Object URLs are temp files: creating one writes the blob to disk and the
// returned URL is the file path, which any element can open. Revoking removes
// the registry entry, and dropping the NamedTempFile deletes the file.

use std::collections::HashMap;
use std::io::Write;

use ffmpeg_the_third as ffmpeg;
use log::{debug, warn};
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use trimframe_core::{Blob, MediaError, Result, ThumbnailFormat};

use crate::host::{
    CapabilityQuery, FrameClock, ImageEncoder, MediaHost, Recorder, RecorderOptions, VideoElement,
};
use crate::image::PngEncoder;

pub mod capability;
pub mod clock;
pub mod element;
pub mod jpeg;
pub mod recorder;
#[cfg(test)]
pub(crate) mod fixture;

pub use capability::FfmpegCapabilities;
pub use clock::RealtimeClock;
pub use element::FfmpegVideoElement;
pub use jpeg::JpegEncoder;
pub use recorder::FfmpegRecorder;

pub struct FfmpegHost {
    caps: FfmpegCapabilities,
    urls: Mutex<HashMap<String, NamedTempFile>>,
}

impl FfmpegHost {
    /// Initialise ffmpeg and build a host. Safe to call more than once.
    pub fn new() -> Result<Self> {
        ffmpeg::init()
            .map_err(|e| MediaError::Io(std::io::Error::other(format!("ffmpeg init: {e}"))))?;
        ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);
        Ok(Self { caps: FfmpegCapabilities, urls: Mutex::new(HashMap::new()) })
    }

    /// Object URLs currently alive.
    pub fn live_object_urls(&self) -> usize {
        self.urls.lock().len()
    }
}

impl MediaHost for FfmpegHost {
    fn create_video_element(&self) -> Result<Box<dyn VideoElement>> {
        Ok(Box::new(FfmpegVideoElement::new()))
    }

    fn create_image_encoder(&self, format: ThumbnailFormat, quality: f32) -> Result<Box<dyn ImageEncoder>> {
        match format {
            ThumbnailFormat::Jpeg => Ok(Box::new(JpegEncoder::new(quality)?)),
            ThumbnailFormat::Png  => Ok(Box::new(PngEncoder)),
        }
    }

    fn create_recorder(&self, options: &RecorderOptions) -> Result<Box<dyn Recorder>> {
        Ok(Box::new(FfmpegRecorder::new(options)?))
    }

    fn capabilities(&self) -> Option<&dyn CapabilityQuery> {
        Some(&self.caps)
    }

    fn frame_clock(&self, fps: u32) -> Box<dyn FrameClock> {
        Box::new(RealtimeClock::new(fps))
    }

    fn create_object_url(&self, blob: &Blob) -> Result<String> {
        let ext = blob.container_family().map(|f| f.extension()).unwrap_or("bin");
        let mut file = tempfile::Builder::new()
            .prefix("trimframe-src-")
            .suffix(&format!(".{ext}"))
            .tempfile()?;
        file.write_all(&blob.data)?;
        file.flush()?;
        let url = file.path().to_string_lossy().into_owned();
        debug!("[ffmpeg] object url {url} ({} bytes)", blob.size());
        self.urls.lock().insert(url.clone(), file);
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        if self.urls.lock().remove(url).is_none() {
            warn!("[ffmpeg] revoke of unknown object url {url}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::path::Path;
    use trimframe_core::{
        CancelToken, ContainerFamily, SamplerConfig, SamplingMode, SamplingRequest,
    };

    use crate::host::Surface;
    use crate::native::fixture::{self, container_secs, record_clip};
    use crate::processor::VideoProcessor;
    use crate::sampler::FrameSampler;

    #[test]
    fn object_urls_live_until_revoked() {
        let host = FfmpegHost::new().unwrap();
        let blob = Blob::new(vec![1, 2, 3, 4], "video/webm");
        let url = host.create_object_url(&blob).unwrap();
        assert!(url.ends_with(".webm"));
        assert_eq!(std::fs::read(&url).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(host.live_object_urls(), 1);

        host.revoke_object_url(&url);
        assert_eq!(host.live_object_urls(), 0);
        assert!(!std::path::Path::new(&url).exists());

        // Second revoke is a logged no-op.
        host.revoke_object_url(&url);
    }

    #[test]
    fn png_encoder_is_always_available() {
        let host = FfmpegHost::new().unwrap();
        let enc = host.create_image_encoder(ThumbnailFormat::Png, 0.8).unwrap();
        assert_eq!(enc.mime(), "image/png");
        assert!(host.capabilities().is_some());
    }

    #[test]
    fn samples_a_recorded_clip_as_jpeg_thumbnails() {
        let Some(clip) = record_clip(3.0) else { return };
        if JpegEncoder::new(0.8).is_err() {
            return;
        }
        let host = FfmpegHost::new().unwrap();
        let url = host.create_object_url(&clip).unwrap();
        let duration = container_secs(Path::new(&url));
        assert!((duration - 3.0).abs() < 0.1, "clip is {duration}s");

        let request = SamplingRequest::new(url.as_str(), 7.0, SamplingMode::TotalFrames);
        let frames = FrameSampler::new(&host).get_frames(&request, &CancelToken::new()).unwrap();

        assert_eq!(frames.len(), 7);
        assert_eq!(frames[0].id, "0.00");
        let last = frames[6].timestamp().unwrap();
        assert!((last - duration).abs() <= 0.005, "last frame at {last}, clip {duration}");
        for frame in &frames {
            assert_eq!((frame.width, frame.height), (fixture::WIDTH, fixture::HEIGHT));
            let payload = frame.src.strip_prefix("data:image/jpeg;base64,").unwrap();
            let jpeg = STANDARD.decode(payload).unwrap();
            assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        }
        host.revoke_object_url(&url);
    }

    #[test]
    fn png_thumbnails_decode_to_the_sampled_instant() {
        let Some(clip) = record_clip(2.0) else { return };
        let host = FfmpegHost::new().unwrap();
        let url = host.create_object_url(&clip).unwrap();
        let cfg = SamplerConfig { image_format: ThumbnailFormat::Png, ..Default::default() };
        let request = SamplingRequest::new(url.as_str(), 2.0, SamplingMode::Fps);
        let frames = FrameSampler::new(&host)
            .with_config(cfg)
            .get_frames(&request, &CancelToken::new())
            .unwrap();

        for frame in &frames {
            let payload = frame.src.strip_prefix("data:image/png;base64,").unwrap();
            let png = STANDARD.decode(payload).unwrap();
            let mut reader = png::Decoder::new(png.as_slice()).read_info().unwrap();
            let mut buf = vec![0; reader.output_buffer_size()];
            reader.next_frame(&mut buf).unwrap();
            let mut surface = Surface::new(frame.width, frame.height);
            surface.pixels_mut().copy_from_slice(&buf[..surface.pixels().len()]);

            let t = frame.timestamp().unwrap();
            let level = fixture::mean_level(&surface);
            // One frame interval is two grey levels; allow a few for the codec.
            assert!((level - fixture::level_at(t)).abs() <= 8.0, "{} at level {level}", frame.id);
        }
        host.revoke_object_url(&url);
    }

    #[test]
    fn trimmed_webm_lasts_the_requested_range() {
        let Some(clip) = record_clip(3.0) else { return };
        let host = FfmpegHost::new().unwrap();
        let mut processor = VideoProcessor::new(&host, 1.0, 2.0).unwrap();
        let out = processor.trim_video(&clip, &CancelToken::new()).unwrap();

        assert_eq!(out.container_family(), Some(ContainerFamily::WebM));
        assert_eq!(host.live_object_urls(), 0);

        let mut file = tempfile::Builder::new().suffix(".webm").tempfile().unwrap();
        file.write_all(&out.data).unwrap();
        file.flush().unwrap();
        let secs = container_secs(file.path());
        assert!((secs - 1.0).abs() <= 1.0 / 30.0 + 0.02, "trimmed output is {secs}s");
    }
}
