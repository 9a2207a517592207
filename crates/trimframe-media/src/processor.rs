// crates/trimframe-media/src/processor.rs
//
// Trim/export engine: re-records the [start, end] range of a source blob
// into a new encoded blob.
//
// The only capture primitive is "record a live, rendered stream", so a trim
// is a real-time re-recording at playback speed: the element plays from
// `start`, every render tick paints the playhead frame onto a surface, and
// the recorder captures the surface at a fixed frame rate until the
// playhead reaches `end`. An export therefore takes at least `end - start`
// seconds of wall time.
//
// State machine per call:
//   Idle → LoadingMetadata → Recording → Stopped
//                 └──────────────┴──────→ Failed
//
// Codec gating happens before any element, URL or recorder exists. Every
// later failure drops the recorder, revokes the object URL and detaches
// the element; no partial blob is ever returned.

use log::{debug, info, warn};

use trimframe_core::{
    Blob, CancelToken, CodecSupport, ContainerFamily, ExportConfig, FallbackPolicy, MediaError,
    MimeType, Result, TrimRange,
};

use crate::host::{MediaHost, ObjectUrlGuard, RecorderOptions, ScopedElement, Surface};
use crate::probe::check_codec_support;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    LoadingMetadata,
    Recording,
    Stopped,
    Failed,
}

pub struct VideoProcessor<'h> {
    host:   &'h dyn MediaHost,
    range:  TrimRange,
    config: ExportConfig,
    state:  ExportState,
}

impl<'h> VideoProcessor<'h> {
    pub fn new(host: &'h dyn MediaHost, start_seconds: f64, end_seconds: f64) -> Result<Self> {
        Ok(Self::with_range(host, TrimRange::new(start_seconds, end_seconds)?))
    }

    pub fn with_range(host: &'h dyn MediaHost, range: TrimRange) -> Self {
        Self { host, range, config: ExportConfig::default(), state: ExportState::Idle }
    }

    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    /// Whether any recordable container exists at all, independent of input.
    pub fn check_support(host: &dyn MediaHost) -> bool {
        check_codec_support(host).any()
    }

    pub fn trim_video(&mut self, source: &Blob, cancel: &CancelToken) -> Result<Blob> {
        self.trim_video_with(source, cancel, &mut |_| {})
    }

    /// Like `trim_video`, calling `on_progress(fraction)` after each captured frame.
    pub fn trim_video_with(
        &mut self,
        source:      &Blob,
        cancel:      &CancelToken,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<Blob> {
        self.state = ExportState::Idle;
        let result = self.run(source, cancel, on_progress);
        self.state = match &result {
            Ok(_)  => ExportState::Stopped,
            Err(e) => {
                warn!("[export] failed: {e}");
                ExportState::Failed
            }
        };
        result
    }

    fn run(
        &mut self,
        source:      &Blob,
        cancel:      &CancelToken,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<Blob> {
        self.config.validate()?;

        // ── Capability gate ──────────────────────────────────────────────────
        let support = check_codec_support(self.host);
        let family = resolve_output_family(&source.mime, support, self.config.fallback)?;
        let mime = self.select_recorder_mime(family);
        debug!("[export] input '{}' → recording as '{mime}'", source.mime);
        cancel.check()?;

        // ── Load ─────────────────────────────────────────────────────────────
        self.state = ExportState::LoadingMetadata;
        let url = ObjectUrlGuard::new(self.host, self.host.create_object_url(source)?);
        let mut element = ScopedElement::new(self.host.create_video_element()?);
        let meta = element.load(url.url())?;

        let range = self.range.fit_to(meta.duration)?;
        if range.end_seconds < self.range.end_seconds {
            warn!(
                "[export] end {:.3}s past source duration {:.3}s, clamped",
                self.range.end_seconds, meta.duration
            );
        }
        element.seek_to(range.start_seconds)?;

        // ── Recorder ─────────────────────────────────────────────────────────
        let mut surface = Surface::new(meta.width, meta.height);
        let options = RecorderOptions {
            mime_type:             mime.clone(),
            video_bits_per_second: self.config.video_bits_per_second,
            frame_rate:            self.config.frame_rate,
            width:                 surface.width(),
            height:                surface.height(),
        };
        let mut recorder = self.host.create_recorder(&options)?;
        let mut clock = self.host.frame_clock(self.config.frame_rate);

        self.state = ExportState::Recording;
        recorder.start()?;
        element.play()?;

        // ── Draw loop ────────────────────────────────────────────────────────
        let span = range.duration();
        let mut captured: u64 = 0;
        loop {
            cancel.check()?;
            let now = element.current_time();
            if now >= range.end_seconds || element.ended() {
                break;
            }
            element.draw_to(&mut surface)?;
            recorder.capture(&surface)?;
            captured += 1;
            on_progress((((now - range.start_seconds) / span) as f32).clamp(0.0, 1.0));
            clock.wait_next_frame();
        }
        element.pause();

        let chunks = recorder.stop()?;
        let blob = Blob::from_chunks(chunks, recorder.mime_type().unwrap_or(mime));
        if blob.is_empty() {
            return Err(MediaError::Recorder("recorder produced no data".into()));
        }
        on_progress(1.0);

        drop(element);
        url.revoke();
        info!(
            "[export] {:.2}s–{:.2}s → {} frames, {} bytes ({})",
            range.start_seconds, range.end_seconds, captured, blob.size(), blob.mime
        );
        Ok(blob)
    }

    /// First candidate of `family` the runtime accepts, else its probe string.
    fn select_recorder_mime(&self, family: ContainerFamily) -> String {
        let Some(query) = self.host.capabilities() else {
            return family.probe_mime().to_string();
        };
        family
            .recorder_candidates()
            .iter()
            .find(|c| query.is_type_supported(c))
            .map(|c| c.to_string())
            .unwrap_or_else(|| family.probe_mime().to_string())
    }
}

/// Decide which container the export records into.
///
/// Under `Strict` the input's own family must be recordable. Under
/// `AllowOtherContainer` an unrecordable (or unknown) input falls back to
/// any recordable family, MP4 first.
pub fn resolve_output_family(
    input_mime: &str,
    support:    CodecSupport,
    policy:     FallbackPolicy,
) -> Result<ContainerFamily> {
    let input = ContainerFamily::from_mime(input_mime);
    if let Some(family) = input {
        if support.supports(family) {
            return Ok(family);
        }
    }

    let format_name = match input {
        Some(family) => family.extension().to_string(),
        None => match MimeType::parse(input_mime).subtype() {
            "" => "unknown".to_string(),
            s  => s.to_string(),
        },
    };

    if policy == FallbackPolicy::AllowOtherContainer {
        let substitute = [ContainerFamily::Mp4, ContainerFamily::WebM]
            .into_iter()
            .find(|f| support.supports(*f));
        if let Some(family) = substitute {
            warn!("[export] {format_name} is not recordable here, recording as {family}");
            return Ok(family);
        }
    }
    Err(MediaError::unsupported(format_name))
}
