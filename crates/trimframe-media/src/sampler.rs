// crates/trimframe-media/src/sampler.rs
//
// Frame sampler: turns a video source into a bounded, ordered strip of
// encoded thumbnails.
//
// Flow (one call, one element):
//   load → plan instants → for each chunk { for each instant { seek, draw,
//   encode } yield } → detach
//
// The element and surface are created per call and never shared. Samples
// are processed strictly in order: each seek is awaited before the next is
// issued, so frames come out sorted by timestamp. Any failure drops every
// frame already produced; callers get the whole strip or an error.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info};

use trimframe_core::helpers::geometry::fit_within;
use trimframe_core::helpers::time::{frame_id, SamplePlan};
use trimframe_core::{CancelToken, Frame, MediaError, Result, SamplerConfig, SamplingRequest};

use crate::host::{MediaHost, ScopedElement, Surface};

pub struct FrameSampler<'h> {
    host:   &'h dyn MediaHost,
    config: SamplerConfig,
}

impl<'h> FrameSampler<'h> {
    pub fn new(host: &'h dyn MediaHost) -> Self {
        Self { host, config: SamplerConfig::default() }
    }

    pub fn with_config(mut self, config: SamplerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn get_frames(&self, request: &SamplingRequest, cancel: &CancelToken) -> Result<Vec<Frame>> {
        self.get_frames_with(request, cancel, &mut |_, _| {})
    }

    /// Like `get_frames`, calling `on_progress(done, total)` after each chunk.
    pub fn get_frames_with(
        &self,
        request:     &SamplingRequest,
        cancel:      &CancelToken,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<Frame>> {
        self.config.validate()?;
        cancel.check()?;

        let mut element = ScopedElement::new(self.host.create_video_element()?);
        let meta = element.load(&request.source)?;
        if !meta.duration.is_finite() {
            return Err(MediaError::load(&request.source, "source has no finite duration"));
        }

        let plan = SamplePlan::new(request, meta.duration, &self.config)?;
        let (width, height) = fit_within(meta.width, meta.height, self.config.max_dimension);
        debug!(
            "[sampler] {} frames over {:.2}s, step {:.3}s, surface {width}x{height} ← {}",
            plan.len(), plan.duration, plan.step(), request.source
        );

        let mut surface = Surface::new(width, height);
        let mut encoder = self
            .host
            .create_image_encoder(self.config.image_format, self.config.quality)?;
        let mime = encoder.mime();

        let total = plan.len();
        let mut frames: Vec<Frame> = Vec::with_capacity(total);
        for (chunk_idx, chunk) in plan.times.chunks(self.config.chunk_size).enumerate() {
            if chunk_idx > 0 {
                self.host.yield_now();
            }
            for &t in chunk {
                cancel.check()?;
                element.seek_to(t)?;
                element.draw_to(&mut surface)?;
                let bytes = encoder.encode(&surface)?;
                frames.push(Frame {
                    id:     frame_id(t),
                    src:    data_url(mime, &bytes),
                    width:  surface.width(),
                    height: surface.height(),
                });
            }
            on_progress(frames.len(), total);
        }

        drop(element);
        info!("[sampler] {} frames ← {}", frames.len(), request.source);
        Ok(frames)
    }
}

/// `data:<mime>;base64,<payload>`
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
