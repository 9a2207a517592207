// crates/trimframe-media/src/host/fake.rs
//
// Scripted MediaHost for tests. No decoding: the element reports the
// metadata of a `FakeSource`, its playhead advances one frame interval per
// clock tick, and every resource acquisition/release is counted so tests
// can assert cleanup and ordering.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use trimframe_core::{
    Blob, CodecSupport, ContainerFamily, MediaError, Result, ThumbnailFormat,
};

use super::{
    CapabilityQuery, FrameClock, ImageEncoder, MediaHost, Recorder, RecorderOptions, Surface,
    VideoElement, VideoMetadata,
};

#[derive(Clone, Debug)]
pub struct FakeSource {
    pub duration:     f64,
    pub width:        u32,
    pub height:       u32,
    pub fail_load:    bool,
    /// Zero-based index of the seek that fails.
    pub fail_seek_at: Option<usize>,
    /// Zero-based index of the captured frame that fails.
    pub fail_capture_at: Option<usize>,
    /// `None` = no capability API at all.
    pub support:      Option<CodecSupport>,
    /// MIME the recorder reports after stopping, if it refines the requested one.
    pub recorded_mime: Option<String>,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self {
            duration:        10.0,
            width:           1920,
            height:          1080,
            fail_load:       false,
            fail_seek_at:    None,
            fail_capture_at: None,
            support:         Some(CodecSupport { webm: true, mp4: true }),
            recorded_mime:   None,
        }
    }
}

#[derive(Default)]
struct FakeState {
    elements_created:  usize,
    attached:          usize,
    seeks:             Vec<f64>,
    draws:             usize,
    yields:            usize,
    next_url:          usize,
    urls_created:      Vec<String>,
    revocations:       HashMap<String, usize>,
    recorders:         Vec<RecorderOptions>,
    captured:          usize,
    ticks:             u64,
    clock_fps:         u32,
    play_origin:       Option<(f64, u64)>,
    draw_sizes:        Vec<(u32, u32)>,
}

#[derive(Clone)]
pub struct FakeHost {
    source: FakeSource,
    caps:   Option<FakeCaps>,
    state:  Arc<Mutex<FakeState>>,
}

impl FakeHost {
    pub fn new(source: FakeSource) -> Self {
        let caps = source.support.map(|support| FakeCaps { support });
        Self { source, caps, state: Arc::new(Mutex::new(FakeState::default())) }
    }

    pub fn elements_created(&self) -> usize { self.state.lock().elements_created }
    pub fn attached_elements(&self) -> usize { self.state.lock().attached }
    pub fn seeks(&self) -> Vec<f64> { self.state.lock().seeks.clone() }
    pub fn draws(&self) -> usize { self.state.lock().draws }
    pub fn yields(&self) -> usize { self.state.lock().yields }
    pub fn recorders_created(&self) -> usize { self.state.lock().recorders.len() }
    pub fn recorder_options(&self) -> Vec<RecorderOptions> { self.state.lock().recorders.clone() }
    pub fn captured_frames(&self) -> usize { self.state.lock().captured }
    pub fn draw_sizes(&self) -> Vec<(u32, u32)> { self.state.lock().draw_sizes.clone() }
    pub fn urls_created(&self) -> Vec<String> { self.state.lock().urls_created.clone() }

    pub fn revocations(&self, url: &str) -> usize {
        self.state.lock().revocations.get(url).copied().unwrap_or(0)
    }
}

impl MediaHost for FakeHost {
    fn create_video_element(&self) -> Result<Box<dyn VideoElement>> {
        self.state.lock().elements_created += 1;
        Ok(Box::new(FakeElement {
            source:   self.source.clone(),
            state:    Arc::clone(&self.state),
            attached: false,
            time:     0.0,
            playing:  false,
        }))
    }

    fn create_image_encoder(&self, format: ThumbnailFormat, _quality: f32) -> Result<Box<dyn ImageEncoder>> {
        Ok(Box::new(FakeEncoder { format }))
    }

    fn create_recorder(&self, options: &RecorderOptions) -> Result<Box<dyn Recorder>> {
        self.state.lock().recorders.push(options.clone());
        Ok(Box::new(FakeRecorder {
            state:     Arc::clone(&self.state),
            fail_at:   self.source.fail_capture_at,
            mime:      self.source.recorded_mime.clone(),
            started:   false,
            frames:    0,
        }))
    }

    fn capabilities(&self) -> Option<&dyn CapabilityQuery> {
        self.caps.as_ref().map(|c| c as &dyn CapabilityQuery)
    }

    fn frame_clock(&self, fps: u32) -> Box<dyn FrameClock> {
        self.state.lock().clock_fps = fps;
        Box::new(FakeClock { state: Arc::clone(&self.state) })
    }

    fn create_object_url(&self, _blob: &Blob) -> Result<String> {
        let mut st = self.state.lock();
        st.next_url += 1;
        let url = format!("blob:fake/{}", st.next_url);
        st.urls_created.push(url.clone());
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        *self.state.lock().revocations.entry(url.to_string()).or_insert(0) += 1;
    }

    fn yield_now(&self) {
        self.state.lock().yields += 1;
    }
}

struct FakeCaps {
    support: CodecSupport,
}

impl CapabilityQuery for FakeCaps {
    fn is_type_supported(&self, mime: &str) -> bool {
        ContainerFamily::from_mime(mime)
            .map(|f| self.support.supports(f))
            .unwrap_or(false)
    }
}

struct FakeElement {
    source:   FakeSource,
    state:    Arc<Mutex<FakeState>>,
    attached: bool,
    time:     f64,
    playing:  bool,
}

impl VideoElement for FakeElement {
    fn load(&mut self, src: &str) -> Result<VideoMetadata> {
        if self.source.fail_load {
            return Err(MediaError::load(src, "network error"));
        }
        if !self.attached {
            self.attached = true;
            self.state.lock().attached += 1;
        }
        Ok(VideoMetadata {
            duration: self.source.duration,
            width:    self.source.width,
            height:   self.source.height,
        })
    }

    fn seek_to(&mut self, time: f64) -> Result<()> {
        let mut st = self.state.lock();
        if Some(st.seeks.len()) == self.source.fail_seek_at {
            st.seeks.push(time);
            return Err(MediaError::Seek { time, reason: "decode error".into() });
        }
        st.seeks.push(time);
        self.time = time.min(self.source.duration);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut st = self.state.lock();
        st.play_origin = Some((self.time, st.ticks));
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing {
            self.time = self.current_time();
            self.playing = false;
            self.state.lock().play_origin = None;
        }
    }

    fn current_time(&self) -> f64 {
        if !self.playing {
            return self.time;
        }
        let st = self.state.lock();
        match st.play_origin {
            Some((origin, tick0)) => {
                let fps = st.clock_fps.max(1) as f64;
                (origin + (st.ticks - tick0) as f64 / fps).min(self.source.duration)
            }
            None => self.time,
        }
    }

    fn ended(&self) -> bool {
        self.playing && self.current_time() >= self.source.duration
    }

    fn draw_to(&mut self, surface: &mut Surface) -> Result<()> {
        let mut st = self.state.lock();
        st.draws += 1;
        st.draw_sizes.push((surface.width(), surface.height()));
        Ok(())
    }

    fn detach(&mut self) {
        if self.attached {
            self.attached = false;
            self.state.lock().attached -= 1;
        }
    }

    fn has_source(&self) -> bool {
        self.attached
    }
}

struct FakeEncoder {
    format: ThumbnailFormat,
}

impl ImageEncoder for FakeEncoder {
    fn mime(&self) -> &'static str {
        self.format.mime()
    }

    fn encode(&mut self, surface: &Surface) -> Result<Vec<u8>> {
        Ok(format!("img{}x{}", surface.width(), surface.height()).into_bytes())
    }
}

struct FakeRecorder {
    state:   Arc<Mutex<FakeState>>,
    fail_at: Option<usize>,
    mime:    Option<String>,
    started: bool,
    frames:  usize,
}

impl Recorder for FakeRecorder {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn capture(&mut self, _surface: &Surface) -> Result<()> {
        if !self.started {
            return Err(MediaError::Recorder("capture before start".into()));
        }
        if Some(self.frames) == self.fail_at {
            return Err(MediaError::Recorder("encoder crashed".into()));
        }
        self.frames += 1;
        self.state.lock().captured += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<Vec<u8>>> {
        // One chunk per second of 30 fps material, like a timesliced recorder.
        Ok((0..self.frames.div_ceil(30)).map(|i| vec![i as u8; 4]).collect())
    }

    fn mime_type(&self) -> Option<String> {
        self.mime.clone()
    }
}

struct FakeClock {
    state: Arc<Mutex<FakeState>>,
}

impl FrameClock for FakeClock {
    fn wait_next_frame(&mut self) {
        self.state.lock().ticks += 1;
    }
}
