// crates/trimframe-media/src/worker.rs
//
// MediaWorker: runs sampling and export jobs on background threads.
// Callers submit a job, get its id back immediately, and read progress and
// the final result from `rx`.
//
// Sampling jobs are throttled to SAMPLE_CONCURRENCY at a time; each one holds
// a decoder and an image encoder, and a burst of them would thrash. Exports
// are not throttled: each one records in real time, so queueing would stretch
// its wall-clock duration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use trimframe_core::{
    Blob, CancelToken, CodecSupport, ExportConfig, MediaError, MediaResult, SamplerConfig,
    SamplingRequest, TrimRange,
};

use crate::host::MediaHost;
use crate::probe::check_codec_support;
use crate::processor::VideoProcessor;
use crate::sampler::FrameSampler;

/// Max sampling jobs decoding at once.
pub const SAMPLE_CONCURRENCY: u32 = 4;

/// Export progress is reported every this many captured frames.
const PROGRESS_INTERVAL: u32 = 15;

type Semaphore = Arc<(Mutex<u32>, Condvar)>;

/// Releases one semaphore slot and wakes the next waiter on drop.
struct SemGuard(Semaphore);

impl SemGuard {
    fn acquire(sem: Semaphore, limit: u32) -> Self {
        {
            let (lock, cvar) = &*sem;
            let mut count = lock.lock();
            while *count >= limit {
                cvar.wait(&mut count);
            }
            *count += 1;
        }
        SemGuard(sem)
    }
}

impl Drop for SemGuard {
    fn drop(&mut self) {
        let (lock, cvar) = &*self.0;
        *lock.lock() -= 1;
        cvar.notify_one();
    }
}

pub struct MediaWorker {
    /// Progress and results for every job, tagged with its job id.
    pub rx:         Receiver<MediaResult>,
    tx:             Sender<MediaResult>,
    host:           Arc<dyn MediaHost>,
    sampler_config: SamplerConfig,
    export_config:  ExportConfig,
    shutdown:       Arc<AtomicBool>,
    sample_sem:     Semaphore,
    /// Per-job cancel tokens, removed when the job finishes.
    cancels:        Arc<Mutex<HashMap<Uuid, CancelToken>>>,
}

impl MediaWorker {
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self::with_config(host, SamplerConfig::default(), ExportConfig::default())
    }

    pub fn with_config(
        host:           Arc<dyn MediaHost>,
        sampler_config: SamplerConfig,
        export_config:  ExportConfig,
    ) -> Self {
        let (tx, rx) = bounded(512);
        Self {
            rx,
            tx,
            host,
            sampler_config,
            export_config,
            shutdown:   Arc::new(AtomicBool::new(false)),
            sample_sem: Arc::new((Mutex::new(0), Condvar::new())),
            cancels:    Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Which container families this host can record.
    pub fn check_codec_support(&self) -> CodecSupport {
        check_codec_support(&*self.host)
    }

    /// Sample thumbnails from `request.source` in the background.
    /// Sends `SampleProgress` per chunk, then `Frames` or `Error`.
    pub fn get_frames(&self, request: SamplingRequest) -> Uuid {
        let job_id = Uuid::new_v4();
        let cancel = self.register(job_id);
        let tx      = self.tx.clone();
        let host    = Arc::clone(&self.host);
        let config  = self.sampler_config.clone();
        let sem     = Arc::clone(&self.sample_sem);
        let cancels = Arc::clone(&self.cancels);

        thread::spawn(move || {
            let _guard = SemGuard::acquire(sem, SAMPLE_CONCURRENCY);
            let sampler = FrameSampler::new(&*host).with_config(config);
            let progress_tx = tx.clone();
            let result = sampler.get_frames_with(&request, &cancel, &mut |done, total| {
                let _ = progress_tx.send(MediaResult::SampleProgress { job_id, done, total });
            });
            let msg = match result {
                Ok(frames) => MediaResult::Frames { job_id, frames },
                Err(error) => MediaResult::Error { job_id, error },
            };
            cancels.lock().remove(&job_id);
            let _ = tx.send(msg);
        });
        debug!("[worker] sampling job {job_id} queued");
        job_id
    }

    /// Record `range` of `source` in the background.
    /// Sends `ExportProgress` periodically, then `ExportDone` or `Error`.
    pub fn trim_video(&self, range: TrimRange, source: Blob) -> Uuid {
        let job_id = Uuid::new_v4();
        let cancel = self.register(job_id);
        let tx      = self.tx.clone();
        let host    = Arc::clone(&self.host);
        let config  = self.export_config.clone();
        let cancels = Arc::clone(&self.cancels);

        thread::spawn(move || {
            let mut processor = VideoProcessor::with_range(&*host, range).with_config(config);
            let progress_tx = tx.clone();
            let mut ticks: u32 = 0;
            let result = processor.trim_video_with(&source, &cancel, &mut |fraction| {
                ticks += 1;
                if ticks % PROGRESS_INTERVAL == 0 {
                    let _ = progress_tx.send(MediaResult::ExportProgress { job_id, fraction });
                }
            });
            let msg = match result {
                Ok(blob)   => MediaResult::ExportDone { job_id, blob },
                Err(error) => MediaResult::Error { job_id, error },
            };
            cancels.lock().remove(&job_id);
            let _ = tx.send(msg);
        });
        debug!("[worker] export job {job_id} started");
        job_id
    }

    /// Signal the job identified by `job_id` to stop at its next check.
    /// It then reports `Error { error: Cancelled }`.
    pub fn cancel(&self, job_id: Uuid) {
        match self.cancels.lock().get(&job_id) {
            Some(token) => token.cancel(),
            None => warn!("[worker] cancel for unknown or finished job {job_id}"),
        }
    }

    /// Cancel every running job. Jobs submitted afterwards fail immediately.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for token in self.cancels.lock().values() {
            token.cancel();
        }
    }

    pub fn active_jobs(&self) -> usize {
        self.cancels.lock().len()
    }

    // Register the token before spawning so `cancel` never misses a job.
    fn register(&self, job_id: Uuid) -> CancelToken {
        let token = CancelToken::new();
        if self.shutdown.load(Ordering::Relaxed) {
            token.cancel();
        }
        self.cancels.lock().insert(job_id, token.clone());
        token
    }
}

impl Drop for MediaWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Block until the terminal result for `job_id` arrives, skipping its progress.
/// Messages for other jobs are pushed onto `others` in arrival order so the
/// caller can still handle them.
pub fn wait_for(
    rx:     &Receiver<MediaResult>,
    job_id: Uuid,
    others: &mut Vec<MediaResult>,
) -> Result<MediaResult, MediaError> {
    loop {
        let msg = rx.recv()
            .map_err(|_| MediaError::InvalidRequest("worker channel closed".into()))?;
        if msg.job_id() != job_id {
            others.push(msg);
            continue;
        }
        match msg {
            MediaResult::SampleProgress { .. } | MediaResult::ExportProgress { .. } => continue,
            done => return Ok(done),
        }
    }
}
