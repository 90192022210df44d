use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use eframe::egui;
use image::ImageReader;

/* ───────────────────────── channel caps ─────────────────────────── */

/// Full-image task queue depth. A full queue blocks the UI thread on
/// enqueue; that backpressure is deliberate, the backlog drains shortly.
pub const FULL_TASK_CAP: usize = 10;
/// Shared result queue depth (both workers publish here).
pub const RESULT_CAP: usize = 10;
/// Results merged per frame; keeps the render loop from stalling on a
/// burst of decode completions.
pub const RESULTS_PER_FRAME: usize = 10;

/* ───────────────────────── task / result types ──────────────────── */

/// Decoded RGBA pixels, not yet uploaded. Ownership moves to the UI
/// thread when the result is enqueued; the worker never touches it again.
pub struct Surface {
    pub w: u32,
    pub h: u32,
    pub rgba: Vec<u8>,
}

pub struct FullTask {
    pub path: PathBuf,
    pub index: usize,
    pub generation: u64,
}

pub struct ThumbTask {
    pub path: PathBuf,
    pub index: usize,
}

/// What comes back over the shared result channel. A decode failure is
/// data here, never a panic across threads.
pub enum LoadResult {
    Thumb { index: usize, surface: Result<Surface> },
    Full { index: usize, surface: Result<Surface> },
}

/* ───────────────────────── pipeline handle ──────────────────────── */

/// UI-thread handle to the load pipeline: the two task queues, the shared
/// result queue, and the generation counter that gates full-image work.
/// Dropping it closes both task channels, which ends the workers.
pub struct Pipeline {
    full_tx: Sender<FullTask>,
    thumb_tx: Sender<ThumbTask>,
    result_rx: Receiver<LoadResult>,
    generation: Arc<AtomicU64>,
}

impl Pipeline {
    /// Channels only, no threads; workers are attached separately so tests
    /// can drive the queues deterministically.
    fn with_queues(
        thumb_cap: usize,
    ) -> (Pipeline, Receiver<FullTask>, Receiver<ThumbTask>, Sender<LoadResult>) {
        let (full_tx, full_rx) = bounded(FULL_TASK_CAP);
        let (thumb_tx, thumb_rx) = bounded(thumb_cap.max(1));
        let (result_tx, result_rx) = bounded(RESULT_CAP);
        let pipeline = Pipeline {
            full_tx,
            thumb_tx,
            result_rx,
            generation: Arc::new(AtomicU64::new(0)),
        };
        (pipeline, full_rx, thumb_rx, result_tx)
    }

    /// Build the pipeline and spawn the two long-lived workers. `ctx` is
    /// only used to nudge repaints when results land.
    pub fn start(thumb_cap: usize, ctx: egui::Context) -> Pipeline {
        let (pipeline, full_rx, thumb_rx, result_tx) = Pipeline::with_queues(thumb_cap);
        {
            let tx = result_tx.clone();
            let generation = pipeline.generation.clone();
            let ctx = ctx.clone();
            std::thread::spawn(move || run_full_worker(full_rx, tx, generation, ctx));
        }
        std::thread::spawn(move || run_thumb_worker(thumb_rx, result_tx, ctx));
        pipeline
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Bump the generation (invalidating every full-image task still in
    /// flight) and enqueue a load. Blocks briefly if the queue is full.
    pub fn request_full_image(&self, index: usize, path: &Path) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let task = FullTask { path: path.to_path_buf(), index, generation };
        let _ = self.full_tx.send(task);
    }

    /// No generation stamp: every thumbnail is eventually wanted, and
    /// re-requesting the same index is harmless.
    pub fn request_thumbnail(&self, index: usize, path: &Path) {
        let _ = self.thumb_tx.send(ThumbTask { path: path.to_path_buf(), index });
    }

    /// Non-blocking poll, called from the per-frame merge loop only.
    pub fn try_recv(&self) -> Option<LoadResult> {
        self.result_rx.try_recv().ok()
    }
}

/// A full-image task is live while its stamp matches the current counter.
/// Checked at consumption time and again after decoding, so both queued
/// and mid-decode stragglers for an abandoned selection get dropped.
#[inline]
pub fn task_is_live(task: &FullTask, generation: &AtomicU64) -> bool {
    task.generation == generation.load(Ordering::Relaxed)
}

/* ───────────────────────── worker bodies ────────────────────────── */

fn run_full_worker(
    tasks: Receiver<FullTask>,
    results: Sender<LoadResult>,
    generation: Arc<AtomicU64>,
    ctx: egui::Context,
) {
    while let Ok(task) = tasks.recv() {
        if !task_is_live(&task, &generation) {
            log::debug!("skipping stale load of {}", task.path.display());
            continue;
        }
        let surface = decode_surface(&task.path);
        if !task_is_live(&task, &generation) {
            log::debug!("dropping straggler decode of {}", task.path.display());
            continue;
        }
        if results.send(LoadResult::Full { index: task.index, surface }).is_err() {
            break;
        }
        ctx.request_repaint_after(Duration::from_millis(8));
    }
}

fn run_thumb_worker(tasks: Receiver<ThumbTask>, results: Sender<LoadResult>, ctx: egui::Context) {
    while let Ok(task) = tasks.recv() {
        let surface = decode_surface(&task.path);
        if results.send(LoadResult::Thumb { index: task.index, surface }).is_err() {
            break;
        }
        ctx.request_repaint_after(Duration::from_millis(8));
    }
}

fn decode_surface(path: &Path) -> Result<Surface> {
    let img = ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    Ok(Surface { w, h, rgba: rgba.into_raw() })
}

/* ───────────────────────────── tests ────────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_counts_requests() {
        let (pipeline, full_rx, _thumb_rx, _result_tx) = Pipeline::with_queues(4);
        assert_eq!(pipeline.generation(), 0);
        for i in 0..3 {
            pipeline.request_full_image(i, Path::new("a.png"));
        }
        assert_eq!(pipeline.generation(), 3);

        let stamps: Vec<u64> = full_rx.try_iter().map(|t| t.generation).collect();
        assert_eq!(stamps, [1, 2, 3]);
    }

    #[test]
    fn superseded_task_is_dropped_at_the_gate() {
        let (pipeline, full_rx, _thumb_rx, _result_tx) = Pipeline::with_queues(4);
        pipeline.request_full_image(0, Path::new("a.png"));
        pipeline.request_full_image(1, Path::new("b.png"));

        // The worker consumes in order: the first stamp is already stale,
        // the second is live.
        let first = full_rx.try_recv().unwrap();
        assert!(!task_is_live(&first, &pipeline.generation));
        let second = full_rx.try_recv().unwrap();
        assert!(task_is_live(&second, &pipeline.generation));
    }

    #[test]
    fn straggling_decode_is_dropped_before_publish() {
        let (pipeline, full_rx, _thumb_rx, _result_tx) = Pipeline::with_queues(4);
        pipeline.request_full_image(0, Path::new("a.png"));

        // Live at consumption time; a navigation lands mid-decode.
        let task = full_rx.try_recv().unwrap();
        assert!(task_is_live(&task, &pipeline.generation));
        pipeline.request_full_image(1, Path::new("b.png"));
        assert!(!task_is_live(&task, &pipeline.generation));
    }

    #[test]
    fn thumbnails_carry_no_generation() {
        let (pipeline, _full_rx, thumb_rx, _result_tx) = Pipeline::with_queues(4);
        pipeline.request_thumbnail(7, Path::new("t.png"));
        pipeline.request_thumbnail(7, Path::new("t.png"));
        assert_eq!(pipeline.generation(), 0);
        assert_eq!(thumb_rx.len(), 2);
    }

    #[test]
    fn decode_failure_is_data() {
        let missing = Path::new("definitely/not/here.png");
        assert!(decode_surface(missing).is_err());
    }

    #[test]
    fn decode_roundtrip() {
        let path = std::env::temp_dir().join(format!("pictile-decode-{}.png", std::process::id()));
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let surface = decode_surface(&path).unwrap();
        assert_eq!((surface.w, surface.h), (3, 2));
        assert_eq!(surface.rgba.len(), 3 * 2 * 4);
        std::fs::remove_file(&path).unwrap();
    }
}
