//! Parallel render scheduler.
//!
//! Image rows are dealt round-robin to a fixed pool of workers: row `y` goes
//! to worker `y % workers`. Each worker owns its rows' pixels outright, so no
//! pixel is ever shared. Workers report finished rows over a channel that the
//! calling thread drains until every worker has hung up.

use crate::{
    buffer::{Buffer, Pixel},
    camera::Camera,
    config::RenderConfig,
    error::{RenderError, RenderResult},
    integrator::radiance,
    sampling::gen_f64,
    Scene,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Totals for a finished render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    /// Primitive intersection tests, shadow rays included
    pub intersections: u64,
    pub rows: usize,
    pub samples: u64,
    pub elapsed: Duration,
}

/// Messages sent from workers to the draining thread.
enum WorkerMessage {
    RowDone(usize),
    Finished { intersections: u64, samples: u64 },
}

/// Rows assigned to one worker, with exclusive access to their pixels.
type Lane<'a> = Vec<(usize, &'a mut [Pixel])>;

/// Render `scene` into `buffer`, blocking until every row is done.
///
/// The buffer must match the configured resolution. Samples are added to
/// whatever the buffer already holds.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    buffer: &mut Buffer,
    config: &RenderConfig,
) -> RenderResult<RenderStats> {
    render_with_progress(scene, camera, buffer, config, |_, _| {})
}

/// Like [`render`], calling `on_row(row, rows_completed)` on the calling
/// thread as rows finish.
pub fn render_with_progress<F>(
    scene: &Scene,
    camera: &Camera,
    buffer: &mut Buffer,
    config: &RenderConfig,
    mut on_row: F,
) -> RenderResult<RenderStats>
where
    F: FnMut(usize, usize),
{
    config.validate()?;
    if (buffer.width(), buffer.height()) != (config.width, config.height) {
        return Err(RenderError::BufferSize {
            expected: (config.width, config.height),
            actual: (buffer.width(), buffer.height()),
        });
    }

    let workers = config.worker_count();
    let height = buffer.height();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("lumen-worker-{i}"))
        .build()?;

    let base_seed = config.seed.unwrap_or_else(clock_seed);
    log::info!(
        "Rendering {}x{} with {} workers, {} spp (+{} adaptive), depth {}, {} shadow rays",
        config.width,
        config.height,
        workers,
        config.samples_per_pixel,
        config.adaptive_samples,
        config.max_depth,
        config.shadow_rays
    );

    let mut lanes: Vec<Lane> = (0..workers).map(|_| Vec::new()).collect();
    for (y, row) in buffer.rows_mut().enumerate() {
        lanes[y % workers].push((y, row));
    }

    let start = Instant::now();
    let mut stats = RenderStats::default();

    let frame = Frame {
        scene,
        camera,
        config,
    };
    pool.in_place_scope(|s| {
        let (tx, rx) = channel();
        for (i, lane) in lanes.into_iter().enumerate() {
            let tx = tx.clone();
            let seed = base_seed.wrapping_add(i as u64);
            s.spawn(move |_| render_lane(lane, frame, seed, tx));
        }
        drop(tx);

        for msg in rx {
            match msg {
                WorkerMessage::RowDone(y) => {
                    stats.rows += 1;
                    log::debug!(
                        "Finished row {} of {} ({:.1}% done)",
                        y,
                        height,
                        stats.rows as f64 / height as f64 * 100.0
                    );
                    on_row(y, stats.rows);
                }
                WorkerMessage::Finished {
                    intersections,
                    samples,
                } => {
                    stats.intersections += intersections;
                    stats.samples += samples;
                }
            }
        }
    });

    stats.elapsed = start.elapsed();
    log::info!(
        "Render complete in {:.2?}: {} samples, {} intersection tests",
        stats.elapsed,
        stats.samples,
        stats.intersections
    );

    Ok(stats)
}

/// Read-only inputs shared by every worker.
#[derive(Clone, Copy)]
struct Frame<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
    config: &'a RenderConfig,
}

/// Per-worker sampling state.
struct Sampler<'a> {
    frame: Frame<'a>,
    rng: StdRng,
    tests: u64,
}

impl Sampler<'_> {
    /// Trace one jittered camera ray through pixel (x, y).
    fn sample(&mut self, pixel: &mut Pixel, x: usize, y: usize) {
        let Frame {
            scene,
            camera,
            config,
        } = self.frame;
        let rng: &mut dyn RngCore = &mut self.rng;

        let u = (x as f64 + gen_f64(rng)) / config.width as f64;
        let v = (y as f64 + gen_f64(rng)) / config.height as f64;
        let ray = camera.ray_at(u, v, rng);
        pixel.add_sample(radiance(&ray, scene, 0, config, rng, &mut self.tests));
    }
}

fn render_lane(lane: Lane, frame: Frame, seed: u64, tx: Sender<WorkerMessage>) {
    let config = frame.config;
    let mut sampler = Sampler {
        frame,
        rng: StdRng::seed_from_u64(seed),
        tests: 0,
    };
    let mut samples = 0;

    for (y, row) in lane {
        for (x, pixel) in row.iter_mut().enumerate() {
            for _ in 0..config.samples_per_pixel {
                sampler.sample(pixel, x, y);
            }
            samples += config.samples_per_pixel as u64;

            let extra = pixel.adaptive_samples(
                config.adaptive_samples,
                config.adaptive_threshold,
                config.adaptive_exponent,
            );
            for _ in 0..extra {
                sampler.sample(pixel, x, y);
            }
            samples += extra as u64;
        }

        if tx.send(WorkerMessage::RowDone(y)).is_err() {
            return; // Caller stopped listening
        }
    }

    let _ = tx.send(WorkerMessage::Finished {
        intersections: sampler.tests,
        samples,
    });
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Progress reported by a [`RenderJob`].
#[derive(Debug, Clone)]
pub enum RenderEvent {
    /// A row finished; `completed` rows are done so far.
    RowDone { row: usize, completed: usize },
    Finished(RenderStats),
}

/// A render running on a background thread.
pub struct RenderJob {
    /// Receive progress events.
    pub rx: Receiver<RenderEvent>,
    handle: JoinHandle<RenderResult<(Buffer, RenderStats)>>,
}

impl RenderJob {
    /// Start rendering into a fresh buffer sized from `config`.
    pub fn spawn(scene: Arc<Scene>, camera: Camera, config: RenderConfig) -> Self {
        let (tx, rx) = channel();

        let handle = thread::spawn(move || -> RenderResult<(Buffer, RenderStats)> {
            let mut buffer = Buffer::new(config.width, config.height);
            let on_row = |row, completed| {
                let _ = tx.send(RenderEvent::RowDone { row, completed });
            };
            let stats = render_with_progress(&scene, &camera, &mut buffer, &config, on_row)?;
            let _ = tx.send(RenderEvent::Finished(stats.clone()));
            Ok((buffer, stats))
        });

        Self { rx, handle }
    }

    /// Check for progress (non-blocking).
    pub fn try_recv(&self) -> Option<RenderEvent> {
        self.rx.try_recv().ok()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the render and take its buffer.
    pub fn join(self) -> RenderResult<(Buffer, RenderStats)> {
        self.handle.join().map_err(|_| RenderError::WorkerPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Background, Material, Sphere};
    use lumen_math::Vec3;

    fn small_scene() -> (Scene, Camera, RenderConfig) {
        let mut scene = Scene::new();
        scene.add(Sphere::new(Vec3::ZERO, 1.0, Material::lambertian(Vec3::new(0.8, 0.2, 0.2))));
        scene.add(Sphere::new(Vec3::new(0.0, 4.0, 0.0), 1.0, Material::light(Vec3::ONE, 1.0)));

        let config = RenderConfig::default()
            .with_resolution(12, 8)
            .with_quality(2, 3, 2)
            .with_seed(17);
        let camera = Camera::new()
            .with_position(Vec3::new(0.0, 1.0, -5.0), Vec3::ZERO, Vec3::Y)
            .with_lens(config.fov, 0.0)
            .with_resolution(config.width, config.height)
            .initialized();
        (scene, camera, config)
    }

    #[test]
    fn test_every_row_reported_once() {
        let (scene, camera, config) = small_scene();
        let config = config.with_workers(3);
        let mut buffer = Buffer::new(config.width, config.height);
        let mut rows = Vec::new();

        let stats = render_with_progress(&scene, &camera, &mut buffer, &config, |y, done| {
            rows.push(y);
            assert_eq!(done, rows.len());
        })
        .unwrap();

        rows.sort_unstable();
        assert_eq!(rows, (0..8).collect::<Vec<_>>());
        assert_eq!(stats.rows, 8);
        assert_eq!(stats.samples, 12 * 8 * 2);
        assert_eq!(buffer.total_samples(), stats.samples);
        assert!(stats.intersections > 0);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let (scene, camera, config) = small_scene();
        let mut buffer = Buffer::new(4, 4);

        let err = render(&scene, &camera, &mut buffer, &config).unwrap_err();
        assert!(matches!(err, RenderError::BufferSize { .. }));
        assert_eq!(buffer.total_samples(), 0);
    }

    #[test]
    fn test_more_workers_than_rows() {
        let (scene, camera, config) = small_scene();
        let config = config.with_workers(16);
        let mut buffer = Buffer::new(config.width, config.height);

        let stats = render(&scene, &camera, &mut buffer, &config).unwrap();
        assert_eq!(stats.rows, 8);
        assert!(buffer.pixels().iter().all(|p| p.samples() == 2));
    }

    #[test]
    fn test_adaptive_samples_are_spent() {
        // A diffuse ball under a sky: every bounce picks up a different
        // amount of sky, so every pixel on the ball is noisy.
        let (_, camera, config) = small_scene();
        let mut scene = Scene::new();
        scene.add(Sphere::new(Vec3::ZERO, 2.0, Material::lambertian(Vec3::splat(0.8))));
        let config = config
            .with_workers(2)
            .with_adaptive(8, 1e-6, 1.0)
            .with_background(Background::Directional {
                color: Vec3::ONE,
                axis: Vec3::Y,
            });
        let mut buffer = Buffer::new(config.width, config.height);

        let stats = render(&scene, &camera, &mut buffer, &config).unwrap();
        let base = 12 * 8 * 2;
        assert!(stats.samples > base, "samples = {}", stats.samples);
        assert_eq!(buffer.total_samples(), stats.samples);
        assert_eq!(buffer.max_samples(), 10);
        assert!(buffer.pixels().iter().all(|p| p.samples() >= 2));
    }

    #[test]
    fn test_render_job() {
        let (scene, camera, config) = small_scene();
        let job = RenderJob::spawn(Arc::new(scene), camera, config.with_workers(2));

        let (buffer, stats) = job.join().unwrap();
        assert_eq!((buffer.width(), buffer.height()), (12, 8));
        assert_eq!(stats.rows, 8);
    }

    #[test]
    fn test_render_job_events() {
        let (scene, camera, config) = small_scene();
        let job = RenderJob::spawn(Arc::new(scene), camera, config.with_workers(1));

        let mut rows = 0;
        let mut finished = None;
        for event in job.rx.iter() {
            match event {
                RenderEvent::RowDone { .. } => rows += 1,
                RenderEvent::Finished(stats) => finished = Some(stats),
            }
        }
        assert_eq!(rows, 8);
        assert_eq!(finished.map(|s| s.rows), Some(8));
    }

    #[test]
    fn test_render_job_reports_invalid_config() {
        let (scene, camera, config) = small_scene();
        let job = RenderJob::spawn(Arc::new(scene), camera, config.with_resolution(0, 0));

        assert!(matches!(job.join(), Err(RenderError::InvalidConfig(_))));
    }
}
