//! The render role: a dedicated thread owning every GPU object.
//!
//! [`RenderEngine`] is the thread-safe handle the UI holds. Commands go in
//! through queues (scene submissions are lossless FIFO; camera, sky, and
//! exposure drain to the most recent value each loop iteration); finished
//! frames come back through a lock-free single-slot triple buffer that
//! overwrites on publish, so a slow UI reads the freshest frame and stale
//! ones are intentionally dropped.

mod command;
mod core;
mod readback;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::camera::Camera;
use crate::error::LumoError;
use crate::options::Options;
use crate::scene::BuiltScene;

/// Upper bound on the shutdown join. Device waits inside the loop are
/// themselves bounded, so a healthy render thread always beats this; a
/// wedged one is detached rather than allowed to hang the UI.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// One finished frame, read back from the GPU.
///
/// Pixels are tightly packed RGBA8, row-major, top row first.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes of RGBA data.
    pub pixels: Vec<u8>,
}

/// Clears the running flag when the render thread unwinds for any reason,
/// so the UI observes engine death even on a panic inside wgpu.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to the render thread.
pub struct RenderEngine {
    scene_tx: Sender<BuiltScene>,
    camera_tx: Sender<Camera>,
    sky_tx: Sender<bool>,
    exposure_tx: Sender<f32>,
    frame_rx: triple_buffer::Output<Option<Frame>>,
    running: Arc<AtomicBool>,
    // Disconnects when the render thread ends (normally or by unwinding),
    // letting stop() wait with a timeout where JoinHandle cannot.
    done_rx: Receiver<()>,
    thread: Option<JoinHandle<()>>,
}

impl RenderEngine {
    /// Spawn the render thread and block until its device, pipeline, and
    /// image resources exist.
    ///
    /// # Errors
    ///
    /// Startup failures (kernel file unreadable, no adapter, device
    /// request rejected) are reported here, before any rendering begins.
    pub fn start(options: &Options) -> Result<Self, LumoError> {
        let (scene_tx, scene_rx) = mpsc::channel();
        let (camera_tx, camera_rx) = mpsc::channel();
        let (sky_tx, sky_rx) = mpsc::channel();
        let (exposure_tx, exposure_rx) = mpsc::channel();
        let (frame_tx, frame_rx) = triple_buffer::triple_buffer(&None);
        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let opts = options.clone();

        let thread = std::thread::Builder::new()
            .name("render-engine".into())
            .spawn(move || {
                // Held for the thread's whole life; its drop (normal exit
                // or unwind) disconnects the channel stop() waits on.
                let _done_signal = done_tx;
                let _guard = RunningGuard(Arc::clone(&flag));
                let mut engine = match core::EngineCore::init(&opts) {
                    Ok(engine) => {
                        let _ = ready_tx.send(Ok(()));
                        engine
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                engine.run(
                    &flag,
                    &scene_rx,
                    &camera_rx,
                    &sky_rx,
                    &exposure_rx,
                    frame_tx,
                );
            })
            .map_err(LumoError::ThreadSpawn)?;

        let mut handle = Self {
            scene_tx,
            camera_tx,
            sky_tx,
            exposure_tx,
            frame_rx,
            running,
            done_rx,
            thread: Some(thread),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(e)) => {
                handle.stop();
                Err(e)
            }
            Err(_) => {
                handle.stop();
                Err(LumoError::EngineStart(
                    "render thread exited before reporting readiness".into(),
                ))
            }
        }
    }

    /// Enqueue a new scene for upload. Lossless: the render loop processes
    /// one submission per iteration.
    pub fn submit_scene(&self, scene: BuiltScene) {
        let _ = self.scene_tx.send(scene);
    }

    /// Enqueue a camera update. Only the most recent value pending at the
    /// next loop iteration takes effect.
    pub fn submit_camera(&self, camera: Camera) {
        let _ = self.camera_tx.send(camera);
    }

    /// Enqueue a sky-enabled update. Drains to the most recent value.
    pub fn submit_sky(&self, enabled: bool) {
        let _ = self.sky_tx.send(enabled);
    }

    /// Enqueue an exposure update. Drains to the most recent value.
    pub fn submit_exposure(&self, exposure: f32) {
        let _ = self.exposure_tx.send(exposure);
    }

    /// Non-blocking take of the most recent finished frame.
    ///
    /// Returns `None` when no new frame has been published since the last
    /// take.
    pub fn take_frame(&mut self) -> Option<Frame> {
        self.frame_rx.update();
        self.frame_rx.output_buffer_mut().take()
    }

    /// Whether the render thread is still alive. Turns false after
    /// [`stop`] or after a fatal GPU failure inside the loop.
    ///
    /// [`stop`]: Self::stop
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signal shutdown and wait for the render thread to finish its
    /// cleanup (final device-idle, resource destruction).
    ///
    /// The wait is bounded by [`SHUTDOWN_TIMEOUT`]: if the render thread
    /// is wedged inside the GPU driver it is detached and abandoned, so
    /// shutdown can never hang the calling (UI) thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.thread.take() else {
            return;
        };
        match self.done_rx.recv_timeout(SHUTDOWN_TIMEOUT) {
            // Disconnected means the thread has ended (or is unwinding);
            // the join below is then immediate.
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                log::warn!(
                    "render thread did not stop within {SHUTDOWN_TIMEOUT:?}; detaching it"
                );
                drop(handle);
            }
        }
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32) -> Frame {
        Frame {
            width,
            height: 1,
            pixels: vec![0; (width * 4) as usize],
        }
    }

    #[test]
    fn frame_slot_overwrites_and_clears_on_take() {
        // The handoff the engine publishes frames through: single-slot,
        // overwrite-on-publish, take-and-clear on read.
        let (mut input, mut output) = triple_buffer::triple_buffer(&None::<Frame>);

        input.write(Some(frame(1)));
        input.write(Some(frame(2)));

        output.update();
        let taken = output.output_buffer_mut().take().unwrap();
        // The intermediate frame was intentionally dropped.
        assert_eq!(taken.width, 2);

        // Nothing new published: the slot reads empty, not stale.
        output.update();
        assert!(output.output_buffer_mut().take().is_none());
    }

    #[test]
    fn shutdown_signal_disconnects_when_the_thread_ends() {
        // The discipline stop() relies on: the sender lives for the whole
        // thread, so disconnection doubles as a "finished" signal with no
        // explicit send.
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let worker = std::thread::spawn(move || {
            let _done_signal = done_tx;
        });
        assert!(matches!(
            done_rx.recv_timeout(Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
        let _ = worker.join();
    }

    #[test]
    fn shutdown_wait_on_a_wedged_thread_times_out() {
        // A sender kept alive past the bound must surface as Timeout, the
        // case where stop() detaches instead of blocking the UI forever.
        let (done_tx, done_rx) = mpsc::channel::<()>();
        assert!(matches!(
            done_rx.recv_timeout(Duration::from_millis(20)),
            Err(mpsc::RecvTimeoutError::Timeout)
        ));
        drop(done_tx);
    }
}
