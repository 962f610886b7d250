//! Ephemeral scene-build worker.
//!
//! One task is spawned per scene edit; the UI enforces that at most one is
//! alive by holding it in an `Option` and not starting another until
//! [`BuildTask::try_take`] delivers. The worker never touches GPU state.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use super::builder::{build_scene, BuiltScene};
use super::Scene;
use crate::error::LumoError;

/// Handle to one in-flight scene build.
pub struct BuildTask {
    result_rx: Receiver<Result<BuiltScene, LumoError>>,
    thread: Option<JoinHandle<()>>,
}

impl BuildTask {
    /// Spawn a worker thread building the given snapshot.
    ///
    /// # Errors
    ///
    /// [`LumoError::ThreadSpawn`] when the OS refuses a new thread.
    pub fn spawn(snapshot: Scene) -> Result<Self, LumoError> {
        let (result_tx, result_rx) = mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("scene-build".into())
            .spawn(move || {
                let result = build_scene(&snapshot);
                let _ = result_tx.send(result);
            })
            .map_err(LumoError::ThreadSpawn)?;

        Ok(Self {
            result_rx,
            thread: Some(thread),
        })
    }

    /// Non-blocking poll for the build result.
    ///
    /// Returns `None` while the worker is still running; once it returns
    /// `Some`, the task is finished and the thread has been joined.
    pub fn try_take(&mut self) -> Option<Result<BuiltScene, LumoError>> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(LumoError::SceneBuild(
                    "build worker exited without a result".into(),
                )))
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BuildTask {
    fn drop(&mut self) {
        self.join();
    }
}
