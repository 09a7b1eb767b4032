mod model_fetch;
mod ort;

use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{Receiver, bounded};
use thiserror::Error;

pub use self::model_fetch::default_model_path;
pub use self::ort::OrtLandmarker;

use crate::types::{Frame, HandPose};

/// Boundary capability around the hand-landmark model. One synchronous
/// detection per call; the timestamp is monotonically increasing across the
/// process lifetime.
pub trait HandLandmarker {
    fn detect(&mut self, frame: &Frame, timestamp_ms: u64) -> anyhow::Result<Option<HandPose>>;
}

/// Why the detector never became available. Reported to the user once; the
/// pointer feature stays off and nothing retries.
#[derive(Debug, Error)]
pub enum DetectorInitError {
    #[error("hand-landmark model unavailable: {0:#}")]
    ModelUnavailable(anyhow::Error),
    #[error("failed to load hand-landmark model: {0:#}")]
    SessionBuild(anyhow::Error),
}

/// Single-shot asynchronous initialization: fetches the model if missing and
/// builds the inference session off the interface thread. The result arrives
/// exactly once on the returned channel.
pub fn spawn_initialize(model_path: PathBuf) -> Receiver<Result<OrtLandmarker, DetectorInitError>> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let result = initialize(&model_path);
        if let Err(err) = &result {
            log::error!("detector initialization failed: {err}");
        }
        let _ = tx.send(result);
    });
    rx
}

fn initialize(model_path: &PathBuf) -> Result<OrtLandmarker, DetectorInitError> {
    model_fetch::ensure_model_available(model_path)
        .map_err(DetectorInitError::ModelUnavailable)?;

    let landmarker = OrtLandmarker::new(model_path).map_err(DetectorInitError::SessionBuild)?;
    log::info!("hand-landmark detector ready using {}", model_path.display());
    Ok(landmarker)
}
