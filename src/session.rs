// ============================================================================
// Image session — background load pipeline with atomic install
// ============================================================================
//
// Loading decodes the full-resolution raster and builds the displayed
// representation on a background thread; the completed pair arrives as a
// single message on an mpsc channel and the app installs it in one step.
// The UI thread never sees a half-loaded image: until the message lands,
// the previous session (if any) stays untouched and interaction input is
// gated off.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::io;

/// The fully loaded image state: both rasters plus provenance. Replaced
/// wholesale on each successful load, never field-by-field.
pub struct ImageSession {
    pub original: RgbaImage,
    pub displayed: RgbaImage,
    pub path: PathBuf,
}

impl ImageSession {
    /// Decode + downscale synchronously. Used by the background loader and
    /// directly by the headless CLI.
    pub fn load(path: &Path) -> Result<ImageSession, String> {
        let original = io::load_full_resolution(path)?;
        let displayed = io::build_displayed(&original);
        Ok(ImageSession {
            original,
            displayed,
            path: path.to_path_buf(),
        })
    }

    pub fn original_size(&self) -> (u32, u32) {
        self.original.dimensions()
    }

    pub fn displayed_size(&self) -> (u32, u32) {
        self.displayed.dimensions()
    }
}

/// Result delivered from the background load thread.
pub enum LoadResult {
    Loaded(Box<ImageSession>),
    Failed(String),
}

/// One-slot load pipeline: spawn on rayon, poll the channel each frame.
pub struct LoadPipeline {
    sender: mpsc::Sender<LoadResult>,
    receiver: mpsc::Receiver<LoadResult>,
    in_flight: bool,
}

impl Default for LoadPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadPipeline {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: false,
        }
    }

    /// True while a load is running; interaction input must stay gated.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Kick off a background load. Ignored if one is already running —
    /// no cancellation is defined, a load runs to completion or failure.
    pub fn spawn_load(&mut self, path: PathBuf) {
        if self.in_flight {
            return;
        }
        self.in_flight = true;
        let sender = self.sender.clone();
        rayon::spawn(move || {
            let result = match ImageSession::load(&path) {
                Ok(session) => LoadResult::Loaded(Box::new(session)),
                Err(e) => LoadResult::Failed(e),
            };
            // Receiver gone means the app is shutting down.
            let _ = sender.send(result);
        });
    }

    /// Non-blocking poll; called once per frame from `update()`.
    pub fn poll(&mut self) -> Option<LoadResult> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.in_flight = false;
                Some(result)
            }
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failure_is_reported_through_the_channel() {
        let mut pipeline = LoadPipeline::new();
        pipeline.spawn_load(PathBuf::from("/nonexistent/missing.png"));
        assert!(pipeline.in_flight());

        let mut result = None;
        for _ in 0..200 {
            if let Some(r) = pipeline.poll() {
                result = Some(r);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        match result {
            Some(LoadResult::Failed(msg)) => assert!(msg.contains("missing.png")),
            _ => panic!("expected a load failure"),
        }
        assert!(!pipeline.in_flight());
    }

    #[test]
    fn successful_load_delivers_both_rasters_at_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        RgbaImage::from_pixel(64, 48, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut pipeline = LoadPipeline::new();
        pipeline.spawn_load(path.clone());
        let mut result = None;
        for _ in 0..500 {
            if let Some(r) = pipeline.poll() {
                result = Some(r);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        match result {
            Some(LoadResult::Loaded(session)) => {
                assert_eq!(session.original_size(), (64, 48));
                assert_eq!(session.displayed_size(), (64, 48));
                assert_eq!(session.path, path);
            }
            _ => panic!("expected a successful load"),
        }
    }
}
