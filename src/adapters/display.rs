//! Headless display adapter.
//!
//! Logs each verdict label and can dump every Nth annotated frame as a
//! PNG for later review.  Write failures are logged and otherwise
//! ignored: the display never affects the loop.

use std::path::PathBuf;

use log::{debug, warn};

use crate::app::ports::DisplayPort;
use crate::vision::overlay::AnnotatedFrame;

#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    snapshots: Option<(PathBuf, u64)>,
    shown: u64,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save every `every`-th frame (minimum 1) into `dir`.
    pub fn with_snapshots(dir: PathBuf, every: u64) -> Self {
        Self {
            snapshots: Some((dir, every.max(1))),
            shown: 0,
        }
    }

    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl DisplayPort for HeadlessDisplay {
    fn show(&mut self, frame: &AnnotatedFrame) {
        self.shown += 1;
        debug!("DISPLAY | #{} | {}", self.shown, frame.label);

        if let Some((dir, every)) = &self.snapshots {
            if (self.shown - 1) % every == 0 {
                let path = dir.join(format!("frame_{:06}.png", self.shown));
                if let Err(e) = frame.image.save(&path) {
                    warn!("HeadlessDisplay: cannot write {}: {}", path.display(), e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Verdict;
    use crate::vision::{overlay, Frame};
    use image::RgbImage;

    fn annotated() -> AnnotatedFrame {
        overlay::render(&Frame::new(RgbImage::new(16, 16)), &Verdict::ok())
    }

    #[test]
    fn writes_every_nth_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = HeadlessDisplay::with_snapshots(dir.path().to_owned(), 2);
        for _ in 0..5 {
            d.show(&annotated());
        }
        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["frame_000001.png", "frame_000003.png", "frame_000005.png"]);
    }

    #[test]
    fn unwritable_directory_is_not_fatal() {
        let mut d = HeadlessDisplay::with_snapshots(PathBuf::from("/nonexistent/surfscan"), 1);
        d.show(&annotated());
        assert_eq!(d.shown(), 1);
    }
}
