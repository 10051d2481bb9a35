//! Bench camera: replays a directory of still images.
//!
//! Files are read in file-name order.  When the list is exhausted the
//! camera reports [`CaptureError::EndOfStream`], or starts over when
//! looping is enabled.  An optional frame interval paces delivery like a
//! real device.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::app::ports::CameraPort;
use crate::error::CaptureError;
use crate::vision::Frame;

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

pub struct ImageDirCamera {
    files: Vec<PathBuf>,
    next: usize,
    looping: bool,
    interval: Option<Duration>,
    last_frame: Option<Instant>,
    released: bool,
}

impl ImageDirCamera {
    /// Index the image files in `dir`.  Fails when there are none.
    pub fn open(dir: &Path, looping: bool, interval: Option<Duration>) -> Result<Self, CaptureError> {
        let open_err = |reason: String| CaptureError::Open {
            source_id: dir.display().to_string(),
            reason,
        };
        let entries = std::fs::read_dir(dir).map_err(|e| open_err(e.to_string()))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(open_err("no image files".to_owned()));
        }
        info!("ImageDirCamera: {} frame(s) in {}", files.len(), dir.display());
        Ok(Self {
            files,
            next: 0,
            looping,
            interval,
            last_frame: None,
            released: false,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn pace(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last_frame) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

impl CameraPort for ImageDirCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if self.released {
            return Err(CaptureError::Device("camera released".to_owned()));
        }
        if self.next >= self.files.len() {
            if !self.looping {
                return Err(CaptureError::EndOfStream);
            }
            self.next = 0;
        }
        self.pace();

        let path = &self.files[self.next];
        self.next += 1;
        debug!("ImageDirCamera: reading {}", path.display());
        let image = image::open(path)
            .map_err(|e| CaptureError::Device(format!("{}: {}", path.display(), e)))?;
        Ok(Frame::new(image.to_rgb8()))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            info!("ImageDirCamera: released");
        }
    }
}
