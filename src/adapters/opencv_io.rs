//! OpenCV device camera and window (feature `opencv`).

use log::{info, warn};
use opencv::core::{Mat, MatTraitConst, MatTraitConstManual};
use opencv::highgui;
use opencv::videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst};

use crate::app::ports::{CameraPort, DisplayPort};
use crate::error::CaptureError;
use crate::vision::Frame;
use crate::vision::overlay::AnnotatedFrame;

use super::stop::{OperatorStop, is_quit_key};

const WINDOW: &str = "surfscan";

fn device_err(e: opencv::Error) -> CaptureError {
    CaptureError::Device(e.to_string())
}

// ── Camera ────────────────────────────────────────────────────

pub struct OpencvCamera {
    cap: VideoCapture,
    index: i32,
    released: bool,
}

impl OpencvCamera {
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        let open_err = |reason: String| CaptureError::Open {
            source_id: format!("camera #{index}"),
            reason,
        };
        let cap = VideoCapture::new(index, videoio::CAP_ANY).map_err(|e| open_err(e.to_string()))?;
        if !cap.is_opened().map_err(|e| open_err(e.to_string()))? {
            return Err(open_err("device did not open".to_owned()));
        }
        info!("OpencvCamera: opened camera #{}", index);
        Ok(Self {
            cap,
            index,
            released: false,
        })
    }
}

impl CameraPort for OpencvCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let mut mat = Mat::default();
        if !self.cap.read(&mut mat).map_err(device_err)? || mat.empty() {
            return Err(CaptureError::EndOfStream);
        }
        let (cols, rows) = (mat.cols() as u32, mat.rows() as u32);
        let data = mat.data_bytes().map_err(device_err)?;
        Frame::from_bgr(cols, rows, data)
            .ok_or_else(|| CaptureError::Device(format!("unexpected frame layout {cols}x{rows}")))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.cap.release() {
            warn!("OpencvCamera: release of camera #{} failed: {}", self.index, e);
        }
    }
}

// ── Window ────────────────────────────────────────────────────

/// Shows annotated frames and turns a `q` key press into a stop request.
pub struct OpencvWindow {
    stop: OperatorStop,
}

impl OpencvWindow {
    pub fn new(stop: OperatorStop) -> Self {
        Self { stop }
    }

    fn draw(&self, frame: &AnnotatedFrame) -> opencv::Result<()> {
        let rows = frame.image.height() as i32;
        let bgr: Vec<u8> = frame
            .image
            .pixels()
            .flat_map(|p| [p.0[2], p.0[1], p.0[0]])
            .collect();
        let flat = Mat::from_slice(&bgr)?;
        let mat = flat.reshape(3, rows)?.try_clone()?;
        highgui::imshow(WINDOW, &mat)?;
        if is_quit_key(highgui::wait_key(1)?) {
            self.stop.request();
        }
        Ok(())
    }
}

impl DisplayPort for OpencvWindow {
    fn show(&mut self, frame: &AnnotatedFrame) {
        if let Err(e) = self.draw(frame) {
            warn!("OpencvWindow: {}", e);
        }
    }
}

impl Drop for OpencvWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_all_windows();
    }
}
