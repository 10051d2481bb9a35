//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter            | Implements   | Connects to                    |
//! |--------------------|--------------|--------------------------------|
//! | `config_file`      | ConfigPort   | TOML file + `SURFSCAN_*` env   |
//! | `display`          | DisplayPort  | log output, PNG snapshots      |
//! | `image_dir_camera` | CameraPort   | directory of still images      |
//! | `log_sink`         | EventSink    | console log output             |
//! | `opencv_io`        | CameraPort   | V4L / OpenCV capture device    |
//! |                    | DisplayPort  | OpenCV HighGUI window          |
//! | `stop`             | StopPort     | Ctrl-C, stdin `q`              |
//!
//! The S7 transport implementing `PlcClient` lives in
//! [`crate::fieldbus::s7`].

pub mod config_file;
pub mod display;
pub mod image_dir_camera;
pub mod log_sink;
#[cfg(feature = "opencv")]
pub mod opencv_io;
pub mod stop;
