//! Operator stop adapter: Ctrl-C or a `q` line on stdin.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::{info, warn};

use crate::app::ports::StopPort;

/// Shared stop flag, polled once per cycle.
#[derive(Debug, Clone, Default)]
pub struct OperatorStop {
    flag: Arc<AtomicBool>,
}

impl OperatorStop {
    /// Flag only; nothing sets it except [`request`](Self::request).
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the Ctrl-C handler and the stdin watcher.
    ///
    /// A handler that cannot be installed is logged; stdin still works.
    pub fn install() -> Self {
        let stop = Self::new();

        let flag = stop.flag.clone();
        if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            warn!("Failed to install Ctrl+C handler: {err}");
        }

        let flag = stop.flag.clone();
        let spawned = thread::Builder::new()
            .name("stdin-stop".into())
            .spawn(move || watch_stdin(std::io::stdin().lock(), &flag));
        if let Err(err) = spawned {
            warn!("Failed to start stdin watcher: {err}");
        }

        info!("Press 'q' then Enter, or Ctrl+C, to stop");
        stop
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Set `flag` on the first line that reads `q`.  Other input is ignored.
fn watch_stdin(input: impl BufRead, flag: &AtomicBool) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        if line.trim().eq_ignore_ascii_case("q") {
            flag.store(true, Ordering::SeqCst);
            break;
        }
    }
}

/// Whether a window key code is the stop key.  Only the low byte names
/// the key; higher bits carry modifier state on some backends.
pub fn is_quit_key(key: i32) -> bool {
    key & 0xFF == i32::from(b'q')
}

impl StopPort for OperatorStop {
    fn stop_requested(&mut self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
