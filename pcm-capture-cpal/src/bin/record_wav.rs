//! Record from an input device into a WAV file.
//!
//! ```text
//! record-wav <output.wav> [options.json]
//! record-wav --list
//! ```
//!
//! `options.json` holds `RecorderOptions` fields; missing ones take their
//! defaults. With no max record time, recording runs until Enter is pressed.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pcm_capture_core::{RecordListener, Recorder, RecorderOptions, SerialExecutor};
use pcm_capture_cpal::{list_input_devices, CpalInput};

struct ConsoleListener {
    done: Mutex<Sender<()>>,
}

impl ConsoleListener {
    fn finish(&self) {
        let _ = self.done.lock().send(());
    }
}

impl RecordListener for ConsoleListener {
    fn on_start_recording(&self) {
        log::info!("recording");
    }

    fn on_voice_volume(&self, volume: i32) {
        log::info!("volume {} dB", volume);
    }

    fn on_record_error(&self, code: i32, message: &str) {
        log::error!("recording failed ({}): {}", code, message);
        self.finish();
    }

    fn on_file_save_failed(&self, reason: &str) {
        log::error!("file not saved: {}", reason);
    }

    fn on_file_save_success(&self, path: &Path) {
        println!("{}", path.display());
    }

    fn on_stop_recording(&self) {
        self.finish();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let first = args
        .next()
        .ok_or("usage: record-wav <output.wav> [options.json] | --list")?;
    if first == "--list" {
        for name in list_input_devices() {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut options = match args.next() {
        Some(path) => serde_json::from_str::<RecorderOptions>(&std::fs::read_to_string(path)?)?,
        None => RecorderOptions::default(),
    };
    options.record_file_path = Some(PathBuf::from(first));

    let executor = Arc::new(SerialExecutor::new("record-wav-ui")?);
    let recorder = Recorder::new(Arc::new(CpalInput::new()), executor);
    recorder.set_options(options.clone())?;

    let (done_tx, done_rx) = mpsc::channel();
    recorder.set_listener(Some(Arc::new(ConsoleListener {
        done: Mutex::new(done_tx),
    })));

    if !recorder.is_record_permission_granted() {
        return Err("no input device available".into());
    }
    if !recorder.start() {
        return Err("failed to start recording".into());
    }

    if options.max_record_time_ms.is_none() {
        println!("press Enter to stop");
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        recorder.stop();
    }

    let grace = options.max_record_time_ms.unwrap_or(0) + 5000;
    done_rx.recv_timeout(Duration::from_millis(grace))?;

    if let Some(summary) = recorder.last_session() {
        log::info!("{}", summary.to_json()?);
    }
    Ok(())
}
