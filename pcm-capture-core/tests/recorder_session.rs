// Integration tests for a full recorder session
//
// Drives the public Recorder API end to end with a synthetic input device and
// a real dispatch thread, then checks what landed on disk and what the
// listener saw.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use pcm_capture_core::processing::wav_format::{self, WAV_HEADER_SIZE};
use pcm_capture_core::{
    AudioInput, DeviceError, InputStream, RecordConfig, RecordListener, Recorder, SerialExecutor,
    SessionOutcome,
};

/// Input that produces a sawtooth, one sample per tick, paced at ~1ms/frame.
struct ToneInput {
    opened: AtomicUsize,
}

struct ToneStream {
    next: i16,
    recording: bool,
}

impl AudioInput for ToneInput {
    type Stream = ToneStream;

    fn has_record_permission(&self) -> bool {
        true
    }

    fn minimum_buffer_size(&self, _config: &RecordConfig) -> Result<usize, DeviceError> {
        Ok(0)
    }

    fn open(&self, _config: &RecordConfig, _buffer_size_bytes: usize) -> Result<ToneStream, DeviceError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ToneStream {
            next: 0,
            recording: false,
        })
    }
}

impl InputStream for ToneStream {
    fn start_capture(&mut self) -> Result<(), DeviceError> {
        self.recording = true;
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), DeviceError> {
        self.recording = false;
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, DeviceError> {
        thread::sleep(Duration::from_millis(1));
        for sample in buffer.iter_mut() {
            *sample = self.next;
            self.next = self.next.wrapping_add(97);
        }
        Ok(buffer.len())
    }

    fn release(&mut self) {}
}

#[derive(Debug)]
enum Event {
    Saved(PathBuf),
    AllData(Vec<u8>),
    Frames(usize),
    Stopped,
}

struct ChannelListener {
    events: Mutex<Sender<Event>>,
    worker_frames: AtomicUsize,
    ui_frames: AtomicUsize,
}

impl ChannelListener {
    fn new() -> (Arc<Self>, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        let listener = Arc::new(Self {
            events: Mutex::new(tx),
            worker_frames: AtomicUsize::new(0),
            ui_frames: AtomicUsize::new(0),
        });
        (listener, rx)
    }

    fn send(&self, event: Event) {
        let _ = self.events.lock().send(event);
    }
}

impl RecordListener for ChannelListener {
    fn on_record_data(&self, _data: &[i16]) {
        self.ui_frames.fetch_add(1, Ordering::SeqCst);
    }

    fn on_record_data_on_worker_thread(&self, _data: &[i16]) {
        self.worker_frames.fetch_add(1, Ordering::SeqCst);
    }

    fn on_file_save_success(&self, path: &Path) {
        self.send(Event::Saved(path.to_path_buf()));
    }

    fn on_recorded_all_data(&self, data: &[u8]) {
        self.send(Event::AllData(data.to_vec()));
    }

    fn on_stop_recording(&self) {
        let frames = self.ui_frames.load(Ordering::SeqCst);
        self.send(Event::Frames(frames));
        self.send(Event::Stopped);
    }
}

fn collect_until_stopped(rx: &Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    loop {
        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("recorder never reported stop");
        let done = matches!(event, Event::Stopped);
        events.push(event);
        if done {
            return events;
        }
    }
}

#[test]
fn test_timed_recording_produces_valid_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session").join("tone.wav");

    let input = Arc::new(ToneInput {
        opened: AtomicUsize::new(0),
    });
    let executor = Arc::new(SerialExecutor::new("ui-dispatch").unwrap());
    let (listener, rx) = ChannelListener::new();

    let recorder = Recorder::new(input.clone(), executor);
    recorder
        .set_listener(Some(listener.clone()))
        .set_max_record_time(Some(200))
        .set_record_file_path(Some(path.clone()));

    assert!(recorder.start());
    let events = collect_until_stopped(&rx);

    let mut all_data = None;
    let mut saved = None;
    let mut ui_frames = None;
    for event in events {
        match event {
            Event::Saved(p) => saved = Some(p),
            Event::AllData(d) => all_data = Some(d),
            Event::Frames(n) => ui_frames = Some(n),
            Event::Stopped => {}
        }
    }

    // 200 ms at 20 ms per frame.
    assert_eq!(ui_frames, Some(10));
    assert_eq!(listener.worker_frames.load(Ordering::SeqCst), 10);
    assert_eq!(saved.as_deref(), Some(path.as_path()));

    let file = std::fs::read(&path).unwrap();
    let all_data = all_data.unwrap();
    assert_eq!(all_data.len(), 10 * 320 * 2);
    assert_eq!(file.len(), WAV_HEADER_SIZE + all_data.len());

    // Wrapping the delivered buffer reproduces the file exactly.
    let wrapped = wav_format::wrap_pcm_for(&recorder.config(), &all_data);
    assert_eq!(wrapped, file);

    let summary = recorder.last_session().unwrap();
    assert_eq!(summary.outcome, SessionOutcome::Completed);
    assert_eq!(summary.frames, 10);
    assert_eq!(input.opened.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stop_is_final() {
    let input = Arc::new(ToneInput {
        opened: AtomicUsize::new(0),
    });
    let executor = Arc::new(SerialExecutor::new("ui-dispatch").unwrap());
    let (listener, rx) = ChannelListener::new();

    let recorder = Recorder::new(input, executor);
    recorder.set_listener(Some(listener.clone())).set_max_record_time(None);

    assert!(recorder.start());
    thread::sleep(Duration::from_millis(30));
    recorder.stop();
    assert!(!recorder.is_started());

    let delivered = listener.worker_frames.load(Ordering::SeqCst);
    assert!(delivered > 0);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(listener.worker_frames.load(Ordering::SeqCst), delivered);

    let events = collect_until_stopped(&rx);
    assert!(events.iter().any(|e| matches!(e, Event::AllData(d) if d.len() == delivered * 640)));
}
