//! Scripted input device for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::RecordConfig;
use crate::models::error::DeviceError;
use crate::traits::audio_input::{AudioInput, InputStream};

#[derive(Debug, Clone)]
pub enum ReadStep {
    /// A full frame filled with this value.
    Frame(i16),
    /// A short read of this many samples.
    Short(usize),
    Fault,
}

#[derive(Debug, Clone, Copy)]
pub enum Tail {
    /// Keep producing full frames of this value, paced at ~1ms.
    Repeat(i16),
    /// End the stream with an empty read.
    End,
}

#[derive(Default)]
pub struct Counters {
    pub opens: AtomicUsize,
    pub releases: AtomicUsize,
    pub reads: AtomicUsize,
    pub last_buffer_size: AtomicUsize,
}

pub struct ScriptedInput {
    pub permission: AtomicBool,
    pub open_error: Option<DeviceError>,
    pub minimum_buffer: usize,
    /// Whether `start_capture` actually enters the recording state.
    pub starts_recording: bool,
    pub script: Mutex<VecDeque<ReadStep>>,
    pub tail: Tail,
    pub counters: Arc<Counters>,
}

impl ScriptedInput {
    pub fn frames(values: &[i16], tail: Tail) -> Self {
        Self {
            permission: AtomicBool::new(true),
            open_error: None,
            minimum_buffer: 0,
            starts_recording: true,
            script: Mutex::new(values.iter().map(|&v| ReadStep::Frame(v)).collect()),
            tail,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_steps(steps: Vec<ReadStep>, tail: Tail) -> Self {
        let input = Self::frames(&[], tail);
        *input.script.lock() = steps.into();
        input
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }
}

pub struct ScriptedStream {
    steps: VecDeque<ReadStep>,
    tail: Tail,
    starts_recording: bool,
    recording: bool,
    counters: Arc<Counters>,
}

impl AudioInput for ScriptedInput {
    type Stream = ScriptedStream;

    fn has_record_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn minimum_buffer_size(&self, _config: &RecordConfig) -> Result<usize, DeviceError> {
        Ok(self.minimum_buffer)
    }

    fn open(&self, _config: &RecordConfig, buffer_size_bytes: usize) -> Result<ScriptedStream, DeviceError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        self.counters
            .last_buffer_size
            .store(buffer_size_bytes, Ordering::SeqCst);
        Ok(ScriptedStream {
            steps: std::mem::take(&mut *self.script.lock()),
            tail: self.tail,
            starts_recording: self.starts_recording,
            recording: false,
            counters: Arc::clone(&self.counters),
        })
    }
}

impl InputStream for ScriptedStream {
    fn start_capture(&mut self) -> Result<(), DeviceError> {
        self.recording = self.starts_recording;
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
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front() {
            Some(ReadStep::Frame(v)) => {
                buffer.fill(v);
                Ok(buffer.len())
            }
            Some(ReadStep::Short(n)) => Ok(n.min(buffer.len())),
            Some(ReadStep::Fault) => Err(DeviceError::Fault("scripted fault".into())),
            None => match self.tail {
                Tail::Repeat(v) => {
                    thread::sleep(Duration::from_millis(1));
                    buffer.fill(v);
                    Ok(buffer.len())
                }
                Tail::End => Ok(0),
            },
        }
    }

    fn release(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}
