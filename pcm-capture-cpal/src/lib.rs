//! # pcm-capture-cpal
//!
//! Cross-platform input backend for pcm-capture-core, built on cpal.
//!
//! Provides:
//! - `CpalInput`: an [`AudioInput`](pcm_capture_core::AudioInput) for the
//!   default or a named input device
//! - `list_input_devices`: names accepted by `InputSource::Named`
//! - [`sample_convert`]: host sample formats to i16 frames
//!
//! The backend compiles only with the `cpal` feature, which needs the host's
//! audio development libraries (ALSA headers on Linux).
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use pcm_capture_core::{Recorder, SerialExecutor};
//! use pcm_capture_cpal::CpalInput;
//!
//! let executor = Arc::new(SerialExecutor::new("ui")?);
//! let recorder = Recorder::new(Arc::new(CpalInput::new()), executor);
//! recorder.set_record_file_path(Some("take.wav".into()));
//! recorder.start();
//! ```

pub mod sample_convert;

#[cfg(feature = "cpal")]
pub mod cpal_input;

#[cfg(feature = "cpal")]
pub use cpal_input::{list_input_devices, CpalInput, CpalStream};
