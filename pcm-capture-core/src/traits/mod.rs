pub mod audio_input;
pub mod capture_callback;
pub mod executor;
pub mod record_listener;
