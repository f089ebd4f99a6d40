use std::path::Path;

/// Consumer callbacks for a recorder.
///
/// Every method has an empty default, so listeners implement only what they
/// need. All methods run on the executor except
/// [`on_record_data_on_worker_thread`](RecordListener::on_record_data_on_worker_thread),
/// which runs synchronously on the capture thread and must stay cheap.
pub trait RecordListener: Send + Sync {
    fn on_start_recording(&self) {}

    /// One frame of interleaved samples.
    fn on_record_data(&self, _data: &[i16]) {}

    /// Same frame as [`on_record_data`](RecordListener::on_record_data),
    /// delivered before it on the capture thread.
    fn on_record_data_on_worker_thread(&self, _data: &[i16]) {}

    /// Frame loudness in dB, see [`calculate_volume`](crate::processing::volume::calculate_volume).
    fn on_voice_volume(&self, _volume: i32) {}

    /// A terminal capture fault with its stable code.
    fn on_record_error(&self, _code: i32, _message: &str) {}

    fn on_file_save_failed(&self, _reason: &str) {}

    fn on_file_save_success(&self, _path: &Path) {}

    fn on_stop_recording(&self) {}

    /// Every PCM byte captured during the session, in container encoding.
    fn on_recorded_all_data(&self, _data: &[u8]) {}
}
