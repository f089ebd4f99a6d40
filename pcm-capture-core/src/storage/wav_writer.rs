use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::config::RecordConfig;
use crate::models::error::StorageError;
use crate::models::state::WriterState;
use crate::processing::wav_format;

/// PCM format written into the container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl From<&RecordConfig> for WavSpec {
    fn from(config: &RecordConfig) -> Self {
        Self {
            sample_rate: config.sample_rate_hz,
            channels: config.channels(),
            bits_per_sample: config.bits_per_sample(),
        }
    }
}

/// Streaming WAV writer with a backpatched header.
///
/// ## File Format
///
/// **Header mode:**
/// ```text
/// [44-byte WAV header, both size fields zero until close]
/// [raw PCM data...]
/// ```
///
/// **Raw mode:** PCM data only.
///
/// A writer with no path or no spec is inert: `open` logs and leaves it
/// unopened, and the session records without persistence.
pub struct WavFileWriter {
    path: Option<PathBuf>,
    spec: Option<WavSpec>,
    use_header: bool,
    file: Option<File>,
    state: WriterState,
    data_bytes: u64,
}

impl WavFileWriter {
    pub fn new(path: Option<PathBuf>, spec: Option<WavSpec>, use_header: bool) -> Self {
        Self {
            path,
            spec,
            use_header,
            file: None,
            state: WriterState::Unopened,
            data_bytes: 0,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// PCM bytes appended so far, excluding the header.
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    /// Create or truncate the target and write the provisional header.
    pub fn open(&mut self) -> Result<(), StorageError> {
        if self.state == WriterState::Open {
            return Ok(());
        }
        let Some(path) = self.path.clone() else {
            log::debug!("record file path not set, data will not be saved");
            return Ok(());
        };
        let Some(spec) = self.spec else {
            log::debug!("record config not set, data will not be saved");
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::SinkUnavailable(format!("failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| StorageError::SinkUnavailable(format!("failed to create {}: {}", path.display(), e)))?;

        if self.use_header {
            let header = wav_format::provisional_header(spec.sample_rate, spec.channels, spec.bits_per_sample);
            file = write_header_or_discard(file, &path, &header)?;
        }

        log::debug!("saving recording to {}", path.display());
        self.file = Some(file);
        self.data_bytes = 0;
        self.state = WriterState::Open;
        Ok(())
    }

    /// Append raw PCM bytes. Does nothing when the writer is not open.
    pub fn append(&mut self, data: &[u8]) -> Result<(), StorageError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        file.write_all(data)
            .map_err(|e| StorageError::WriteError(e.to_string()))?;
        self.data_bytes += data.len() as u64;
        Ok(())
    }

    /// Patch the header sizes from the final file length and release the
    /// file. The handle is dropped on every path, including failures.
    pub fn close(&mut self) -> Result<PathBuf, StorageError> {
        let Some(mut file) = self.file.take() else {
            return Err(StorageError::CloseError("file was never opened".into()));
        };
        self.state = WriterState::Closed;

        let path = self
            .path
            .clone()
            .ok_or_else(|| StorageError::CloseError("no target path".into()))?;

        if self.use_header {
            patch_header(&mut file).map_err(|e| StorageError::CloseError(e.to_string()))?;
        }
        file.flush().map_err(|e| StorageError::CloseError(e.to_string()))?;

        let len = file.metadata().map(|m| m.len()).unwrap_or_default();
        log::debug!("recording file closed: {} ({} bytes)", path.display(), len);
        Ok(path)
    }

    /// Delete the partial artifact without patching. Safe to call when the
    /// writer was never opened.
    pub fn cancel(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        drop(file);
        self.state = WriterState::Cancelled;

        if let Some(path) = self.path.as_deref() {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    log::warn!("failed to remove cancelled recording {}: {}", path.display(), e);
                }
            }
        }
    }
}

/// Write the provisional header. On failure the truncated target is removed
/// so no headerless artifact is left behind.
fn write_header_or_discard(mut file: File, path: &Path, header: &[u8]) -> Result<File, StorageError> {
    match file.write_all(header) {
        Ok(()) => Ok(file),
        Err(e) => {
            drop(file);
            if let Err(rm) = fs::remove_file(path) {
                log::warn!("failed to remove {}: {}", path.display(), rm);
            }
            Err(StorageError::SinkUnavailable(format!("failed to write header: {}", e)))
        }
    }
}

fn patch_header(file: &mut File) -> std::io::Result<()> {
    let total = file.seek(SeekFrom::End(0))?;
    let (riff_size, data_size) = wav_format::size_fields(total);

    file.seek(SeekFrom::Start(wav_format::RIFF_SIZE_OFFSET))?;
    file.write_all(&riff_size.to_le_bytes())?;

    file.seek(SeekFrom::Start(wav_format::DATA_SIZE_OFFSET))?;
    file.write_all(&data_size.to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
impl WavFileWriter {
    /// An open writer whose handle rejects every write.
    pub(crate) fn read_only(path: PathBuf, spec: WavSpec) -> Self {
        fs::write(&path, []).unwrap();
        Self {
            file: Some(File::open(&path).unwrap()),
            state: WriterState::Open,
            ..Self::new(Some(path), Some(spec), true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> WavSpec {
        WavSpec {
            sample_rate: 16000,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    #[test]
    fn close_patches_both_sizes() {
        let dir = tempfile::tempdir().unwrap();
        for frames in [0usize, 1, 7] {
            let path = dir.path().join(format!("n{}.wav", frames));
            let mut writer = WavFileWriter::new(Some(path.clone()), Some(spec()), true);
            writer.open().unwrap();
            for i in 0..frames {
                writer.append(&[i as u8; 640]).unwrap();
            }
            assert_eq!(writer.close().unwrap(), path);

            let data = fs::read(&path).unwrap();
            assert_eq!(data.len(), 44 + frames * 640);
            assert_eq!(u32_at(&data, 4) as usize, data.len() - 8);
            assert_eq!(u32_at(&data, 40) as usize, data.len() - 44);
            assert_eq!(&data[0..4], b"RIFF");
            assert_eq!(writer.state(), WriterState::Closed);
        }
    }

    #[test]
    fn raw_mode_writes_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.pcm");
        let mut writer = WavFileWriter::new(Some(path.clone()), Some(spec()), false);
        writer.open().unwrap();
        writer.append(&[1, 2, 3, 4]).unwrap();
        writer.close().unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn open_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.wav");
        fs::write(&path, vec![0xAA; 4096]).unwrap();

        let mut writer = WavFileWriter::new(Some(path.clone()), Some(spec()), true);
        writer.open().unwrap();
        writer.close().unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 44);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("rec.wav");
        let mut writer = WavFileWriter::new(Some(path.clone()), Some(spec()), true);
        writer.open().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn cancel_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.wav");
        let mut writer = WavFileWriter::new(Some(path.clone()), Some(spec()), true);
        writer.open().unwrap();
        writer.append(&[0u8; 100]).unwrap();
        writer.cancel();

        assert!(!path.exists());
        assert_eq!(writer.state(), WriterState::Cancelled);
    }

    #[test]
    fn cancel_and_append_without_open_are_noops() {
        let mut writer = WavFileWriter::new(None, Some(spec()), true);
        writer.cancel();
        writer.append(&[1, 2]).unwrap();
        assert_eq!(writer.state(), WriterState::Unopened);
        assert_eq!(writer.data_bytes(), 0);
    }

    #[test]
    fn missing_path_or_spec_skips_persistence() {
        let mut no_path = WavFileWriter::new(None, Some(spec()), true);
        no_path.open().unwrap();
        assert_eq!(no_path.state(), WriterState::Unopened);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nospec.wav");
        let mut no_spec = WavFileWriter::new(Some(path.clone()), None, true);
        no_spec.open().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn close_without_open_is_an_error() {
        let mut writer = WavFileWriter::new(None, None, true);
        assert!(matches!(writer.close(), Err(StorageError::CloseError(_))));
    }

    #[test]
    fn unwritable_target_is_sink_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as the output file.
        let mut writer = WavFileWriter::new(Some(dir.path().to_path_buf()), Some(spec()), true);
        assert!(matches!(writer.open(), Err(StorageError::SinkUnavailable(_))));
        assert_eq!(writer.state(), WriterState::Unopened);
    }

    #[test]
    fn failed_append_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.wav");
        let mut writer = WavFileWriter::read_only(path.clone(), spec());

        let err = writer.append(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, StorageError::WriteError(_)));
        assert_eq!(writer.data_bytes(), 0);

        writer.cancel();
        assert!(!path.exists());
        assert_eq!(writer.state(), WriterState::Cancelled);
    }

    #[test]
    fn failed_header_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("header.wav");
        fs::write(&path, []).unwrap();
        let read_only = File::open(&path).unwrap();

        let err = write_header_or_discard(read_only, &path, &[0u8; wav_format::WAV_HEADER_SIZE]).unwrap_err();
        assert!(matches!(err, StorageError::SinkUnavailable(_)));
        assert!(!path.exists());
    }
}
