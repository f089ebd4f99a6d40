pub mod wav_writer;
