pub mod byte_order;
pub mod volume;
pub mod wav_format;
