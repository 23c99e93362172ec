pub mod wav;

pub use wav::{decode_wav, encode_wav, DecodedWav, SampleBuffer, WavError};
