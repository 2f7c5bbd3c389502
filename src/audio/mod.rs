pub mod accumulator;
pub mod transcode;

pub use accumulator::AudioAccumulator;
pub use transcode::{AudioTranscoder, SymphoniaTranscoder, TranscodeError};
