//! Test doubles for the encoder seams.

mod mock_encoder;

pub use mock_encoder::{MockImageEncoder, MockVideoEncoder, RecordedEncode};
