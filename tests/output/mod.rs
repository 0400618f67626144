//! Output decoding tests.

mod decoder_test;
mod stream_test;
