//! TTS Adapters - 合成后端适配器

mod espeak_client;
mod fake_speech_client;
mod http_speech_client;

pub use espeak_client::{EspeakClientConfig, EspeakSpeechClient};
pub use fake_speech_client::FakeSpeechClient;
pub use http_speech_client::{HttpSpeechClient, HttpSpeechClientConfig};
