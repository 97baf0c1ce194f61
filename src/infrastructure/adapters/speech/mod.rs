//! Speech Adapter - 语音引擎实现

mod simulated_speech_engine;

pub use simulated_speech_engine::{SimulatedSpeechConfig, SimulatedSpeechEngine};
