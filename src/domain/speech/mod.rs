//! Speech Context - 语音合成上下文
//!
//! 值对象: 语言标签、合成模式、媒体类型、音频格式、待合成文本

mod value_objects;

pub use value_objects::{
    AudioFormat, Language, MediaType, SpeechText, SpeechTextError, SynthesisMode,
};
