//! Detection Adapters - 语言检测实现

mod whatlang_detector;

pub use whatlang_detector::WhatlangDetector;
