//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod detect;
pub mod extract;
pub mod tts;

pub use detect::*;
pub use extract::*;
pub use tts::*;
