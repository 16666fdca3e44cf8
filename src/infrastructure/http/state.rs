//! Application State

use std::sync::Arc;

use crate::application::SpeechPipeline;

/// 应用状态
///
/// HTTP 层只依赖管线编排器这一个入口，所有端口经由它组合
pub struct AppState {
    pub pipeline: Arc<SpeechPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<SpeechPipeline>) -> Self {
        Self { pipeline }
    }
}
