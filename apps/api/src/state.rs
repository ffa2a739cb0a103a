use crate::facades::Platform;
use crate::review::ReviewPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub platform: Platform,
    pub review: ReviewPipeline,
}

impl AppState {
    pub fn new(platform: Platform) -> Self {
        Self {
            review: ReviewPipeline::new(platform.clone()),
            platform,
        }
    }
}
