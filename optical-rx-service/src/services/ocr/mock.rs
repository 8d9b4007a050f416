//! Canned vision provider for tests and keyless local runs.

use super::{InlineImage, ProviderError, VisionProvider};
use async_trait::async_trait;

pub struct MockVisionProvider {
    answer: Option<String>,
}

impl MockVisionProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { answer: None }
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn describe(&self, _image: &InlineImage, _prompt: &str) -> Result<String, ProviderError> {
        self.answer
            .clone()
            .ok_or_else(|| ProviderError::ApiError("Mock vision provider failure".to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
