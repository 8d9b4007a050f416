pub mod alerts;
pub mod analytics;
pub mod database;
pub mod dates;
pub mod limits;
pub mod memory;
pub mod metrics;
pub mod ocr;
pub mod store;

pub use database::MongoStore;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use ocr::{GeminiVisionProvider, InlineImage, MockVisionProvider, OcrService, VisionProvider};
pub use store::{AlertScope, RxStore};
