// src/publish/mod.rs
pub mod mapper;
pub mod notion;

use anyhow::Result;

pub use mapper::{map_record, PageProperties};
pub use notion::NotionPublisher;

/// Creates one page per call in the target database.
///
/// Implementations report failure; isolating it per record is the sync job's job.
#[async_trait::async_trait]
pub trait PagePublisher: Send + Sync {
    async fn create_page(&self, properties: &PageProperties) -> Result<()>;
    fn name(&self) -> &'static str;
}
