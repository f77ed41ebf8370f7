// src/headlines/types.rs
use anyhow::Result;

/// One external headline source. Implementations fetch and pre-extract a raw
/// candidate title; the shared cleanup happens in the chain.
#[async_trait::async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch(&self) -> Result<String>;
    fn name(&self) -> &str;
}
