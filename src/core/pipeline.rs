use crate::config::AutomatorConfig;
use crate::core::reader::SourceReader;
use crate::core::transform::TransformPipeline;
use crate::core::writer::DestinationWriter;
use crate::core::{Pipeline, Record, Storage};
use crate::utils::error::Result;
use reqwest::Client;

/// Reader, transform pipeline and writer wired from one configuration.
pub struct AutomatorPipeline<S: Storage + Clone> {
    config: AutomatorConfig,
    reader: SourceReader<S>,
    transforms: TransformPipeline,
    writer: DestinationWriter<S>,
}

impl<S: Storage + Clone> AutomatorPipeline<S> {
    pub fn new(storage: S, config: AutomatorConfig) -> Self {
        let client = Client::new();
        let transforms = TransformPipeline::from_specs(&config.pipeline.transforms);
        Self::with_transforms(storage, config, transforms, client)
    }

    /// Uses hand-built rules (closures) instead of the configured ones.
    pub fn with_transforms(
        storage: S,
        config: AutomatorConfig,
        transforms: TransformPipeline,
        client: Client,
    ) -> Self {
        Self {
            reader: SourceReader::with_client(storage.clone(), client.clone()),
            writer: DestinationWriter::with_client(storage, client),
            transforms,
            config,
        }
    }

    pub fn config(&self) -> &AutomatorConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl<S: Storage + Clone> Pipeline for AutomatorPipeline<S> {
    async fn extract(&self) -> Result<Vec<Record>> {
        self.reader.read(&self.config.data_sources).await
    }

    async fn transform(&self, data: Vec<Record>) -> Result<Vec<Record>> {
        tracing::debug!(
            "Applying {} transform rules to {} records",
            self.transforms.rules().len(),
            data.len()
        );
        self.transforms.transform(&data)
    }

    async fn load(&self, data: Vec<Record>) -> Result<String> {
        self.writer
            .write(&data, &self.config.pipeline.destination)
            .await
    }
}
