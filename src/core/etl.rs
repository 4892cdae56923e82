use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

/// Runs extract, transform and load once, in that order. The first failure
/// ends the run; nothing later executes.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting ETL process...");

        tracing::info!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", raw_data.len());

        tracing::info!("Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!("Transformed {} records", transformed.len());

        tracing::info!("Loading data...");
        let output = self.pipeline.load(transformed).await?;
        tracing::info!("Output written to: {} ({:?})", output, started.elapsed());

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Record;
    use crate::utils::error::EtlError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPipeline {
        fail_transform: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait::async_trait]
    impl Pipeline for RecordingPipeline {
        async fn extract(&self) -> Result<Vec<Record>> {
            self.calls.lock().unwrap().push("extract");
            Ok(vec![Record::new()])
        }

        async fn transform(&self, data: Vec<Record>) -> Result<Vec<Record>> {
            self.calls.lock().unwrap().push("transform");
            if self.fail_transform {
                return Err(EtlError::TransformError {
                    output: "x".to_string(),
                    message: "field 'y' is missing from the record".to_string(),
                });
            }
            Ok(data)
        }

        async fn load(&self, _data: Vec<Record>) -> Result<String> {
            self.calls.lock().unwrap().push("load");
            Ok("out.csv".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_executes_stages_in_order() {
        let engine = EtlEngine::new(RecordingPipeline::default());

        let output = engine.run().await.unwrap();

        assert_eq!(output, "out.csv");
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_the_run() {
        let engine = EtlEngine::new(RecordingPipeline {
            fail_transform: true,
            ..Default::default()
        });

        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, EtlError::TransformError { .. }));
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["extract", "transform"]
        );
    }
}
