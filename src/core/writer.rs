use crate::adapters::http;
use crate::domain::model::{ApiDestination, DestinationDescriptor, FileDestination, Record};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde_json::Value;

pub struct DestinationWriter<S: Storage> {
    storage: S,
    client: Client,
}

impl<S: Storage> DestinationWriter<S> {
    pub fn new(storage: S) -> Self {
        Self::with_client(storage, http::default_client())
    }

    pub fn with_client(storage: S, client: Client) -> Self {
        Self { storage, client }
    }

    /// Writes the whole batch and returns the destination's location.
    pub async fn write(
        &self,
        records: &[Record],
        destination: &DestinationDescriptor,
    ) -> Result<String> {
        match destination {
            DestinationDescriptor::File(file) => self.write_file(records, file).await?,
            DestinationDescriptor::Api(api) => self.write_api(records, api).await?,
        }
        Ok(destination.location().to_string())
    }

    async fn write_file(&self, records: &[Record], destination: &FileDestination) -> Result<()> {
        let data = render_csv(&destination.path, records)?;
        tracing::debug!(
            "Writing {} records ({} bytes) to {}",
            records.len(),
            data.len(),
            destination.path
        );
        self.storage.write_file(&destination.path, &data).await
    }

    async fn write_api(&self, records: &[Record], destination: &ApiDestination) -> Result<()> {
        let request = http::with_options(
            self.client.post(&destination.url).json(records),
            &destination.headers,
            destination.timeout_seconds,
        );

        tracing::debug!("Posting {} records to {}", records.len(), destination.url);
        let response = request.send().await.map_err(|e| EtlError::TransportError {
            url: destination.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        tracing::debug!("Destination response status: {}", status);
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("Could not read destination error body: {}", e);
                    String::new()
                }
            };
            return Err(EtlError::DestinationError {
                url: destination.url.clone(),
                status: status.as_u16(),
                body: http::body_excerpt(&body),
            });
        }

        Ok(())
    }
}

/// Renders records as CSV. The header is the first record's keys; every row is
/// that record's own values in its own field order, so records with a
/// different key layout than the first produce misaligned rows.
pub fn render_csv(path: &str, records: &[Record]) -> Result<Vec<u8>> {
    let Some(first) = records.first() else {
        return Err(EtlError::EmptyOutputError {
            path: path.to_string(),
        });
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(first.keys())?;
    for record in records {
        writer.write_record(record.values().map(cell_text))?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
