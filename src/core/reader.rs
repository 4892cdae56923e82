use crate::adapters::http;
use crate::domain::model::{ApiSource, FieldMapping, FileSource, Record, SourceDescriptor};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde_json::Value;

/// Pulls records from every configured source, one source at a time.
pub struct SourceReader<S: Storage> {
    storage: S,
    client: Client,
}

impl<S: Storage> SourceReader<S> {
    pub fn new(storage: S) -> Self {
        Self::with_client(storage, http::default_client())
    }

    pub fn with_client(storage: S, client: Client) -> Self {
        Self { storage, client }
    }

    /// Concatenates the records of all sources in list order.
    pub async fn read(&self, sources: &[SourceDescriptor]) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        for (index, source) in sources.iter().enumerate() {
            tracing::info!("📥 Reading source #{}: {}", index + 1, source.location());
            let batch = match source {
                SourceDescriptor::Api(api) => self.read_api(api).await?,
                SourceDescriptor::File(file) => self.read_file(file).await?,
            };
            tracing::debug!("Source #{} produced {} records", index + 1, batch.len());
            records.extend(batch);
        }

        Ok(records)
    }

    async fn read_api(&self, source: &ApiSource) -> Result<Vec<Record>> {
        let request = http::with_options(
            self.client.get(&source.url),
            &source.headers,
            source.timeout_seconds,
        );

        tracing::debug!("Making API request to: {}", source.url);
        let response = request.send().await.map_err(|e| EtlError::TransportError {
            url: source.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        if !status.is_success() {
            return Err(EtlError::TransportError {
                url: source.url.clone(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.text().await.map_err(|e| EtlError::TransportError {
            url: source.url.clone(),
            message: e.to_string(),
        })?;

        parse_api_body(&source.url, &body, &source.field_mapping)
    }

    async fn read_file(&self, source: &FileSource) -> Result<Vec<Record>> {
        let data = self.storage.read_file(&source.path).await?;
        parse_csv(&source.path, &data, &source.field_mapping)
    }
}

/// Builds a record holding exactly the mapping's output fields, in mapping
/// order. A native field the lookup cannot find becomes null.
pub fn project<F>(mapping: &FieldMapping, lookup: F) -> Record
where
    F: Fn(&str) -> Option<Value>,
{
    mapping
        .iter()
        .map(|(output, native)| {
            let value = lookup(native.as_str()).unwrap_or(Value::Null);
            (output.as_str(), value)
        })
        .collect()
}

pub fn parse_api_body(url: &str, body: &str, mapping: &FieldMapping) -> Result<Vec<Record>> {
    let format_error = |message: String| EtlError::FormatError {
        url: url.to_string(),
        message,
    };

    let json: Value = serde_json::from_str(body).map_err(|e| format_error(e.to_string()))?;
    let items = match json {
        Value::Array(items) => items,
        other => {
            return Err(format_error(format!(
                "expected a JSON array, got {}",
                json_type(&other)
            )))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(obj) => Ok(project(mapping, |native| obj.get(native).cloned())),
            other => Err(format_error(format!(
                "item {} is {}, not an object",
                index,
                json_type(other)
            ))),
        })
        .collect()
}

/// Parses header-bearing CSV. Empty cells and cells past the end of a short
/// row read as null; duplicate header names resolve to the first column.
///
/// The CSV reader cannot tell a quoted `""` from an empty cell, so an empty
/// string written by the CSV destination reads back as null. Round trips
/// through a CSV file do not keep `""` and null apart.
pub fn parse_csv(path: &str, data: &[u8], mapping: &FieldMapping) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<usize>> = mapping
        .values()
        .map(|native| {
            let position = headers.iter().position(|h| h == native);
            if position.is_none() {
                tracing::warn!("Column '{}' not found in {}; values will be null", native, path);
            }
            position
        })
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record = mapping
            .keys()
            .zip(&columns)
            .map(|(output, column)| {
                let value = column
                    .and_then(|i| row.get(i))
                    .filter(|cell| !cell.is_empty())
                    .map(|cell| Value::String(cell.to_string()))
                    .unwrap_or(Value::Null);
                (output.as_str(), value)
            })
            .collect();
        records.push(record);
    }

    Ok(records)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
