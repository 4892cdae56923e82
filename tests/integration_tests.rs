use anyhow::Result;
use etl_automator::utils::validation::Validate;
use etl_automator::{AutomatorConfig, AutomatorPipeline, EtlEngine, EtlError, LocalStorage};
use httpmock::prelude::*;
use tempfile::TempDir;

type LocalEngine = EtlEngine<AutomatorPipeline<LocalStorage>>;

fn engine_for(config_toml: &str, base: &std::path::Path) -> Result<LocalEngine> {
    let config = AutomatorConfig::from_toml_str(config_toml)?;
    config.validate()?;
    let pipeline = AutomatorPipeline::new(LocalStorage::new(base), config);
    Ok(EtlEngine::new(pipeline))
}

#[tokio::test]
async fn test_end_to_end_api_and_csv_to_csv() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("people.csv"),
        "given,family,ignored\nAnn,Lee,x\n\"Mary Jo\",\"O'Neil, Jr\",y\n",
    )?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/people");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {"id": 1, "first_name": "Jane", "last_name": "Doe", "extra": true},
                {"id": 2, "first_name": "John", "last_name": "Roe"}
            ]));
    });

    let config = format!(
        r#"
[[data_sources]]
type = "api"
url = "{}"
mapping = {{ first_name = "first_name", last_name = "last_name" }}

[[data_sources]]
type = "csv"
file_path = "people.csv"
mapping = {{ first_name = "given", last_name = "family" }}

[[pipeline.transforms]]
output = "full_name"
op = "concat"
fields = ["first_name", "last_name"]
separator = " "

[[pipeline.transforms]]
output = "shout"
op = "uppercase"
field = "last_name"

[pipeline.destination]
type = "csv"
file_path = "out/people.csv"
"#,
        server.url("/people")
    );

    let engine = engine_for(&config, temp_dir.path())?;
    let output = engine.run().await?;

    api_mock.assert();
    assert_eq!(output, "out/people.csv");

    let written = std::fs::read_to_string(temp_dir.path().join("out/people.csv"))?;
    assert_eq!(
        written,
        "full_name,shout\n\
         Jane Doe,DOE\n\
         John Roe,ROE\n\
         Ann Lee,LEE\n\
         \"Mary Jo O'Neil, Jr\",\"O'NEIL, JR\"\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_csv_to_api() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("in.csv"), "id,name\n1,Ann\n2,Bob\n")?;

    let server = MockServer::start();
    let sink = server.mock(|when, then| {
        when.method(POST).path("/sink").json_body(serde_json::json!([
            {"id": 1, "label": "#1 Ann"},
            {"id": 2, "label": "#2 Bob"}
        ]));
        then.status(200);
    });

    let config = format!(
        r##"
[[data_sources]]
type = "csv"
file_path = "in.csv"
mapping = {{ id = "id", name = "name" }}

[[pipeline.transforms]]
output = "id"
op = "to_number"
field = "id"

[[pipeline.transforms]]
output = "label"
op = "template"
template = "#{{id}} {{name}}"

[pipeline.destination]
type = "api"
url = "{}"
"##,
        server.url("/sink")
    );

    let engine = engine_for(&config, temp_dir.path())?;
    let output = engine.run().await?;

    sink.assert();
    assert_eq!(output, server.url("/sink"));
    Ok(())
}

#[tokio::test]
async fn test_destination_failure_leaves_no_local_artifact() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("in.csv"), "id\n1\n")?;

    let server = MockServer::start();
    let sink = server.mock(|when, then| {
        when.method(POST).path("/sink");
        then.status(500).body("internal error");
    });

    let config = format!(
        r#"
[[data_sources]]
type = "csv"
file_path = "in.csv"
mapping = {{ id = "id" }}

[[pipeline.transforms]]
output = "id"
op = "copy"
field = "id"

[pipeline.destination]
type = "api"
url = "{}"
"#,
        server.url("/sink")
    );

    let engine = engine_for(&config, temp_dir.path())?;
    let err = engine.run().await.unwrap_err();

    sink.assert();
    assert!(matches!(err, EtlError::DestinationError { status: 500, .. }));
    let entries: Vec<_> = std::fs::read_dir(temp_dir.path())?.collect();
    assert_eq!(entries.len(), 1, "only the input file should exist");
    Ok(())
}

#[tokio::test]
async fn test_transform_failure_aborts_before_writing() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/data");
        then.status(200)
            .json_body(serde_json::json!([{"id": 1, "name": "Ann"}]));
    });

    // The mapping never produces first_name/last_name, so the concat rule fails.
    let config = format!(
        r#"
[[data_sources]]
type = "api"
url = "{}"
mapping = {{ id = "id", name = "name" }}

[[pipeline.transforms]]
output = "full_name"
op = "concat"
fields = ["first_name", "last_name"]
separator = " "

[pipeline.destination]
type = "csv"
file_path = "output.csv"
"#,
        server.url("/data")
    );

    let engine = engine_for(&config, temp_dir.path())?;
    let err = engine.run().await.unwrap_err();

    api_mock.assert();
    assert_eq!(err.kind(), "TransformError");
    assert!(err.to_string().contains("first_name"));
    assert!(!temp_dir.path().join("output.csv").exists());
    Ok(())
}

#[tokio::test]
async fn test_zero_records_to_csv_is_empty_output_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("header_only.csv"), "id,name\n")?;

    let config = r#"
[[data_sources]]
type = "csv"
file_path = "header_only.csv"
mapping = { id = "id" }

[[pipeline.transforms]]
output = "id"
op = "copy"
field = "id"

[pipeline.destination]
type = "csv"
file_path = "output.csv"
"#;

    let engine = engine_for(config, temp_dir.path())?;
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, EtlError::EmptyOutputError { .. }));
    assert!(!temp_dir.path().join("output.csv").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_source_file_is_not_found() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let config = r#"
[[data_sources]]
type = "csv"
file_path = "data.csv"
mapping = { id = "id" }

[pipeline.destination]
type = "csv"
file_path = "output.csv"
"#;

    let engine = engine_for(config, temp_dir.path())?;
    let err = engine.run().await.unwrap_err();

    assert_eq!(err.kind(), "NotFoundError");
    assert_eq!(err.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn test_malformed_api_body_is_format_error() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/data");
        then.status(200).json_body(serde_json::json!({"items": []}));
    });

    let config = format!(
        r#"
[[data_sources]]
type = "api"
url = "{}"
mapping = {{ id = "id" }}

[pipeline.destination]
type = "csv"
file_path = "output.csv"
"#,
        server.url("/data")
    );

    let engine = engine_for(&config, temp_dir.path())?;
    let err = engine.run().await.unwrap_err();

    api_mock.assert();
    assert!(matches!(err, EtlError::FormatError { .. }));
    Ok(())
}
