use crate::domain::model::Record;
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::sync::{Arc, LazyLock};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern is valid"));

pub type ComputeFn = Arc<dyn Fn(&Record) -> Result<Value> + Send + Sync>;

/// Computes one output field from a raw record.
#[derive(Clone)]
pub struct TransformRule {
    output_field: String,
    compute: ComputeFn,
}

impl TransformRule {
    pub fn new<F>(output_field: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Record) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            output_field: output_field.into(),
            compute: Arc::new(compute),
        }
    }

    pub fn from_operation(output_field: impl Into<String>, operation: Operation) -> Self {
        let output_field = output_field.into();
        let output = output_field.clone();
        Self::new(output_field, move |record| operation.apply(&output, record))
    }

    pub fn output_field(&self) -> &str {
        &self.output_field
    }

    pub fn compute(&self, record: &Record) -> Result<Value> {
        (self.compute)(record)
    }
}

impl fmt::Debug for TransformRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRule")
            .field("output_field", &self.output_field)
            .finish_non_exhaustive()
    }
}

/// Built-in computations that can be declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Pass a field through unchanged (null included)
    Copy { field: String },

    /// Join the text of several fields
    Concat {
        fields: Vec<String>,
        #[serde(default)]
        separator: String,
    },

    /// Substitute `{field}` placeholders
    Template { template: String },

    /// Emit a fixed value
    Constant { value: Value },

    Uppercase { field: String },

    Lowercase { field: String },

    Trim { field: String },

    /// Parse the text of a field as an integer or float
    ToNumber { field: String },
}

impl Operation {
    pub fn apply(&self, output: &str, record: &Record) -> Result<Value> {
        match self {
            Operation::Copy { field } => require(output, record, field).cloned(),
            Operation::Concat { fields, separator } => {
                let parts = fields
                    .iter()
                    .map(|field| require_text(output, record, field))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::String(parts.join(separator)))
            }
            Operation::Template { template } => render_template(output, record, template),
            Operation::Constant { value } => Ok(value.clone()),
            Operation::Uppercase { field } => {
                Ok(Value::String(require_text(output, record, field)?.to_uppercase()))
            }
            Operation::Lowercase { field } => {
                Ok(Value::String(require_text(output, record, field)?.to_lowercase()))
            }
            Operation::Trim { field } => Ok(Value::String(
                require_text(output, record, field)?.trim().to_string(),
            )),
            Operation::ToNumber { field } => {
                let text = require_text(output, record, field)?;
                parse_number(&text).ok_or_else(|| EtlError::TransformError {
                    output: output.to_string(),
                    message: format!("field '{}' is not a number: {:?}", field, text),
                })
            }
        }
    }

    /// Raw fields this operation dereferences.
    pub fn referenced_fields(&self) -> Vec<String> {
        match self {
            Operation::Copy { field }
            | Operation::Uppercase { field }
            | Operation::Lowercase { field }
            | Operation::Trim { field }
            | Operation::ToNumber { field } => vec![field.clone()],
            Operation::Concat { fields, .. } => fields.clone(),
            Operation::Template { template } => PLACEHOLDER
                .captures_iter(template)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect(),
            Operation::Constant { .. } => Vec::new(),
        }
    }
}

/// A transform rule as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub output: String,
    #[serde(flatten)]
    pub operation: Operation,
}

impl From<&TransformSpec> for TransformRule {
    fn from(spec: &TransformSpec) -> Self {
        TransformRule::from_operation(spec.output.clone(), spec.operation.clone())
    }
}

fn require<'a>(output: &str, record: &'a Record, field: &str) -> Result<&'a Value> {
    record.get(field).ok_or_else(|| EtlError::TransformError {
        output: output.to_string(),
        message: format!("field '{}' is missing from the record", field),
    })
}

fn require_text(output: &str, record: &Record, field: &str) -> Result<String> {
    match require(output, record, field)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(EtlError::TransformError {
            output: output.to_string(),
            message: format!("field '{}' is null", field),
        }),
        Value::Array(_) | Value::Object(_) => Err(EtlError::TransformError {
            output: output.to_string(),
            message: format!("field '{}' is not a text value", field),
        }),
    }
}

fn render_template(output: &str, record: &Record, template: &str) -> Result<Value> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        rendered.push_str(&template[last..whole.start()]);
        rendered.push_str(&require_text(output, record, name.as_str())?);
        last = whole.end();
    }
    rendered.push_str(&template[last..]);

    Ok(Value::String(rendered))
}

fn parse_number(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Applies an ordered rule list to every record.
///
/// Each rule sees the original raw record, never another rule's output. The
/// output record holds exactly the rules' output fields, in rule order; raw
/// fields are dropped unless a rule copies them. The first failing rule aborts
/// the whole batch.
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    rules: Vec<TransformRule>,
}

impl TransformPipeline {
    pub fn new(rules: Vec<TransformRule>) -> Self {
        Self { rules }
    }

    pub fn from_specs(specs: &[TransformSpec]) -> Self {
        Self::new(specs.iter().map(TransformRule::from).collect())
    }

    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    pub fn transform(&self, records: &[Record]) -> Result<Vec<Record>> {
        records
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                self.transform_record(raw).inspect_err(|e| {
                    tracing::error!(record = index, "Transform failed: {}", e);
                })
            })
            .collect()
    }

    pub fn transform_record(&self, raw: &Record) -> Result<Record> {
        let mut output = Record::new();
        for rule in &self.rules {
            output.insert(rule.output_field(), rule.compute(raw)?);
        }
        Ok(output)
    }
}
