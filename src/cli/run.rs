//! Execute a program, optionally against a JSON fixture

use std::{collections::BTreeMap, path::PathBuf, rc::Rc};

use serde_json::json;

use super::CliError;
use crate::{
    MemoryStore, RunOptions, interpret,
    output::{json_to_value, value_to_json},
    value::Value,
};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Program text
    pub source: String,
    /// Values for INPUT statements, in order. Each is read as a JSON
    /// literal when it parses as one, otherwise as a string.
    pub inputs: Vec<String>,
    /// Fixture file for the in-memory record store
    pub data: Option<PathBuf>,
    /// Print each output line as soon as it is produced
    pub echo: bool,
}

/// Result of a run
#[derive(Debug)]
pub struct RunReport {
    pub output: Vec<String>,
    pub variables: BTreeMap<String, Value>,
}

impl RunReport {
    pub fn to_json(&self) -> serde_json::Value {
        let variables: serde_json::Map<String, serde_json::Value> = self
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect();
        json!({ "output": self.output, "variables": variables })
    }
}

fn input_value(raw: &str) -> Value {
    serde_json::from_str(raw)
        .map(json_to_value)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn execute_run(request: &RunRequest) -> Result<RunReport, CliError> {
    let mut options = RunOptions::new().inputs(request.inputs.iter().map(|s| input_value(s)));
    if let Some(path) = &request.data {
        options = options.store(Rc::new(MemoryStore::from_path(path)?));
    }
    if request.echo {
        options = options.on_output(|line| println!("{}", line));
    }

    let outcome = interpret(&request.source, options)?;
    Ok(RunReport {
        variables: outcome.variables(),
        output: outcome.output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_values() {
        assert_eq!(input_value("5"), Value::Integer(5));
        assert_eq!(input_value("\"five\""), Value::from("five"));
        assert_eq!(input_value("five"), Value::from("five"));
    }
}
