//! Model card schema check.
//!
//! The header between the leading `---` fences is parsed back and checked
//! against the fixed schema the hub expects for reinforcement-learning
//! models. The header is written as JSON, which is also valid YAML.

use serde_json::{Map, Value};

use super::data::CardData;
use super::CardError;

const FENCE: &str = "---";

/// Split the header text out of a rendered card.
pub fn front_matter(card: &str) -> Result<&str, CardError> {
    let rest = card
        .strip_prefix(FENCE)
        .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
        .ok_or(CardError::MissingFrontMatter)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Ok(&rest[..offset]);
        }
        offset += line.len();
    }
    Err(CardError::MissingFrontMatter)
}

/// Validate a rendered card and return its header.
pub fn validate_model_card(card: &str) -> Result<CardData, CardError> {
    let header = front_matter(card)?;
    let value: Value = serde_json::from_str(header).map_err(CardError::MalformedFrontMatter)?;
    check_schema(&value)?;
    serde_json::from_value(value).map_err(CardError::MalformedFrontMatter)
}

fn check_schema(value: &Value) -> Result<(), CardError> {
    let root = object(value, "card")?;
    non_empty_str(root, "license", "")?;
    non_empty_str(root, "language", "")?;
    non_empty_str(root, "library_name", "")?;

    let tags = non_empty_array(root, "tags", "")?;
    for (i, tag) in tags.iter().enumerate() {
        if !tag.is_string() {
            return Err(wrong_type(&format!("tags[{}]", i), "a string"));
        }
    }

    let index = non_empty_array(root, "model-index", "")?;
    for (i, entry) in index.iter().enumerate() {
        let path = format!("model-index[{}]", i);
        let entry = object(entry, &path)?;
        non_empty_str(entry, "name", &path)?;

        let results = non_empty_array(entry, "results", &path)?;
        for (j, result) in results.iter().enumerate() {
            let path = format!("{}.results[{}]", path, j);
            let result = object(result, &path)?;

            let task = object(field(result, "task", &path)?, &format!("{}.task", path))?;
            non_empty_str(task, "type", &format!("{}.task", path))?;

            let dataset_path = format!("{}.dataset", path);
            let dataset = object(field(result, "dataset", &path)?, &dataset_path)?;
            non_empty_str(dataset, "name", &dataset_path)?;
            non_empty_str(dataset, "type", &dataset_path)?;

            let metrics = non_empty_array(result, "metrics", &path)?;
            for (k, metric) in metrics.iter().enumerate() {
                let path = format!("{}.metrics[{}]", path, k);
                let metric = object(metric, &path)?;
                non_empty_str(metric, "name", &path)?;
                non_empty_str(metric, "type", &path)?;
                non_empty_str(metric, "value", &path)?;
            }
        }
    }
    Ok(())
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn wrong_type(field: &str, expected: &'static str) -> CardError {
    CardError::WrongType {
        field: field.to_string(),
        expected,
    }
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, CardError> {
    value.as_object().ok_or_else(|| wrong_type(path, "a mapping"))
}

fn field<'a>(obj: &'a Map<String, Value>, name: &str, parent: &str) -> Result<&'a Value, CardError> {
    obj.get(name)
        .ok_or_else(|| CardError::MissingField(join(parent, name)))
}

fn non_empty_str<'a>(
    obj: &'a Map<String, Value>,
    name: &str,
    parent: &str,
) -> Result<&'a str, CardError> {
    let path = join(parent, name);
    let s = field(obj, name, parent)?
        .as_str()
        .ok_or_else(|| wrong_type(&path, "a string"))?;
    if s.trim().is_empty() {
        return Err(CardError::EmptyField(path));
    }
    Ok(s)
}

fn non_empty_array<'a>(
    obj: &'a Map<String, Value>,
    name: &str,
    parent: &str,
) -> Result<&'a Vec<Value>, CardError> {
    let path = join(parent, name);
    let items = field(obj, name, parent)?
        .as_array()
        .ok_or_else(|| wrong_type(&path, "a list"))?;
    if items.is_empty() {
        return Err(CardError::EmptyField(path));
    }
    Ok(items)
}
