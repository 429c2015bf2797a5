//! Flatten command.
//!
//! The inverse of `expand`: reads a YAML mapping and prints the flat
//! `a.b=value,...` string to store in Vault.

use std::path::Path;

use serde_yaml::Value;

use crate::cli::expand::read_input;
use crate::core::expand::{Node, ENTRY_SEPARATOR, PATH_SEPARATOR, VALUE_SEPARATOR};
use crate::error::{FlattenError, Result};

/// Flatten a YAML document and print the flat string.
pub fn execute(file: Option<&Path>) -> Result<()> {
    let contents = read_input(file)?;
    let tree = tree_from_yaml(&contents)?;
    println!("{}", tree.to_flat_string());
    Ok(())
}

/// Parse a YAML mapping into a tree that flattens losslessly.
pub fn tree_from_yaml(contents: &str) -> std::result::Result<Node, FlattenError> {
    let value: Value = serde_yaml::from_str(contents)?;
    match value {
        Value::Null => Ok(Node::empty()),
        Value::Mapping(_) => convert(&value, ""),
        _ => Err(FlattenError::NotAMapping),
    }
}

fn convert(value: &Value, path: &str) -> std::result::Result<Node, FlattenError> {
    let unsupported = || FlattenError::UnsupportedValue {
        path: path.to_string(),
    };

    let leaf = match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Mapping(mapping) => {
            if mapping.is_empty() && !path.is_empty() {
                return Err(unsupported());
            }

            let mut children = Vec::with_capacity(mapping.len());
            for (key, child) in mapping {
                let key = scalar_key(key).ok_or_else(unsupported)?;
                check_key(&key)?;
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}{}{}", path, PATH_SEPARATOR, key)
                };
                children.push((key, convert(child, &child_path)?));
            }
            return Ok(Node::Internal(children));
        }
        Value::Sequence(_) | Value::Tagged(_) => return Err(unsupported()),
    };

    if leaf.contains(ENTRY_SEPARATOR) {
        return Err(FlattenError::ReservedInValue {
            path: path.to_string(),
        });
    }
    Ok(Node::Leaf(leaf))
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn check_key(key: &str) -> std::result::Result<(), FlattenError> {
    if key.is_empty() {
        return Err(FlattenError::UnsupportedValue {
            path: key.to_string(),
        });
    }
    for sep in [PATH_SEPARATOR, ENTRY_SEPARATOR, VALUE_SEPARATOR] {
        if key.contains(sep) {
            return Err(FlattenError::ReservedInKey {
                key: key.to_string(),
                ch: sep.chars().next().unwrap_or_default(),
            });
        }
    }
    Ok(())
}
