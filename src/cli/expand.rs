//! Expand command.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::cli::Format;
use crate::core::expand::{self, ConflictPolicy};
use crate::core::manifest;
use crate::error::Result;

/// Read input from a file, or stdin when no file is given.
///
/// One trailing line break is dropped so `echo a=1 | vaultmaps expand`
/// does not end the last value with a newline.
pub(crate) fn read_input(file: Option<&Path>) -> Result<String> {
    let mut contents = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    if contents.ends_with('\n') {
        contents.pop();
        if contents.ends_with('\r') {
            contents.pop();
        }
    }
    Ok(contents)
}

/// Expand a flat string and print it.
pub fn execute(
    input: Option<String>,
    file: Option<&Path>,
    format: Format,
    policy: ConflictPolicy,
) -> Result<()> {
    let flat = match input {
        Some(input) => input,
        None => read_input(file)?,
    };

    let tree = expand::expand_with(&flat, policy)?;
    debug!(leaves = tree.leaf_count(), "expanded input");

    match format {
        Format::Yaml => print!("{}", manifest::render_tree(&tree)?),
        Format::Json => println!("{}", serde_json::to_string_pretty(&tree)?),
    }

    Ok(())
}
