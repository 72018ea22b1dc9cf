#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::client::CliError;

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::InputFile {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_json(path: &Path) -> Result<Value, CliError> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CliError::InvalidInput(format!("{} is not valid JSON: {e}", path.display())))
}

/// Secret from a file (first line), the environment, or one line of stdin.
pub fn read_secret(file: Option<PathBuf>, env: Option<String>) -> Result<String, CliError> {
    let secret = if let Some(path) = file {
        let data = fs::read_to_string(&path).map_err(|source| CliError::InputFile {
            path: path.display().to_string(),
            source,
        })?;
        data.lines().next().unwrap_or_default().to_string()
    } else if let Some(value) = env {
        value
    } else {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CliError::InvalidInput(format!("failed to read secret: {e}")))?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };

    if secret.is_empty() {
        return Err(CliError::InvalidInput("secret required".into()));
    }
    Ok(secret)
}

/// Asks on stderr and reads a yes/no answer; anything but yes declines.
pub fn confirm_prompt(message: &str) -> bool {
    eprint!("{message} [y/N] ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn write_output(path: Option<&Path>, contents: &str) -> Result<(), CliError> {
    match path {
        Some(path) => fs::write(path, contents).map_err(|source| CliError::OutputFile {
            path: path.display().to_string(),
            source,
        }),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

/// JSON when it parses, otherwise the raw text as a string.
pub fn parse_loose_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Splits `ID=VALUE`.
pub fn parse_filter(raw: &str) -> Result<(&str, &str), CliError> {
    raw.split_once('=')
        .map(|(id, value)| (id.trim(), value.trim()))
        .filter(|(id, value)| !id.is_empty() && !value.is_empty())
        .ok_or_else(|| CliError::InvalidInput(format!("filter `{raw}` must look like ID=VALUE")))
}
