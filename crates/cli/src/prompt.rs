//! Interactive fallback for missing config and target paths.

use std::path::{Path, PathBuf};

use crate::CliError;

/// Asks the user for a path. An empty answer means "keep the default".
pub trait PathPrompt {
    fn ask(&self, message: &str, default: &str) -> Result<String, String>;
}

/// Terminal prompt on stderr.
pub struct TerminalPrompt;

impl PathPrompt for TerminalPrompt {
    fn ask(&self, message: &str, default: &str) -> Result<String, String> {
        dialoguer::Input::<String>::new()
            .with_prompt(message)
            .default(default.to_string())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| e.to_string())
    }
}

/// Return `path` if it exists, otherwise ask until an existing path is given.
///
/// Without a prompt a missing path is a usage error.
pub fn existing_path(
    path: PathBuf,
    what: &str,
    prompt: Option<&dyn PathPrompt>,
) -> Result<PathBuf, CliError> {
    let mut current = path;
    loop {
        if current.exists() {
            return Ok(current);
        }
        let Some(prompt) = prompt else {
            return Err(CliError::usage(format!("{what} not found: {}", current.display()))
                .with_hint("pass an existing path, or run in a terminal to be prompted"));
        };

        eprintln!("{what} not found: {}", current.display());
        let default = current.display().to_string();
        let answer = prompt
            .ask(&format!("Path to {what}"), &default)
            .map_err(|e| CliError::usage(format!("no {what} given: {e}")))?;
        let answer = answer.trim();
        if !answer.is_empty() {
            current = Path::new(answer).to_path_buf();
        }
    }
}
