pub mod output;

pub use output::{create_writer, JsonWriter, MarkdownWriter, OutputFormat, OutputWriter, TerminalWriter};

use anyhow::Result;
use std::fs;
use std::path::Path;

pub fn read_file(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}
