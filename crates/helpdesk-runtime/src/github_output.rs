use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

const DELIMITER_PREFIX: &str = "HELPDESK_OUTPUT_EOF";

/// Appends `name<<DELIM` multi-line outputs to a GitHub Actions output file.
pub fn append_github_outputs(path: &Path, outputs: &[(&str, &str)]) -> Result<()> {
    let mut rendered = String::new();
    for (name, value) in outputs {
        let delimiter = delimiter_for(value);
        rendered.push_str(&format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"));
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open github output file {}", path.display()))?;
    file.write_all(rendered.as_bytes())
        .with_context(|| format!("failed to write github output file {}", path.display()))
}

fn delimiter_for(value: &str) -> String {
    let mut suffix = 0_u32;
    loop {
        let candidate = format!("{DELIMITER_PREFIX}_{suffix}");
        if !value.contains(&candidate) {
            return candidate;
        }
        suffix = suffix.saturating_add(1);
    }
}
