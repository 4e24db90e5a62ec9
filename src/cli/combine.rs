use std::path::Path;

use tracing::info;

use crate::cli::report::write_json;
use crate::error::{Result, SpendsortError};
use crate::reports::{combine, Summary};

fn read_summary(path: &Path) -> Result<Summary> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SpendsortError::Config(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| SpendsortError::Config(format!("{}: {e}", path.display())))
}

pub fn run(files: &[impl AsRef<Path>], output: &Path) -> Result<Summary> {
    let summaries = files
        .iter()
        .map(|p| read_summary(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    info!("Combining {} summaries", summaries.len());

    let combined = combine(&summaries);
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    write_json(output, &combined)?;
    Ok(combined)
}
