mod report;
mod summary;

pub use report::write_classifications;
pub use summary::write_report;

use chrono::Local;
use std::path::{Path, PathBuf};

/// Dated report directory under `output_dir`, e.g. `reports/2024-05-01`.
pub fn report_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(Local::now().format("%Y-%m-%d").to_string())
}
