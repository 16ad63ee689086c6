//! Port traits abstracting file I/O away from the pipelines.

use camino::Utf8Path;
use recordfix_types::issue::ValidationIssue;

/// Source of validator issues.
pub trait IssueSource {
    fn load_issues(&self) -> anyhow::Result<Vec<ValidationIssue>>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
