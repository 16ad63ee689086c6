//! Default filesystem-backed port implementations.

use crate::ports::{IssueSource, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use recordfix_store::InMemoryStore;
use recordfix_types::issue::ValidationIssue;
use recordfix_types::result::RemediationSummary;
use serde::Deserialize;
use tracing::debug;

/// An issue file is either a bare array or `{ "issues": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IssueFile {
    Bare(Vec<ValidationIssue>),
    Wrapped { issues: Vec<ValidationIssue> },
}

/// Loads validator issues from a JSON file.
#[derive(Debug, Clone)]
pub struct FsIssueSource {
    pub path: Utf8PathBuf,
}

impl FsIssueSource {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl IssueSource for FsIssueSource {
    fn load_issues(&self) -> anyhow::Result<Vec<ValidationIssue>> {
        let text = fs_err::read_to_string(&self.path)?;
        let file: IssueFile =
            serde_json::from_str(&text).with_context(|| format!("parse issues from {}", self.path))?;
        let issues = match file {
            IssueFile::Bare(issues) | IssueFile::Wrapped { issues } => issues,
        };
        debug!(path = self.path.as_str(), count = issues.len(), "loaded issues");
        Ok(issues)
    }
}

/// In-memory issue source for embedding and testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIssueSource {
    issues: Vec<ValidationIssue>,
}

impl InMemoryIssueSource {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

impl IssueSource for InMemoryIssueSource {
    fn load_issues(&self) -> anyhow::Result<Vec<ValidationIssue>> {
        Ok(self.issues.clone())
    }
}

/// A JSON dataset file (`{ "table": [record, ...] }`) backing an
/// [`InMemoryStore`].
#[derive(Debug, Clone)]
pub struct FsDataset {
    pub path: Utf8PathBuf,
}

impl FsDataset {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> anyhow::Result<InMemoryStore> {
        let text = fs_err::read_to_string(&self.path)?;
        let value: serde_json::Value =
            serde_json::from_str(&text).with_context(|| format!("parse dataset {}", self.path))?;
        InMemoryStore::from_json(value).with_context(|| format!("load dataset {}", self.path))
    }

    /// Write the store's current contents back to the dataset file.
    pub fn save(&self, store: &InMemoryStore, writer: &dyn WritePort) -> anyhow::Result<()> {
        let value = store.to_json().context("export dataset")?;
        let mut text = serde_json::to_string_pretty(&value).context("serialize dataset")?;
        text.push('\n');
        writer.write_file(&self.path, text.as_bytes())
    }
}

/// Read a previously written `apply.json`.
pub fn load_summary(path: &Utf8Path) -> anyhow::Result<RemediationSummary> {
    let text = fs_err::read_to_string(path)?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path))
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            fs_err::create_dir_all(parent)?;
        }
        fs_err::write(path, contents)?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs_err::create_dir_all(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[test]
    fn issue_file_accepts_bare_and_wrapped_forms() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        let issue = r#"{"entity":"judge","entityId":"j1","type":"stale_data","severity":"low"}"#;

        fs_err::write(root.join("bare.json"), format!("[{}]", issue)).unwrap();
        fs_err::write(root.join("wrapped.json"), format!(r#"{{"issues":[{}]}}"#, issue)).unwrap();

        for name in ["bare.json", "wrapped.json"] {
            let issues = FsIssueSource::new(root.join(name)).load_issues().unwrap();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].entity_id, "j1");
        }
    }

    #[test]
    fn missing_issue_file_names_the_path() {
        let tmp = TempDir::new().unwrap();
        let path = utf8(&tmp).join("nope.json");
        let err = FsIssueSource::new(path).load_issues().unwrap_err();
        assert!(format!("{:#}", err).contains("nope.json"));
    }

    #[test]
    fn dataset_round_trips_through_the_write_port() {
        let tmp = TempDir::new().unwrap();
        let path = utf8(&tmp).join("data").join("dataset.json");
        FsWritePort
            .write_file(&path, br#"{"judges":[{"id":"j1","name":"Ann Lee"}]}"#)
            .unwrap();

        let dataset = FsDataset::new(path.clone());
        let store = dataset.load().unwrap();
        assert_eq!(store.rows("judges").len(), 1);

        dataset.save(&store, &FsWritePort).unwrap();
        let reloaded = dataset.load().unwrap();
        assert!(reloaded.get("judges", "j1").is_some());
    }
}
