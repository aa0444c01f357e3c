use std::path::PathBuf;

use tempfile::TempDir;

/// Temporary directory holding a dataset file for ingestion tests.
pub struct TempDataset {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TempDataset {
    pub fn new(content: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dataset dir");
        let path = dir.path().join("interacciones_clientes.json");
        std::fs::write(&path, content).expect("write dataset file");
        Self { dir, path }
    }
}
