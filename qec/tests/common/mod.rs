//! Common test utilities for integration tests.
//!
//! Fixtures lay out compose projects as sibling directories under a
//! temporary root, the way they sit on disk in practice.

use std::fs;
use std::path::{Path, PathBuf};

use qec::{Document, DocumentLoader, Environment};
use tempfile::TempDir;

/// A temporary directory holding one subdirectory per compose project.
pub struct Stack {
    root: TempDir,
}

#[allow(dead_code)]
impl Stack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// The stack's root directory.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Writes `<root>/<dir>/docker-compose.yml` and returns its path.
    pub fn project(&self, dir: &str, yaml: &str) -> PathBuf {
        self.file(dir, "docker-compose.yml", yaml)
    }

    /// Writes `<root>/<dir>/<name>` and returns its path.
    pub fn file(&self, dir: &str, name: &str, contents: &str) -> PathBuf {
        let dir = self.root.path().join(dir);
        fs::create_dir_all(&dir).expect("create project dir");
        let path = dir.join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }
}

/// A loader that sees only `vars` and still reads `.env` files.
#[allow(dead_code)]
pub fn loader(vars: &[(&str, &str)]) -> DocumentLoader {
    let env: Environment = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    DocumentLoader::new().with_environment(env)
}

/// Loads every path with an empty environment.
#[allow(dead_code)]
pub fn load_all(paths: &[PathBuf]) -> Vec<Document> {
    let loader = loader(&[]);
    paths
        .iter()
        .map(|p| loader.load(p).expect("load fixture"))
        .collect()
}
