use sqlfs::{SimplePayload, SqlFs};
use std::path::PathBuf;
use tempfile::TempDir;

pub fn new_store() -> (TempDir, SqlFs) {
    let temp = TempDir::new().unwrap();
    let fs = SqlFs::create::<SimplePayload>(temp.path().join("store.db")).unwrap();
    (temp, fs)
}

pub fn store_path(temp: &TempDir) -> PathBuf {
    temp.path().join("store.db")
}
