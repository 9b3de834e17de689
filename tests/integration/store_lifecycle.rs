use sqlfs::concurrency::reference_count;
use sqlfs::config::StoreConfig;
use sqlfs::db::{Column, Database};
use sqlfs::{FsError, FsNode, InfoField, SimplePayload, SqlFs};
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::support::store_path;

#[test]
fn reopening_keeps_tree_and_info() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    {
        let fs = SqlFs::create::<SimplePayload>(&path).unwrap();
        assert!(fs.fresh_tables_created());
        fs.root()
            .unwrap()
            .add_file("kept")
            .unwrap()
            .save_payload(&SimplePayload::text("v1"))
            .unwrap();
        fs.set_label("mine").unwrap();
        fs.close().unwrap();
    }

    let fs = SqlFs::create::<SimplePayload>(&path).unwrap();
    assert!(!fs.fresh_tables_created());
    assert_eq!(fs.label().unwrap(), "mine");
    assert_eq!(
        fs.file("/kept").unwrap().read_payload::<SimplePayload>().unwrap(),
        SimplePayload::text("v1")
    );
}

#[test]
fn incomplete_store_is_backed_up_and_recreated() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    {
        let db = Database::open(&path, Duration::from_secs(1)).unwrap();
        db.create_table("FsBlock", &[Column::new("fsID", "integer primary key")])
            .unwrap();
        db.close().unwrap();
    }

    let fs = SqlFs::create::<SimplePayload>(&path).unwrap();
    assert!(fs.fresh_tables_created());
    assert_eq!(fs.node_count().unwrap(), 1);

    let backups: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("store-") && name.ends_with(".db"))
        .collect();
    assert_eq!(backups.len(), 1, "{backups:?}");
}

#[test]
fn config_sets_label_only_on_creation() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let first = StoreConfig {
        label: "first".into(),
        ..StoreConfig::default()
    };
    let second = StoreConfig {
        label: "second".into(),
        ..StoreConfig::default()
    };
    SqlFs::create_with_config::<SimplePayload>(&path, &first)
        .unwrap()
        .close()
        .unwrap();
    let fs = SqlFs::create_with_config::<SimplePayload>(&path, &second).unwrap();
    assert_eq!(fs.info_field(InfoField::Label).unwrap().as_deref(), Some("first"));
}

#[test]
fn handles_share_one_lock_until_closed() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let a = SqlFs::create::<SimplePayload>(&path).unwrap();
    let b = SqlFs::create::<SimplePayload>(&path).unwrap();
    assert_eq!(reference_count(&path), 2);

    a.close().unwrap();
    assert_eq!(reference_count(&path), 1);
    assert_eq!(a.node_count().unwrap_err(), FsError::StoreClosed);
    b.root().unwrap().add_directory("still-works").unwrap();

    drop(b);
    assert_eq!(reference_count(&path), 0);
}

#[test]
fn unopenable_path_is_fatal() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing-dir").join("store.db");
    assert!(matches!(
        SqlFs::create::<SimplePayload>(&path),
        Err(FsError::CannotOpenStore(_))
    ));
    assert_eq!(reference_count(&path), 0);
}

#[test]
fn timestamps_are_ordered() {
    let temp = TempDir::new().unwrap();
    let fs = SqlFs::create::<SimplePayload>(store_path(&temp)).unwrap();
    let d = fs.root().unwrap().add_directory("d").unwrap();
    let record = d.record().unwrap();
    assert!(record.created <= record.modified);
    assert_eq!(d.create_time().unwrap(), record.created);
}
