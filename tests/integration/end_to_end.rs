use sqlfs::{FsError, FsNode, SimplePayload};

use crate::integration::support::new_store;

#[test]
fn add_save_read_delete_scenario() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();

    root.add_directory("dir1").unwrap();
    assert_eq!(root.child_count().unwrap(), 1);
    assert_eq!(
        root.add_directory("dir1").unwrap_err(),
        FsError::NameAlreadyExists("dir1".into())
    );

    root.add_file("f")
        .unwrap()
        .save_payload(&SimplePayload::binary(vec![0x34, 0x12]))
        .unwrap();

    let f = root.resolve_file("f").unwrap();
    assert_eq!(
        f.read_payload::<SimplePayload>().unwrap(),
        SimplePayload::binary(vec![0x34, 0x12])
    );
    assert_eq!(f.size().unwrap(), 2);

    root.resolve_file("f").unwrap().delete().unwrap();
    assert!(root.files().unwrap().is_none());
    assert_eq!(root.child_count().unwrap(), 1);
}

#[test]
fn handles_read_through_to_the_store() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let a = root.add_directory("a").unwrap();
    let same = fs.directory("/a").unwrap();

    a.rename("b").unwrap();
    assert_eq!(same.name().unwrap(), "b");
    assert_eq!(same.record().unwrap().parent, root.id());
}
