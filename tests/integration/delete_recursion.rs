use sqlfs::{FsError, FsNode, SimplePayload};

use crate::integration::support::new_store;

#[test]
fn deleting_a_directory_removes_every_descendant() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let top = root.add_directory("top").unwrap();
    let keep = root.add_file("keep").unwrap();
    keep.save_payload(&SimplePayload::text("stay")).unwrap();

    let mut paths = Vec::new();
    for i in 0..3 {
        let sub = top.add_directory(&format!("sub{i}")).unwrap();
        paths.push(format!("/top/sub{i}"));
        for j in 0..2 {
            let f = sub.add_file(&format!("f{j}")).unwrap();
            f.save_payload(&SimplePayload::binary(vec![i as u8, j as u8])).unwrap();
            paths.push(format!("/top/sub{i}/f{j}"));
        }
        sub.add_directory("empty").unwrap();
        paths.push(format!("/top/sub{i}/empty"));
    }
    // root + keep + top + 3 * (sub + 2 files + empty)
    assert_eq!(fs.node_count().unwrap(), 3 + 12);
    assert_eq!(fs.payload_count().unwrap(), 1 + 6);

    top.delete().unwrap();

    assert_eq!(fs.node_count().unwrap(), 2);
    assert_eq!(fs.payload_count().unwrap(), 1);
    for p in &paths {
        assert!(!fs.exists(p).unwrap(), "{p} still exists");
    }
    assert_eq!(
        fs.node("/top").unwrap_err(),
        FsError::ChildNotFound("top".into())
    );
    assert_eq!(root.child_count().unwrap(), 1);
    assert_eq!(
        keep.read_payload::<SimplePayload>().unwrap(),
        SimplePayload::text("stay")
    );
}

#[test]
fn stale_handle_delete_fails_cleanly() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let d = root.add_directory("d").unwrap();
    let again = fs.directory("/d").unwrap();

    d.delete().unwrap();
    assert!(again.delete().is_err());
    assert_eq!(fs.node_count().unwrap(), 1);
}
