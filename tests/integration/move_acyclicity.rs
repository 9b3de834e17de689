use sqlfs::{FsError, FsId, FsNode, SqlFs};

use crate::integration::support::new_store;

fn parents(fs: &SqlFs, paths: &[&str]) -> Vec<FsId> {
    paths
        .iter()
        .map(|p| fs.node(p).unwrap().record().unwrap().parent)
        .collect()
}

#[test]
fn directory_cannot_move_below_itself() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let a = root.add_directory("a").unwrap();
    let b = a.add_directory("b").unwrap();
    let c = b.add_directory("c").unwrap();
    let paths = ["/a", "/a/b", "/a/b/c"];
    let before = parents(&fs, &paths);

    assert_eq!(a.move_to(&a).unwrap_err(), FsError::CannotMoveToSelf);
    assert_eq!(a.move_to(&b).unwrap_err(), FsError::CannotMoveToSubdir);
    assert_eq!(a.move_to(&c).unwrap_err(), FsError::CannotMoveToSubdir);
    assert_eq!(a.move_to_path("/a/b/c").unwrap_err(), FsError::CannotMoveToSubdir);
    assert_eq!(root.move_to(&c).unwrap_err(), FsError::CannotMoveRoot);

    assert_eq!(parents(&fs, &paths), before);
    assert_eq!(root.child_count().unwrap(), 1);
}

#[test]
fn moving_up_and_sideways_is_allowed() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let a = root.add_directory("a").unwrap();
    let b = a.add_directory("b").unwrap();
    let c = b.add_directory("c").unwrap();

    c.move_to(&root).unwrap();
    assert!(fs.exists("/c").unwrap());
    assert!(!fs.exists("/a/b/c").unwrap());
    assert_eq!(b.child_count().unwrap(), 0);
    assert_eq!(root.child_count().unwrap(), 2);

    // a file may move anywhere, including below its old siblings
    let f = root.add_file("f").unwrap();
    f.move_to(&b).unwrap();
    assert_eq!(fs.file("/a/b/f").unwrap().id(), f.id());
    assert!(a.is_ancestor_of(&b).unwrap());
    assert!(!c.is_ancestor_of(&b).unwrap());
}
