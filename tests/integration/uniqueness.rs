use proptest::prelude::*;
use sqlfs::{FsError, FsNode};

use crate::integration::support::new_store;

#[test]
fn collision_leaves_tree_unchanged() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let dir = root.add_directory("shared").unwrap();
    let before = fs.node_count().unwrap();

    assert_eq!(
        root.add_file("shared").unwrap_err(),
        FsError::NameAlreadyExists("shared".into())
    );
    assert_eq!(fs.node_count().unwrap(), before);
    assert_eq!(root.child_count().unwrap(), 1);
    assert_eq!(root.child("shared").unwrap().id(), dir.id());
}

#[test]
fn rename_and_move_respect_sibling_names() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let a = root.add_directory("a").unwrap();
    a.add_file("x").unwrap();
    let x = root.add_file("x").unwrap();

    assert_eq!(x.move_to(&a).unwrap_err(), FsError::NameAlreadyExists("x".into()));
    assert_eq!(x.parent().unwrap().unwrap().id(), root.id());
    assert_eq!(a.child_count().unwrap(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn second_add_always_collides(name in "[a-z]{1,12}", dir_first in any::<bool>()) {
        let (_temp, fs) = new_store();
        let root = fs.root().unwrap();
        if dir_first {
            root.add_directory(&name).unwrap();
        } else {
            root.add_file(&name).unwrap();
        }
        prop_assert_eq!(
            root.add_directory(&name).unwrap_err(),
            FsError::NameAlreadyExists(name.clone())
        );
        prop_assert_eq!(
            root.add_file(&name).unwrap_err(),
            FsError::NameAlreadyExists(name.clone())
        );
        prop_assert_eq!(root.child_count().unwrap(), 1);
    }
}
