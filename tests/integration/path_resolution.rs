use sqlfs::{FsError, FsNode};

use crate::integration::support::new_store;

#[test]
fn absolute_equals_stepwise_resolution() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let c = root
        .add_directory("a")
        .unwrap()
        .add_directory("b")
        .unwrap()
        .add_file("c")
        .unwrap();

    let direct = fs.node("/a/b/c").unwrap();
    let stepwise = root
        .resolve_directory("a")
        .unwrap()
        .resolve_directory("b")
        .unwrap()
        .resolve_file("c")
        .unwrap();
    assert_eq!(direct.id(), c.id());
    assert_eq!(stepwise.id(), c.id());
    assert_eq!(root.resolve("a/b/c").unwrap().id(), c.id());
}

#[test]
fn dot_segments() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    let a = root.add_directory("a").unwrap();
    a.add_directory("b").unwrap();

    assert_eq!(root.resolve("..").unwrap().id(), root.id());
    assert_eq!(root.resolve("../..").unwrap().id(), root.id());
    assert_eq!(a.resolve("b/..").unwrap().id(), a.id());
    assert_eq!(a.resolve("./b/../..").unwrap().id(), root.id());
}

#[test]
fn relative_resolvers_reject_absolute_paths() {
    let (_temp, fs) = new_store();
    let root = fs.root().unwrap();
    root.add_directory("a").unwrap();

    assert_eq!(
        root.resolve("/a").unwrap_err(),
        FsError::MustBeRelative("/a".into())
    );
    assert_eq!(
        root.resolve_directory("/a").unwrap_err(),
        FsError::MustBeRelative("/a".into())
    );
    assert_eq!(
        root.resolve_file("/a").unwrap_err(),
        FsError::MustNotStartOrEndWithSeparator("/a".into())
    );
    assert_eq!(root.resolve("").unwrap_err(), FsError::EmptyPath);
    assert_eq!(root.resolve_directory("a/").unwrap().name().unwrap(), "a");
}
