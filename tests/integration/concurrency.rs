use sqlfs::{SimplePayload, SqlFs};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

use crate::integration::support::store_path;

#[test]
fn concurrent_adds_through_separate_handles_are_not_lost() {
    const THREADS: usize = 8;
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    SqlFs::create::<SimplePayload>(&path).unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let workers: Vec<_> = (0..THREADS)
        .map(|i| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let fs = SqlFs::create::<SimplePayload>(&path).unwrap();
                let root = fs.root().unwrap();
                barrier.wait();
                root.add_directory(&format!("worker-{i}")).unwrap();
                fs.close().unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let fs = SqlFs::create::<SimplePayload>(&path).unwrap();
    let root = fs.root().unwrap();
    assert_eq!(root.child_count().unwrap(), THREADS);
    let names: BTreeSet<String> = root
        .children()
        .unwrap()
        .unwrap()
        .iter()
        .map(|n| sqlfs::FsNode::name(n).unwrap())
        .collect();
    let expected: BTreeSet<String> = (0..THREADS).map(|i| format!("worker-{i}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn racing_on_the_same_name_admits_exactly_one() {
    const THREADS: usize = 6;
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    SqlFs::create::<SimplePayload>(&path).unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let fs = SqlFs::create::<SimplePayload>(&path).unwrap();
                let root = fs.root().unwrap();
                barrier.wait();
                root.add_file("contended").is_ok()
            })
        })
        .collect();
    let winners = workers
        .into_iter()
        .map(|w| w.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(winners, 1);
    let fs = SqlFs::create::<SimplePayload>(&path).unwrap();
    assert_eq!(fs.root().unwrap().child_count().unwrap(), 1);
}
