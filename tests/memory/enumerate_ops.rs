use uvfs::{FileSystem, FsError, MemoryFileSystem, SearchOption, SearchTarget, UPath};

use crate::common::{path, write_file};

async fn sample_tree() -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    fs.create_directory(&path("/a/sub")).await.expect("create");
    fs.create_directory(&path("/b")).await.expect("create");
    write_file(&fs, "/top.txt", b"1").await;
    write_file(&fs, "/top.log", b"2").await;
    write_file(&fs, "/a/one.txt", b"3").await;
    write_file(&fs, "/a/sub/two.txt", b"4").await;
    write_file(&fs, "/b/three.log", b"5").await;
    fs
}

async fn collect(
    fs: &MemoryFileSystem,
    anchor: &str,
    pattern: &str,
    option: SearchOption,
    target: SearchTarget,
) -> Vec<String> {
    let paths = fs
        .enumerate_paths(&path(anchor), pattern, option, target)
        .await
        .expect("enumeration starts")
        .collect()
        .await
        .expect("enumeration drains");
    let mut names: Vec<String> = paths.into_iter().map(|p| p.full_name().to_string()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn top_directory_only_stays_shallow() {
    let fs = sample_tree().await;
    let found = collect(&fs, "/", "*", SearchOption::TopDirectoryOnly, SearchTarget::Both).await;
    assert_eq!(vec!["/a", "/b", "/top.log", "/top.txt"], found);
}

#[tokio::test]
async fn recursive_enumeration_visits_every_level() {
    let fs = sample_tree().await;
    let found = collect(&fs, "/", "*", SearchOption::AllDirectories, SearchTarget::Both).await;
    assert_eq!(
        vec!["/a", "/a/one.txt", "/a/sub", "/a/sub/two.txt", "/b", "/b/three.log", "/top.log", "/top.txt"],
        found
    );
}

#[tokio::test]
async fn target_filters_kinds() {
    let fs = sample_tree().await;
    let dirs = collect(&fs, "/", "*", SearchOption::AllDirectories, SearchTarget::Directory).await;
    assert_eq!(vec!["/a", "/a/sub", "/b"], dirs);

    let files = collect(&fs, "/", "*", SearchOption::AllDirectories, SearchTarget::File).await;
    assert_eq!(
        vec!["/a/one.txt", "/a/sub/two.txt", "/b/three.log", "/top.log", "/top.txt"],
        files
    );
}

#[tokio::test]
async fn wildcard_patterns_filter_names() {
    let fs = sample_tree().await;
    let found = collect(&fs, "/", "*.txt", SearchOption::AllDirectories, SearchTarget::File).await;
    assert_eq!(vec!["/a/one.txt", "/a/sub/two.txt", "/top.txt"], found);

    let found = collect(&fs, "/", "t?p.*", SearchOption::TopDirectoryOnly, SearchTarget::File).await;
    assert_eq!(vec!["/top.log", "/top.txt"], found);
}

#[tokio::test]
async fn pattern_prefix_moves_the_anchor() {
    let fs = sample_tree().await;
    let found = collect(&fs, "/", "a/*.txt", SearchOption::TopDirectoryOnly, SearchTarget::File).await;
    assert_eq!(vec!["/a/one.txt"], found);
}

#[tokio::test]
async fn missing_anchor_is_the_only_hard_error() {
    let fs = sample_tree().await;
    let result = fs
        .enumerate_paths(&path("/nope"), "*", SearchOption::TopDirectoryOnly, SearchTarget::Both)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::DirectoryNotFound(path("/nope"))), result);

    let result = fs
        .enumerate_paths(&path("/top.txt"), "*", SearchOption::TopDirectoryOnly, SearchTarget::Both)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::NotADirectory(path("/top.txt"))), result);
}

#[tokio::test]
async fn directories_deleted_mid_iteration_are_skipped() {
    let fs = sample_tree().await;
    let mut paths = fs
        .enumerate_paths(&UPath::root(), "*", SearchOption::AllDirectories, SearchTarget::Both)
        .await
        .expect("enumeration starts");

    // Consume the first entry, then delete a directory the walk has queued
    // but not yet visited.
    let first = paths.next().await.expect("first entry");
    assert!(first.is_some());
    fs.delete_directory(&path("/b"), true).await.expect("concurrent delete");

    let mut rest = Vec::new();
    while let Some(found) = paths.next().await.expect("never a hard error") {
        rest.push(found.full_name().to_string());
    }
    // `/b/three.log` must not be yielded once its directory is gone.
    assert!(!rest.iter().any(|name| name.starts_with("/b/")), "stale entries: {rest:?}");
}

#[tokio::test]
async fn abandoning_an_enumeration_holds_no_locks() {
    let fs = sample_tree().await;
    let mut paths = fs
        .enumerate_paths(&UPath::root(), "*", SearchOption::AllDirectories, SearchTarget::Both)
        .await
        .expect("enumeration starts");
    let _ = paths.next().await.expect("one entry");
    drop(paths);

    // Every mutation still goes through.
    fs.delete_directory(&path("/a"), true).await.expect("delete after abandon");
    write_file(&fs, "/fresh", b"x").await;
}
