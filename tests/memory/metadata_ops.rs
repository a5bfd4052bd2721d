use std::time::{Duration, SystemTime};

use uvfs::{file_time_zero, FileAttributes, FileSystem, FsError, MemoryFileSystem};

use crate::common::{path, write_file};

#[tokio::test]
async fn directory_and_normal_bits_are_synthesised() {
    let fs = MemoryFileSystem::new();
    fs.create_directory(&path("/d")).await.expect("create");
    write_file(&fs, "/f", b"x").await;

    let dir_attributes = fs.get_attributes(&path("/d")).await.expect("dir attributes");
    assert!(dir_attributes.contains(FileAttributes::DIRECTORY));

    // A fresh file carries the archive bit, so NORMAL is not synthesised.
    let file_attributes = fs.get_attributes(&path("/f")).await.expect("file attributes");
    assert!(file_attributes.contains(FileAttributes::ARCHIVE));
    assert!(!file_attributes.contains(FileAttributes::NORMAL));

    // Clearing every stored bit exposes NORMAL on read.
    fs.set_attributes(&path("/f"), FileAttributes::empty()).await.expect("clear");
    let file_attributes = fs.get_attributes(&path("/f")).await.expect("file attributes");
    assert!(file_attributes.contains(FileAttributes::NORMAL));
}

#[tokio::test]
async fn synthesised_bits_are_never_stored() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/f", b"x").await;
    fs.set_attributes(
        &path("/f"),
        FileAttributes::READ_ONLY.union(FileAttributes::DIRECTORY).union(FileAttributes::NORMAL),
    )
    .await
    .expect("set");

    let attributes = fs.get_attributes(&path("/f")).await.expect("attributes");
    assert!(attributes.contains(FileAttributes::READ_ONLY));
    assert!(!attributes.contains(FileAttributes::DIRECTORY));
    assert!(!attributes.contains(FileAttributes::NORMAL));
}

#[tokio::test]
async fn attributes_of_the_root() {
    let fs = MemoryFileSystem::new();
    let attributes = fs.get_attributes(&path("/")).await.expect("root attributes");
    assert!(attributes.contains(FileAttributes::DIRECTORY));
}

#[tokio::test]
async fn attributes_of_a_missing_path_fail() {
    let fs = MemoryFileSystem::new();
    assert_eq!(
        Err(FsError::FileNotFound(path("/missing"))),
        fs.get_attributes(&path("/missing")).await
    );
    assert_eq!(
        Err(FsError::FileNotFound(path("/missing"))),
        fs.set_attributes(&path("/missing"), FileAttributes::empty()).await
    );
}

#[tokio::test]
async fn times_of_a_missing_path_are_file_time_zero() {
    let fs = MemoryFileSystem::new();
    assert_eq!(file_time_zero(), fs.get_creation_time(&path("/missing")).await.expect("ctime"));
    assert_eq!(file_time_zero(), fs.get_last_access_time(&path("/missing")).await.expect("atime"));
    assert_eq!(file_time_zero(), fs.get_last_write_time(&path("/missing")).await.expect("mtime"));
    // Even when an intermediate directory is missing.
    assert_eq!(
        file_time_zero(),
        fs.get_creation_time(&path("/no/such/dir")).await.expect("deep ctime")
    );
}

#[tokio::test]
async fn set_time_on_a_missing_path_fails() {
    let fs = MemoryFileSystem::new();
    assert_eq!(
        Err(FsError::FileNotFound(path("/missing"))),
        fs.set_creation_time(&path("/missing"), SystemTime::now()).await
    );
}

#[tokio::test]
async fn times_round_trip() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/f", b"x").await;
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);

    fs.set_creation_time(&path("/f"), stamp).await.expect("set ctime");
    fs.set_last_access_time(&path("/f"), stamp + Duration::from_secs(1)).await.expect("set atime");
    fs.set_last_write_time(&path("/f"), stamp + Duration::from_secs(2)).await.expect("set mtime");

    assert_eq!(stamp, fs.get_creation_time(&path("/f")).await.expect("ctime"));
    assert_eq!(
        stamp + Duration::from_secs(1),
        fs.get_last_access_time(&path("/f")).await.expect("atime")
    );
    assert_eq!(
        stamp + Duration::from_secs(2),
        fs.get_last_write_time(&path("/f")).await.expect("mtime")
    );
}

#[tokio::test]
async fn writes_move_the_write_time_forward() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/f", b"one").await;
    let before = fs.get_last_write_time(&path("/f")).await.expect("mtime before");

    tokio::time::sleep(Duration::from_millis(20)).await;
    write_file(&fs, "/f", b"two").await;
    let after = fs.get_last_write_time(&path("/f")).await.expect("mtime after");
    assert!(after > before, "write time did not advance: {before:?} vs {after:?}");
}

#[tokio::test]
async fn file_time_zero_predates_the_unix_epoch() {
    assert!(file_time_zero() < SystemTime::UNIX_EPOCH);
}
