use std::io::SeekFrom;

use uvfs::{
    FileAccess, FileAttributes, FileShare, FileSystem, FsError, MemoryFileSystem, OpenMode,
};

use crate::common::{file_exists, path, read_file, write_file};

#[tokio::test]
async fn create_new_fails_on_an_existing_file() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/f", b"x").await;
    let result = fs
        .open_file(&path("/f"), OpenMode::CreateNew, FileAccess::WRITE, FileShare::NONE)
        .await
        .map(|_| ());
    assert!(matches!(result, Err(FsError::AlreadyExists(_))), "got {result:?}");
}

#[tokio::test]
async fn open_fails_on_a_missing_file() {
    let fs = MemoryFileSystem::new();
    let result = fs
        .open_file(&path("/missing"), OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::FileNotFound(path("/missing"))), result);

    let result = fs
        .open_file(&path("/missing"), OpenMode::Truncate, FileAccess::WRITE, FileShare::NONE)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::FileNotFound(path("/missing"))), result);
}

#[tokio::test]
async fn create_truncates_an_existing_file() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/f", b"previous content").await;
    let mut stream = fs
        .open_file(&path("/f"), OpenMode::Create, FileAccess::WRITE, FileShare::NONE)
        .await
        .expect("open");
    assert_eq!(0, stream.length().await.expect("truncated"));
    stream.write_all(b"new").await.expect("write");
    stream.close().await.expect("close");
    assert_eq!(b"new".to_vec(), read_file(&fs, "/f").await);
}

#[tokio::test]
async fn open_or_create_creates_when_absent() {
    let fs = MemoryFileSystem::new();
    let mut stream = fs
        .open_file(&path("/f"), OpenMode::OpenOrCreate, FileAccess::READ_WRITE, FileShare::NONE)
        .await
        .expect("first open creates");
    stream.write_all(b"seed").await.expect("write");
    stream.close().await.expect("close");

    let mut stream = fs
        .open_file(&path("/f"), OpenMode::OpenOrCreate, FileAccess::READ, FileShare::READ)
        .await
        .expect("second open reuses");
    let mut data = Vec::new();
    stream.read_to_end(&mut data).await.expect("read");
    stream.close().await.expect("close");
    assert_eq!(b"seed".to_vec(), data);
}

#[tokio::test]
async fn append_positions_at_the_end() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/log", b"one").await;
    let mut stream = fs
        .open_file(&path("/log"), OpenMode::Append, FileAccess::WRITE, FileShare::NONE)
        .await
        .expect("open append");
    assert_eq!(3, stream.position());
    stream.write_all(b"+two").await.expect("append");
    stream.close().await.expect("close");
    assert_eq!(b"one+two".to_vec(), read_file(&fs, "/log").await);
}

#[tokio::test]
async fn append_with_read_access_is_rejected_before_any_lock() {
    let fs = MemoryFileSystem::new();
    let result = fs
        .open_file(&path("/f"), OpenMode::Append, FileAccess::READ_WRITE, FileShare::NONE)
        .await
        .map(|_| ());
    assert!(matches!(result, Err(FsError::InvalidArgument(_))), "got {result:?}");
    // The path was never touched.
    assert!(!file_exists(&fs, "/f").await);
}

#[tokio::test]
async fn create_then_open_then_delete_then_open() {
    let fs = MemoryFileSystem::new();
    fs.open_file(&path("/f"), OpenMode::Create, FileAccess::WRITE, FileShare::NONE)
        .await
        .expect("create")
        .close()
        .await
        .expect("close");
    fs.open_file(&path("/f"), OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .expect("open after create")
        .close()
        .await
        .expect("close");
    fs.delete_file(&path("/f")).await.expect("delete");
    let result = fs
        .open_file(&path("/f"), OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::FileNotFound(path("/f"))), result);
}

#[tokio::test]
async fn writing_a_read_only_file_is_denied() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/locked", b"x").await;
    fs.set_attributes(&path("/locked"), FileAttributes::READ_ONLY).await.expect("set read-only");

    let result = fs
        .open_file(&path("/locked"), OpenMode::Open, FileAccess::WRITE, FileShare::NONE)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::Unauthorized(path("/locked"))), result);

    // Reading it stays fine.
    fs.open_file(&path("/locked"), OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .expect("read-only open")
        .close()
        .await
        .expect("close");
}

#[tokio::test]
async fn opening_a_directory_is_a_type_error() {
    let fs = MemoryFileSystem::new();
    fs.create_directory(&path("/d")).await.expect("create");
    let result = fs
        .open_file(&path("/d"), OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::IsADirectory(path("/d"))), result);
}

#[tokio::test]
async fn share_admission_follows_the_subset_rule() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/f", b"x").await;

    let first = fs
        .open_file(&path("/f"), OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .expect("first open, share read");

    // READ requested again: subset of the recorded mode, admitted.
    let second = fs
        .open_file(&path("/f"), OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .expect("second reader is admitted");

    // READ_WRITE is wider than the recorded READ: refused, not blocked.
    let third = fs
        .open_file(&path("/f"), OpenMode::Open, FileAccess::READ, FileShare::READ_WRITE)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::Busy(path("/f"))), third);

    drop(first);
    drop(second);

    // With every holder gone the recorded mode is forgotten.
    fs.open_file(&path("/f"), OpenMode::Open, FileAccess::READ, FileShare::READ_WRITE)
        .await
        .expect("no recorded mode any more")
        .close()
        .await
        .expect("close");
}

#[tokio::test]
async fn stream_seek_read_write_set_length() {
    let fs = MemoryFileSystem::new();
    let mut stream = fs
        .open_file(&path("/f"), OpenMode::Create, FileAccess::READ_WRITE, FileShare::NONE)
        .await
        .expect("create");

    stream.write_all(b"0123456789").await.expect("write");
    assert_eq!(10, stream.position());
    assert_eq!(10, stream.length().await.expect("length"));

    assert_eq!(2, stream.seek(SeekFrom::Start(2)).await.expect("seek"));
    let mut buf = [0u8; 3];
    assert_eq!(3, stream.read(&mut buf).await.expect("read"));
    assert_eq!(b"234", &buf);

    assert_eq!(8, stream.seek(SeekFrom::End(-2)).await.expect("seek from end"));
    assert_eq!(6, stream.seek(SeekFrom::Current(-2)).await.expect("seek relative"));
    assert!(stream.seek(SeekFrom::Current(-100)).await.is_err());

    stream.set_length(4).await.expect("truncate");
    assert_eq!(4, stream.length().await.expect("new length"));

    // Writing past the end zero-fills the hole.
    stream.seek(SeekFrom::Start(6)).await.expect("seek past end");
    stream.write_all(b"zz").await.expect("write past end");
    stream.close().await.expect("close");
    assert_eq!(b"0123\0\0zz".to_vec(), read_file(&fs, "/f").await);
}

#[tokio::test]
async fn closed_stream_rejects_everything_but_close() {
    let fs = MemoryFileSystem::new();
    let mut stream = fs
        .open_file(&path("/f"), OpenMode::Create, FileAccess::READ_WRITE, FileShare::NONE)
        .await
        .expect("create");
    stream.close().await.expect("close");
    stream.close().await.expect("double close is a no-op");

    assert_eq!(Err(FsError::Disposed), stream.length().await);
    let mut buf = [0u8; 1];
    assert_eq!(Err(FsError::Disposed), stream.read(&mut buf).await);
    assert_eq!(Err(FsError::Disposed), stream.write(b"x").await);
    assert_eq!(Err(FsError::Disposed), stream.seek(SeekFrom::Start(0)).await);

    // The node lock was released: a fresh exclusive open succeeds at once.
    fs.open_file(&path("/f"), OpenMode::Open, FileAccess::READ, FileShare::NONE)
        .await
        .expect("reopen after close")
        .close()
        .await
        .expect("close");
}

#[tokio::test]
async fn dropping_a_stream_releases_the_lock() {
    let fs = MemoryFileSystem::new();
    let stream = fs
        .open_file(&path("/f"), OpenMode::Create, FileAccess::WRITE, FileShare::NONE)
        .await
        .expect("create");
    drop(stream);

    fs.open_file(&path("/f"), OpenMode::Open, FileAccess::READ, FileShare::NONE)
        .await
        .expect("lock was released by drop")
        .close()
        .await
        .expect("close");
}

#[tokio::test]
async fn write_modes_demand_write_access() {
    let fs = MemoryFileSystem::new();
    let result = fs
        .open_file(&path("/f"), OpenMode::Create, FileAccess::READ, FileShare::NONE)
        .await
        .map(|_| ());
    assert!(matches!(result, Err(FsError::InvalidArgument(_))), "got {result:?}");
}
