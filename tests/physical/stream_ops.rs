use std::io::SeekFrom;

use uvfs::{FileAccess, FileShare, FileSystem, FsError, OpenMode};

use crate::common::{path, Fixture};

#[tokio::test]
async fn open_modes_follow_the_effective_table() {
    let fixture = Fixture::new();
    fixture.write_host_file("existing", b"0123456789");

    let denied = fixture
        .fs
        .open_file(&path("/existing"), OpenMode::CreateNew, FileAccess::WRITE, FileShare::NONE)
        .await
        .map(|_| ());
    assert!(matches!(denied, Err(FsError::AlreadyExists(_))), "got {denied:?}");

    let denied = fixture
        .fs
        .open_file(&path("/missing"), OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .map(|_| ());
    assert!(matches!(denied, Err(FsError::FileNotFound(_))), "got {denied:?}");

    let denied = fixture
        .fs
        .open_file(&path("/f"), OpenMode::Append, FileAccess::READ_WRITE, FileShare::NONE)
        .await
        .map(|_| ());
    assert!(matches!(denied, Err(FsError::InvalidArgument(_))), "got {denied:?}");

    let mut stream = fixture
        .fs
        .open_file(&path("/existing"), OpenMode::Truncate, FileAccess::WRITE, FileShare::NONE)
        .await
        .expect("truncate open");
    assert_eq!(0, stream.length().await.expect("emptied"));
    stream.close().await.expect("close");
}

#[tokio::test]
async fn append_extends_the_host_file() {
    let fixture = Fixture::new();
    fixture.write_host_file("log", b"one");

    let mut stream = fixture
        .fs
        .open_file(&path("/log"), OpenMode::Append, FileAccess::WRITE, FileShare::NONE)
        .await
        .expect("append open");
    assert_eq!(3, stream.position());
    stream.write_all(b"+two").await.expect("append");
    stream.close().await.expect("close");

    assert_eq!(b"one+two".to_vec(), std::fs::read(fixture.host_path("log")).expect("read"));
}

#[tokio::test]
async fn seek_read_write_and_set_length() {
    let fixture = Fixture::new();
    let mut stream = fixture
        .fs
        .open_file(&path("/f"), OpenMode::Create, FileAccess::READ_WRITE, FileShare::NONE)
        .await
        .expect("create");

    stream.write_all(b"abcdefgh").await.expect("write");
    assert_eq!(8, stream.position());

    assert_eq!(2, stream.seek(SeekFrom::Start(2)).await.expect("seek"));
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.expect("read");
    assert_eq!(b"cdefgh".to_vec(), buf);

    stream.set_length(4).await.expect("truncate");
    assert_eq!(4, stream.length().await.expect("length"));
    stream.close().await.expect("close");

    assert_eq!(b"abcd".to_vec(), std::fs::read(fixture.host_path("f")).expect("host read"));
}

#[tokio::test]
async fn closed_stream_is_disposed() {
    let fixture = Fixture::new();
    let mut stream = fixture
        .fs
        .open_file(&path("/f"), OpenMode::Create, FileAccess::WRITE, FileShare::NONE)
        .await
        .expect("create");
    stream.close().await.expect("close");
    stream.close().await.expect("double close is a no-op");
    assert_eq!(Err(FsError::Disposed), stream.write(b"x").await);
    assert_eq!(Err(FsError::Disposed), stream.length().await);
}
