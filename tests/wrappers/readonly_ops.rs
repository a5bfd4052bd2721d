use uvfs::{
    FileAccess, FileAttributes, FileShare, FileSystem, FsError, MemoryFileSystem, OpenMode,
    ReadOnlyFileSystem, SearchOption, SearchTarget, UPath,
};

fn path(text: &str) -> UPath {
    UPath::new(text).expect("valid path")
}

async fn fixture() -> ReadOnlyFileSystem<MemoryFileSystem> {
    let fs = MemoryFileSystem::new();
    fs.create_directory(&path("/docs")).await.expect("create");
    fs.write_all_bytes(&path("/docs/a.txt"), b"alpha").await.expect("seed file");
    ReadOnlyFileSystem::new(fs)
}

#[tokio::test]
async fn reads_pass_through() {
    let fs = fixture().await;
    assert!(fs.directory_exists(&path("/docs")).await.expect("dir exists"));
    assert!(fs.file_exists(&path("/docs/a.txt")).await.expect("file exists"));
    assert_eq!(b"alpha".to_vec(), fs.read_all_bytes(&path("/docs/a.txt")).await.expect("read"));
    assert_eq!(5, fs.get_file_length(&path("/docs/a.txt")).await.expect("length"));

    let found = fs
        .enumerate_paths(&path("/"), "*.txt", SearchOption::AllDirectories, SearchTarget::File)
        .await
        .expect("enumerate")
        .collect()
        .await
        .expect("drain");
    assert_eq!(vec![path("/docs/a.txt")], found);
}

#[tokio::test]
async fn every_mutation_is_denied() {
    let fs = fixture().await;
    let target = path("/docs/a.txt");

    assert_eq!(Err(FsError::Unauthorized(path("/new"))), fs.create_directory(&path("/new")).await);
    assert_eq!(Err(FsError::Unauthorized(target.clone())), fs.delete_file(&target).await);
    assert_eq!(
        Err(FsError::Unauthorized(path("/docs"))),
        fs.delete_directory(&path("/docs"), true).await
    );
    assert_eq!(
        Err(FsError::Unauthorized(target.clone())),
        fs.move_file(&target, &path("/docs/b.txt")).await
    );
    assert_eq!(
        Err(FsError::Unauthorized(path("/docs/b.txt"))),
        fs.copy_file(&target, &path("/docs/b.txt"), true).await
    );
    assert_eq!(
        Err(FsError::Unauthorized(target.clone())),
        fs.set_attributes(&target, FileAttributes::HIDDEN).await
    );
    assert_eq!(
        Err(FsError::Unauthorized(target.clone())),
        fs.set_last_write_time(&target, std::time::SystemTime::now()).await
    );

    // Write-flavoured opens are refused; read opens go through.
    let denied = fs
        .open_file(&target, OpenMode::Open, FileAccess::WRITE, FileShare::NONE)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::Unauthorized(target.clone())), denied);
    let denied = fs
        .open_file(&target, OpenMode::Create, FileAccess::READ, FileShare::NONE)
        .await
        .map(|_| ());
    assert_eq!(Err(FsError::Unauthorized(target.clone())), denied);
    fs.open_file(&target, OpenMode::Open, FileAccess::READ, FileShare::READ)
        .await
        .expect("read open passes")
        .close()
        .await
        .expect("close");

    // Nothing changed underneath.
    assert_eq!(b"alpha".to_vec(), fs.read_all_bytes(&target).await.expect("still intact"));
}

#[tokio::test]
async fn attributes_gain_the_read_only_bit() {
    let fs = fixture().await;
    let attributes = fs.get_attributes(&path("/docs/a.txt")).await.expect("attributes");
    assert!(attributes.contains(FileAttributes::READ_ONLY));
    let attributes = fs.get_attributes(&path("/docs")).await.expect("dir attributes");
    assert!(attributes.contains(FileAttributes::READ_ONLY));
    assert!(attributes.contains(FileAttributes::DIRECTORY));
}
