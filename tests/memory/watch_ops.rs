use std::time::Duration;

use uvfs::{FileSystem, MemoryFileSystem, UPath, WatchEvent, WatchEventKind};

use crate::common::{path, write_file};

async fn next_event(watcher: &mut uvfs::Watcher) -> WatchEvent {
    tokio::time::timeout(Duration::from_secs(1), watcher.next())
        .await
        .expect("an event arrives in time")
        .expect("the feed is open")
}

#[tokio::test]
async fn create_delete_and_change_are_reported() {
    let fs = MemoryFileSystem::new();
    assert!(fs.can_watch(&UPath::root()));
    let mut watcher = fs.watch(&UPath::root()).await.expect("watch the root");

    fs.create_directory(&path("/d")).await.expect("create");
    assert_eq!(
        WatchEvent { kind: WatchEventKind::Created, path: path("/d") },
        next_event(&mut watcher).await
    );

    write_file(&fs, "/d/f", b"x").await;
    assert_eq!(
        WatchEvent { kind: WatchEventKind::Created, path: path("/d/f") },
        next_event(&mut watcher).await
    );

    fs.set_last_write_time(&path("/d/f"), std::time::SystemTime::now())
        .await
        .expect("touch");
    assert_eq!(
        WatchEvent { kind: WatchEventKind::Changed, path: path("/d/f") },
        next_event(&mut watcher).await
    );

    fs.delete_file(&path("/d/f")).await.expect("delete");
    assert_eq!(
        WatchEvent { kind: WatchEventKind::Deleted, path: path("/d/f") },
        next_event(&mut watcher).await
    );
}

#[tokio::test]
async fn renames_carry_the_old_path() {
    let fs = MemoryFileSystem::new();
    write_file(&fs, "/old", b"x").await;
    let mut watcher = fs.watch(&UPath::root()).await.expect("watch");

    fs.move_file(&path("/old"), &path("/new")).await.expect("move");
    assert_eq!(
        WatchEvent {
            kind: WatchEventKind::Renamed { old_path: path("/old") },
            path: path("/new"),
        },
        next_event(&mut watcher).await
    );
}

#[tokio::test]
async fn watchers_only_see_their_subtree() {
    let fs = MemoryFileSystem::new();
    fs.create_directory(&path("/watched")).await.expect("create");
    fs.create_directory(&path("/other")).await.expect("create");
    let mut watcher = fs.watch(&path("/watched")).await.expect("watch subtree");

    write_file(&fs, "/other/noise", b"x").await;
    write_file(&fs, "/watched/signal", b"x").await;

    assert_eq!(
        WatchEvent { kind: WatchEventKind::Created, path: path("/watched/signal") },
        next_event(&mut watcher).await
    );
    assert!(watcher.try_next().is_none(), "events outside the subtree leak through");
}

#[tokio::test]
async fn dropping_a_watcher_ends_the_subscription() {
    let fs = MemoryFileSystem::new();
    let watcher = fs.watch(&UPath::root()).await.expect("watch");
    drop(watcher);

    // Publishing prunes the dead sink; later watchers still work.
    write_file(&fs, "/f", b"x").await;
    let mut watcher = fs.watch(&UPath::root()).await.expect("watch again");
    fs.delete_file(&path("/f")).await.expect("delete");
    assert_eq!(
        WatchEvent { kind: WatchEventKind::Deleted, path: path("/f") },
        next_event(&mut watcher).await
    );
}
