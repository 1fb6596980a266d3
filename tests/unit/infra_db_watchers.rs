use super::*;

async fn setup_db() -> (Database, std::path::PathBuf) {
    let mut path = std::env::temp_dir();
    path.push(format!("dx_modmail_watchers_{}.db", uuid::Uuid::now_v7()));
    let db = Database::new(path.to_str().unwrap()).await.unwrap();
    (db, path)
}

#[tokio::test]
async fn subscribe_is_deduplicated() {
    let (db, path) = setup_db().await;

    assert!(db.add_watcher(1, 501).await.unwrap());
    // Same pair again: reported as already present, no duplicate row.
    assert!(!db.add_watcher(1, 501).await.unwrap());
    assert!(db.add_watcher(1, 502).await.unwrap());

    let watchers = db.get_watchers(1).await.unwrap();
    assert_eq!(watchers.len(), 2);
    assert!(watchers.contains(&501));
    assert!(watchers.contains(&502));

    db.close().await;
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn watchers_are_scoped_per_channel() {
    let (db, path) = setup_db().await;
    db.add_watcher(1, 501).await.unwrap();
    db.add_watcher(2, 501).await.unwrap();

    assert_eq!(db.get_watchers(1).await.unwrap(), vec![501]);
    assert_eq!(db.get_watchers(2).await.unwrap(), vec![501]);
    assert!(db.get_watchers(3).await.unwrap().is_empty());

    db.close().await;
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let (db, path) = setup_db().await;
    db.add_watcher(1, 501).await.unwrap();

    assert_eq!(db.remove_watcher(1, 501).await.unwrap(), 1);
    assert_eq!(db.remove_watcher(1, 501).await.unwrap(), 0);

    db.add_watcher(1, 501).await.unwrap();
    db.add_watcher(1, 502).await.unwrap();
    assert_eq!(db.remove_watchers_for_channel(1).await.unwrap(), 2);
    assert!(db.get_watchers(1).await.unwrap().is_empty());

    db.close().await;
    let _ = std::fs::remove_file(path);
}
