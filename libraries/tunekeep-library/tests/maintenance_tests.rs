use std::sync::Arc;
use tunekeep_core::{ContentHasher, Pool, TuneError};
use tunekeep_library::Sha256Hasher;

use test_helpers::TestLibrary;

#[tokio::test]
async fn test_repair_purges_missing_and_duplicate_entries() {
    let lib = TestLibrary::new();
    lib.in_library("alive.mp3");
    lib.staged("staged.mp3");
    std::fs::write(
        lib.playlist_path("Rock"),
        "AllSongs/alive.mp3\nAllSongs/dead.mp3\n../TempDownloads/staged.mp3\nAllSongs/alive.mp3\n",
    )
    .unwrap();
    lib.write_playlist("Empty", &[]);

    let reports = lib.engine.repair_playlists().await.unwrap();

    assert_eq!(reports.len(), 2);
    let rock = reports.iter().find(|r| r.playlist == "Rock").unwrap();
    assert_eq!(rock.kept, 2);
    assert_eq!(rock.removed, vec!["AllSongs/dead.mp3", "AllSongs/alive.mp3"]);
    assert_eq!(
        lib.playlist_text("Rock"),
        "#EXTM3U\nAllSongs/alive.mp3\n../TempDownloads/staged.mp3\n"
    );

    let empty = reports.iter().find(|r| r.playlist == "Empty").unwrap();
    assert_eq!(empty.kept, 0);
    assert!(empty.removed.is_empty());
}

#[tokio::test]
async fn test_ingest_sorts_folders_into_playlists() {
    let lib = TestLibrary::new();
    lib.in_library("taken.mp3");

    let source = lib.dir.path().join("Raw Songs");
    std::fs::create_dir_all(source.join("Rock")).unwrap();
    std::fs::create_dir_all(source.join("Chill/nested")).unwrap();
    std::fs::write(source.join("loose.mp3"), b"ignored").unwrap();
    std::fs::write(source.join("Rock/taken.mp3"), b"new").unwrap();
    std::fs::write(source.join("Chill/nested/calm.mp3"), b"calm").unwrap();

    let hasher: Arc<dyn ContentHasher> = Arc::new(Sha256Hasher);
    let report = lib
        .engine
        .ingest_folder(&source, Some(hasher))
        .await
        .unwrap();

    assert!(report.skipped.is_empty());
    assert_eq!(report.imported.len(), 2);
    assert!(report.imported.iter().all(|f| f.content_hash.is_some()));

    let rock = report.imported.iter().find(|f| f.playlist == "Rock").unwrap();
    assert_eq!(rock.track, lib.at(Pool::Library, "taken (2).mp3"));
    assert_eq!(
        lib.playlist_text("Rock"),
        "#EXTM3U\nAllSongs/taken (2).mp3\n"
    );
    assert_eq!(
        lib.playlist_text("Chill"),
        "#EXTM3U\nAllSongs/calm.mp3\n"
    );
    assert_eq!(lib.comment(&rock.track).as_deref(), Some("Rock"));

    assert!(source.join("loose.mp3").exists());
    assert!(!source.join("Rock/taken.mp3").exists());
}

#[tokio::test]
async fn test_ingest_missing_source() {
    let lib = TestLibrary::new();
    let err = lib
        .engine
        .ingest_folder(&lib.dir.path().join("nope"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TuneError::NotFound(_)));
}

#[tokio::test]
async fn test_promote_unique_and_retag() {
    let lib = TestLibrary::new();
    lib.in_library("song.mp3");
    lib.in_library("song (2).mp3");
    let staged = lib.staged("song.mp3");

    let placed = lib.engine.promote_unique(&staged).await.unwrap();
    assert_eq!(placed, lib.at(Pool::Library, "song (3).mp3"));

    let results = lib
        .engine
        .append_memberships(&placed, &["Rock".to_string(), "bad/name".to_string()])
        .await
        .unwrap();
    assert!(matches!(results[0], (ref name, Ok(true)) if name == "Rock"));
    assert!(matches!(results[1].1, Err(TuneError::InvalidPlaylistName(_))));

    let written = lib.engine.retag(&placed, None, Some("Artist".into())).await.unwrap();
    assert_eq!(written, vec!["Rock"]);
    assert_eq!(lib.comment(&placed).as_deref(), Some("Rock"));
}
