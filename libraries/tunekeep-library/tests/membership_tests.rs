use std::sync::Arc;
use tunekeep_core::{Pool, Settings, TuneError};

use test_helpers::TestLibrary;

#[tokio::test]
async fn test_add_to_missing_playlist_promotes_staged_track() {
    let lib = TestLibrary::new();
    let track = lib.staged("trackX.mp3");

    let updates = lib.engine.add_to_playlist("Rock", &[track.clone()]).await.unwrap();

    assert_eq!(updates.len(), 1);
    let update = &updates[0];
    assert!(update.is_ok());
    assert_eq!(update.pool, Some(Pool::Library));
    assert_eq!(update.playlists, vec!["Rock"]);
    assert_eq!(update.track, lib.at(Pool::Library, "trackX.mp3"));
    assert!(!track.path().exists());

    assert_eq!(lib.playlist_text("Rock"), "#EXTM3U\nAllSongs/trackX.mp3\n");
    assert_eq!(lib.comment(&update.track).as_deref(), Some("Rock"));
}

#[tokio::test]
async fn test_remove_last_membership_demotes_to_staging() {
    let lib = TestLibrary::new();
    let track = lib.in_library("trackY.mp3");
    lib.write_playlist("Rock", &["AllSongs/trackY.mp3", "AllSongs/other.mp3"]);

    let updates = lib
        .engine
        .remove_from_playlist("Rock", &[track.clone()])
        .await
        .unwrap();

    let update = &updates[0];
    assert!(update.is_ok());
    assert_eq!(update.pool, Some(Pool::Staging));
    assert!(update.playlists.is_empty());
    assert_eq!(lib.playlist_text("Rock"), "#EXTM3U\nAllSongs/other.mp3\n");

    // Tagged before the move
    assert_eq!(lib.comment(&track).as_deref(), Some(""));
    assert!(lib.at(Pool::Staging, "trackY.mp3").path().exists());
}

#[tokio::test]
async fn test_remove_keeps_track_with_other_memberships() {
    let lib = TestLibrary::new();
    let track = lib.in_library("song.mp3");
    lib.write_playlist("Rock", &["AllSongs/song.mp3"]);
    lib.write_playlist("Chill", &["AllSongs/song.mp3"]);

    let updates = lib
        .engine
        .remove_from_playlist("Rock", &[track.clone()])
        .await
        .unwrap();

    assert_eq!(updates[0].pool, Some(Pool::Library));
    assert_eq!(updates[0].playlists, vec!["Chill"]);
    assert_eq!(lib.comment(&track).as_deref(), Some("Chill"));
}

#[tokio::test]
async fn test_set_memberships_replaces_and_is_idempotent() {
    let lib = TestLibrary::new();
    let track = lib.in_library("song.mp3");
    lib.write_playlist("Old", &["AllSongs/song.mp3"]);
    let targets = vec!["Rock".to_string(), "Chill".to_string()];

    let first = lib.engine.set_memberships(&[track.clone()], &targets).await.unwrap();
    let rock_once = lib.playlist_text("Rock");
    let chill_once = lib.playlist_text("Chill");
    let comment_once = lib.comment(&track);

    let second = lib.engine.set_memberships(&[track.clone()], &targets).await.unwrap();

    assert_eq!(first[0].playlists, vec!["Chill", "Rock"]);
    assert_eq!(second[0].playlists, vec!["Chill", "Rock"]);
    assert_eq!(lib.playlist_text("Rock"), rock_once);
    assert_eq!(lib.playlist_text("Chill"), chill_once);
    assert_eq!(lib.comment(&track), comment_once);
    assert_eq!(lib.playlist_text("Old"), "#EXTM3U\n");
    assert_eq!(comment_once.as_deref(), Some("Chill, Rock"));
}

#[tokio::test]
async fn test_clear_memberships_moves_to_staging() {
    let lib = TestLibrary::new();
    let track = lib.in_library("song.mp3");
    lib.write_playlist("Rock", &["AllSongs/song.mp3"]);
    lib.write_playlist("Chill", &["AllSongs/song.mp3"]);

    let updates = lib.engine.clear_memberships(&[track.clone()]).await.unwrap();

    assert_eq!(updates[0].pool, Some(Pool::Staging));
    assert_eq!(lib.playlist_text("Rock"), "#EXTM3U\n");
    assert_eq!(lib.playlist_text("Chill"), "#EXTM3U\n");
    assert_eq!(lib.comment(&track).as_deref(), Some(""));
}

#[tokio::test]
async fn test_move_conflict_is_isolated_to_one_track() {
    let lib = TestLibrary::new();
    let a = lib.staged("a.mp3");
    lib.in_library("a.mp3");
    let b = lib.staged("b.mp3");

    let updates = lib
        .engine
        .set_memberships(&[a.clone(), b.clone()], &["Chill".to_string()])
        .await
        .unwrap();

    assert!(matches!(updates[0].result, Err(TuneError::MoveConflict { .. })));
    assert_eq!(updates[0].pool, Some(Pool::Staging));
    assert!(updates[0].playlists.is_empty());
    assert!(a.path().exists());

    assert!(updates[1].is_ok());
    assert_eq!(updates[1].pool, Some(Pool::Library));
    assert_eq!(updates[1].playlists, vec!["Chill"]);
    assert_eq!(lib.playlist_text("Chill"), "#EXTM3U\nAllSongs/b.mp3\n");
}

#[tokio::test]
async fn test_demotion_conflict_leaves_track_in_library() {
    let lib = TestLibrary::new();
    let track = lib.in_library("dup.mp3");
    lib.staged("dup.mp3");
    lib.write_playlist("Rock", &["AllSongs/dup.mp3"]);

    let updates = lib.engine.clear_memberships(&[track.clone()]).await.unwrap();

    assert!(updates[0].is_ok());
    assert_eq!(updates[0].pool, Some(Pool::Library));
    assert!(track.path().exists());
}

#[tokio::test]
async fn test_playlists_of_is_sorted() {
    let lib = TestLibrary::new();
    let track = lib.in_library("song.mp3");
    lib.write_playlist("Zed", &["AllSongs/song.mp3"]);
    lib.write_playlist("Alpha", &["AllSongs/song.mp3"]);
    lib.write_playlist("Mid", &["AllSongs/other.mp3"]);

    assert_eq!(
        lib.engine.playlists_of(&track).await.unwrap(),
        vec!["Alpha", "Zed"]
    );
}

#[tokio::test]
async fn test_reconcile_orphans() {
    let lib = TestLibrary::new();
    let member = lib.in_library("member.mp3");
    let orphan = lib.in_library("orphan.mp3");
    let blocked = lib.in_library("blocked.mp3");
    lib.staged("blocked.mp3");
    lib.write_playlist("Rock", &["AllSongs/member.mp3"]);

    let report = lib.engine.reconcile_orphans().await.unwrap();

    assert_eq!(report.moved, vec![lib.at(Pool::Staging, "orphan.mp3")]);
    assert_eq!(report.skipped, vec![blocked.clone()]);
    assert!(report.failed.is_empty());
    assert!(member.path().exists());
    assert!(!orphan.path().exists());
    assert!(blocked.path().exists());
}

#[tokio::test]
async fn test_delete_track() {
    let lib = TestLibrary::new();
    let track = lib.in_library("gone.mp3");
    lib.write_playlist("Rock", &["AllSongs/gone.mp3", "AllSongs/keep.mp3"]);
    lib.write_playlist("Chill", &["AllSongs/gone.mp3"]);

    let removed_from = lib.engine.delete_track(&track).await.unwrap();
    assert_eq!(removed_from, vec!["Chill", "Rock"]);
    assert!(!track.path().exists());
    assert_eq!(lib.playlist_text("Rock"), "#EXTM3U\nAllSongs/keep.mp3\n");
    assert_eq!(lib.playlist_text("Chill"), "#EXTM3U\n");

    let err = lib.engine.delete_track(&track).await.unwrap_err();
    assert!(matches!(err, TuneError::NotFound(_)));
}

#[tokio::test]
async fn test_create_playlist_already_exists() {
    let lib = TestLibrary::new();
    lib.engine.create_playlist("Rock").await.unwrap();
    assert_eq!(lib.engine.list_playlists().await.unwrap(), vec!["Rock"]);

    let err = lib.engine.create_playlist("Rock").await.unwrap_err();
    assert!(matches!(err, TuneError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_concurrent_adds_to_same_playlist() {
    let lib = TestLibrary::new();
    let tracks: Vec<_> = (0..20).map(|i| lib.staged(&format!("t{i:02}.mp3"))).collect();

    let mut handles = Vec::new();
    for track in tracks {
        let engine = Arc::clone(&lib.engine);
        handles.push(tokio::spawn(async move {
            engine.add_to_playlist("Chill", &[track]).await
        }));
    }
    for handle in handles {
        let updates = handle.await.unwrap().unwrap();
        assert!(updates[0].is_ok());
    }

    let text = lib.playlist_text("Chill");
    let mut lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.remove(0), "#EXTM3U");
    assert_eq!(text.matches("#EXTM3U").count(), 1);
    lines.sort_unstable();
    let expected: Vec<String> = (0..20).map(|i| format!("AllSongs/t{i:02}.mp3")).collect();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn test_tracks_in_playlist_and_find() {
    let lib = TestLibrary::new();
    lib.in_library("Daft Punk - One More Time.mp3");
    lib.in_library("b song.mp3");
    lib.staged("One More Time (Live).flac");
    lib.write_playlist(
        "Dance",
        &["AllSongs/b song.mp3", "AllSongs/Daft Punk - One More Time.mp3"],
    );

    let members = lib.engine.tracks_in_playlist("Dance").await.unwrap();
    let names: Vec<String> = members.iter().map(|t| t.file_name()).collect();
    assert_eq!(names, vec!["b song.mp3", "Daft Punk - One More Time.mp3"]);

    let found = lib.engine.find_tracks("one more time").await.unwrap();
    let found: Vec<String> = found.iter().map(|t| t.file_name()).collect();
    assert!(found.contains(&"Daft Punk - One More Time.mp3".to_string()));
    assert!(found.contains(&"One More Time (Live).flac".to_string()));
    assert!(!found.contains(&"b song.mp3".to_string()));
}

#[tokio::test]
async fn test_non_mp3_tracks_are_not_tagged() {
    let lib = TestLibrary::new();
    let track = lib.staged("lossless.flac");

    let updates = lib.engine.add_to_playlist("Rock", &[track]).await.unwrap();

    assert!(updates[0].is_ok());
    assert_eq!(updates[0].pool, Some(Pool::Library));
    assert_eq!(lib.tags.writes(), 0);
}

#[tokio::test]
async fn test_invalid_playlist_name_rejected() {
    let lib = TestLibrary::new();
    let track = lib.staged("a.mp3");

    let err = lib
        .engine
        .add_to_playlist("../Escape", &[track.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, TuneError::InvalidPlaylistName(_)));
    assert!(track.path().exists());
}

#[tokio::test]
async fn test_reconfigure_root_rebuilds_index() {
    let lib = TestLibrary::new();
    let track = lib.in_library("song.mp3");
    lib.write_playlist("Rock", &["AllSongs/song.mp3"]);
    assert_eq!(lib.engine.playlists_of(&track).await.unwrap(), vec!["Rock"]);

    let other = Settings::for_root(lib.dir.path().join("OTHER"));
    std::fs::create_dir_all(&other.layout.root).unwrap();
    lib.handle.reconfigure(other).await.unwrap();

    assert!(lib.engine.list_playlists().await.unwrap().is_empty());
    assert!(lib.engine.playlists_of(&track).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reload_picks_up_external_edits() {
    let lib = TestLibrary::new();
    let track = lib.in_library("song.mp3");
    assert!(lib.engine.playlists_of(&track).await.unwrap().is_empty());

    lib.write_playlist("Rock", &["AllSongs/song.mp3"]);
    lib.engine.reload().await.unwrap();

    assert_eq!(lib.engine.playlists_of(&track).await.unwrap(), vec!["Rock"]);
}

#[tokio::test]
async fn test_uppercase_extension_playlist_counts_as_membership() {
    let lib = TestLibrary::new();
    let old = lib.in_library("old.mp3");
    let fresh = lib.staged("fresh.mp3");
    let upper = lib.settings.layout.root.join("Mix.M3U");
    std::fs::write(&upper, "#EXTM3U\nAllSongs/old.mp3\n").unwrap();

    assert_eq!(lib.engine.list_playlists().await.unwrap(), vec!["Mix"]);
    assert_eq!(lib.engine.playlists_of(&old).await.unwrap(), vec!["Mix"]);

    let report = lib.engine.reconcile_orphans().await.unwrap();
    assert!(report.moved.is_empty());
    assert!(old.path().exists());

    let updates = lib.engine.add_to_playlist("Mix", &[fresh]).await.unwrap();
    assert!(updates[0].is_ok());
    assert_eq!(
        std::fs::read_to_string(&upper).unwrap(),
        "#EXTM3U\nAllSongs/old.mp3\nAllSongs/fresh.mp3\n"
    );
    assert!(!lib.playlist_path("Mix").exists());
    assert_eq!(
        lib.engine.tracks_in_playlist("Mix").await.unwrap(),
        vec![lib.at(Pool::Library, "fresh.mp3"), old]
    );
}
