//! Integration tests for the ID3 tag writer

use id3::{Tag, TagLike};
use tempfile::TempDir;
use tunekeep_core::{CoverArt, TagUpdate, TagWriter};
use tunekeep_metadata::Id3TagWriter;

fn fake_mp3(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"fake audio payload").unwrap();
    path
}

#[test]
fn test_write_creates_tag_with_comment() {
    let dir = TempDir::new().unwrap();
    let path = fake_mp3(&dir, "song.mp3");

    Id3TagWriter::new()
        .write_tags(&path, &TagUpdate::memberships(vec!["Rock".into(), "Chill".into()]))
        .unwrap();

    let tag = Tag::read_from_path(&path).unwrap();
    let comments: Vec<_> = tag.comments().collect();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Rock, Chill");
    assert_eq!(comments[0].lang, "eng");
    assert_eq!(comments[0].description, "");
}

#[test]
fn test_rewrite_replaces_comment_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = fake_mp3(&dir, "song.mp3");
    let writer = Id3TagWriter::new();

    writer
        .write_tags(&path, &TagUpdate::memberships(vec!["Rock".into()]))
        .unwrap();
    writer
        .write_tags(&path, &TagUpdate::memberships(vec![]))
        .unwrap();
    let once = Tag::read_from_path(&path).unwrap();
    writer
        .write_tags(&path, &TagUpdate::memberships(vec![]))
        .unwrap();
    let twice = Tag::read_from_path(&path).unwrap();

    let tag = Tag::read_from_path(&path).unwrap();
    let comments: Vec<_> = tag.comments().collect();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "");
    assert_eq!(once, twice);
}

#[test]
fn test_write_cover_and_artist() {
    let dir = TempDir::new().unwrap();
    let path = fake_mp3(&dir, "song.mp3");

    let update = TagUpdate {
        playlists: vec!["Rock".into()],
        cover: Some(CoverArt {
            data: vec![0xFF, 0xD8, 0xFF, 0xE0],
            mime_type: "image/jpeg".into(),
        }),
        artist: Some("Uploader".into()),
    };
    Id3TagWriter::new().write_tags(&path, &update).unwrap();

    let tag = Tag::read_from_path(&path).unwrap();
    assert_eq!(tag.artist(), Some("Uploader"));
    let pictures: Vec<_> = tag.pictures().collect();
    assert_eq!(pictures.len(), 1);
    assert_eq!(pictures[0].mime_type, "image/jpeg");
    assert_eq!(pictures[0].description, "Cover");
}
