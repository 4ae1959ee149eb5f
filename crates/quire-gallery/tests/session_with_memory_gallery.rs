//! A session wired to the in-memory gallery.

use std::sync::Arc;

use quire_core::{Command, Config, EditorSession, LocalFile};
use quire_gallery::MemoryGallery;

#[tokio::test]
async fn test_upload_then_insert() {
    let gallery = MemoryGallery::new();
    let mut session = EditorSession::new(&Config::default(), Arc::new(gallery.clone()));
    session.apply(Command::InsertText("Intro".into())).unwrap();

    let uploader = session.assets().clone();
    let task = tokio::spawn(async move {
        uploader
            .upload_asset(LocalFile::new("hero.webp", "image/webp", vec![0; 32]))
            .await
    });

    // Editing carries on while the upload runs
    session.apply(Command::InsertText("!".into())).unwrap();
    let asset = task.await.unwrap().unwrap();

    session.insert_asset(&asset).await.unwrap();
    assert_eq!(
        session.serialized_content(),
        r#"<p>Intro!</p><img src="memory://0/hero.webp"><p></p>"#
    );
    assert_eq!(gallery.len().await, 1);
}

#[tokio::test]
async fn test_offline_gallery_keeps_previous_listing() {
    let gallery = MemoryGallery::new();
    let session = EditorSession::new(&Config::default(), Arc::new(gallery.clone()));

    session
        .assets()
        .upload_asset(LocalFile::new("a.png", "image/png", vec![1]))
        .await
        .unwrap();
    assert_eq!(session.assets().list_assets().await.unwrap().len(), 1);

    gallery.set_offline(true);
    let err = session.assets().list_assets().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(session.assets().cached().await.len(), 1);
}
