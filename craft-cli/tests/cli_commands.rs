//! Integration tests for the templatecraft commands.
//!
//! Each test runs commands against a temporary data directory and checks
//! the stores through the library API.

use std::path::Path;

use clap::Parser;
use craft_cli::{run, CliArgs};
use craft_core::{Channel, EntityStatus, Library};

async fn exec(dir: &Path, args: &[&str]) -> anyhow::Result<()> {
    let data_dir = dir.to_str().expect("utf-8 path");
    let mut argv = vec!["templatecraft", "--data-dir", data_dir];
    argv.extend_from_slice(args);
    run(CliArgs::try_parse_from(argv)?).await
}

fn only_template(dir: &Path) -> craft_core::Template {
    let templates = Library::open(dir).expect("open").templates();
    assert_eq!(templates.len(), 1);
    templates.into_iter().next().expect("template")
}

#[tokio::test]
async fn test_create_add_and_reorder() {
    let dir = tempfile::tempdir().expect("tempdir");
    exec(dir.path(), &["create", "Spring", "--channel", "instagram"])
        .await
        .expect("create");
    let id = only_template(dir.path()).id;

    exec(dir.path(), &["add-text", id.as_str(), "--content", "Hello"])
        .await
        .expect("add text");
    exec(dir.path(), &["add-text", id.as_str()]).await.expect("add text");

    let tpl = only_template(dir.path());
    assert_eq!(tpl.status, EntityStatus::Active);
    assert_eq!(tpl.canvas.layer_count(), 2);
    let bottom = tpl.canvas.paint_order()[0].clone();
    assert_eq!(bottom.content.as_deref(), Some("Hello"));

    exec(dir.path(), &["front", id.as_str(), bottom.id.as_str()])
        .await
        .expect("front");
    let tpl = only_template(dir.path());
    let top = tpl.canvas.paint_order().last().map(|l| l.id.clone());
    assert_eq!(top, Some(bottom.id));
    assert!(tpl.canvas.has_dense_z_order());
}

#[tokio::test]
async fn test_move_and_resize_go_through_interaction() {
    let dir = tempfile::tempdir().expect("tempdir");
    exec(dir.path(), &["create", "Layout"]).await.expect("create");
    let id = only_template(dir.path()).id;
    exec(dir.path(), &["add-text", id.as_str()]).await.expect("add");
    let layer = only_template(dir.path()).canvas.layers[0].id.clone();

    exec(dir.path(), &["move", id.as_str(), layer.as_str(), "--x", "-20", "--y", "30"])
        .await
        .expect("move");
    exec(
        dir.path(),
        &["resize", id.as_str(), layer.as_str(), "--width", "10", "--height", "200"],
    )
    .await
    .expect("resize");

    let tpl = only_template(dir.path());
    let stored = tpl.canvas.layer(&layer).expect("layer");
    assert!((stored.x + 20.0).abs() < f32::EPSILON);
    assert!((stored.y - 30.0).abs() < f32::EPSILON);
    assert!((stored.width - 40.0).abs() < f32::EPSILON);
    assert!((stored.height - 200.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_remove_last_layer_returns_to_draft() {
    let dir = tempfile::tempdir().expect("tempdir");
    exec(dir.path(), &["create", "Solo"]).await.expect("create");
    let id = only_template(dir.path()).id;
    exec(dir.path(), &["add-text", id.as_str()]).await.expect("add");
    let layer = only_template(dir.path()).canvas.layers[0].id.clone();

    exec(dir.path(), &["remove-layer", id.as_str(), layer.as_str()])
        .await
        .expect("remove");
    let tpl = only_template(dir.path());
    assert!(tpl.canvas.is_empty());
    assert_eq!(tpl.status, EntityStatus::Draft);
}

#[tokio::test]
async fn test_use_thumbnail_and_suggest() {
    let dir = tempfile::tempdir().expect("tempdir");
    exec(dir.path(), &["create", "Base"]).await.expect("create");
    let id = only_template(dir.path()).id;
    exec(dir.path(), &["add-text", id.as_str()]).await.expect("add");

    exec(dir.path(), &["use", id.as_str()]).await.expect("use");
    let library = Library::open(dir.path()).expect("open");
    let designs = library.designs();
    assert_eq!(designs.len(), 1);
    let design = &designs[0];
    assert!(design.id.starts_with("design-"));
    assert_eq!(design.status, EntityStatus::Draft);
    assert_eq!(design.canvas.layer_count(), 1);

    let layer = design.canvas.layers[0].id.clone();
    exec(
        dir.path(),
        &["suggest", "--prompt", "Boots", "--insert", design.id.as_str(), layer.as_str()],
    )
    .await
    .expect("suggest");
    let design = Library::open(dir.path())
        .expect("open")
        .design_by_id(&design.id)
        .expect("design");
    assert_eq!(
        design.canvas.layers[0].content.as_deref(),
        Some("Boots: save big today")
    );
    assert_eq!(design.status, EntityStatus::Active);

    let out = dir.path().join("thumb.png");
    exec(
        dir.path(),
        &["thumbnail", design.id.as_str(), "--out", out.to_str().expect("utf-8"), "--max", "108"],
    )
    .await
    .expect("thumbnail");
    let png = std::fs::read(&out).expect("png written");
    assert_eq!(&png[0..4], &[137, 80, 78, 71]);
}

#[tokio::test]
async fn test_meta_and_missing_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    exec(dir.path(), &["create", "Old"]).await.expect("create");
    let id = only_template(dir.path()).id;

    exec(dir.path(), &["meta", id.as_str(), "--name", " ", "--channel", "twitter"])
        .await
        .expect("meta");
    let tpl = only_template(dir.path());
    assert_eq!(tpl.name, "Untitled Template");

    assert!(exec(dir.path(), &["show", "tpl-missing"]).await.is_err());
    assert!(exec(dir.path(), &["meta", "design-missing", "--name", "x"])
        .await
        .is_err());
    assert!(exec(dir.path(), &["add-image", id.as_str(), "/no/such/file.png"])
        .await
        .is_err());
}

#[tokio::test]
async fn test_rename_keeps_channel() {
    let dir = tempfile::tempdir().expect("tempdir");
    exec(dir.path(), &["create", "Promo", "--channel", "instagram"])
        .await
        .expect("create");
    let id = only_template(dir.path()).id;

    exec(dir.path(), &["meta", id.as_str(), "--name", "Renamed"])
        .await
        .expect("rename");
    let tpl = only_template(dir.path());
    assert_eq!(tpl.name, "Renamed");
    assert_eq!(tpl.channel, Channel::Instagram);

    exec(dir.path(), &["meta", id.as_str(), "--name", "Renamed", "--channel", "linkedin"])
        .await
        .expect("re-channel");
    assert_eq!(only_template(dir.path()).channel, Channel::Linkedin);
}

#[tokio::test]
async fn test_set_image_replaces_src() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("first.gif");
    let second = dir.path().join("second.png");
    std::fs::write(&first, b"GIF89a\x01\x00\x01\x00").expect("write gif");
    std::fs::write(&second, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).expect("write png");

    exec(dir.path(), &["create", "Photo"]).await.expect("create");
    let id = only_template(dir.path()).id;
    exec(dir.path(), &["add-image", id.as_str(), first.to_str().expect("utf-8")])
        .await
        .expect("add image");
    let layer = only_template(dir.path()).canvas.layers[0].id.clone();

    exec(
        dir.path(),
        &["set", id.as_str(), layer.as_str(), "--image", second.to_str().expect("utf-8")],
    )
    .await
    .expect("replace image");
    let src = only_template(dir.path()).canvas.layers[0].src.clone();
    assert!(src.is_some_and(|s| s.starts_with("data:image/png;base64,")));

    let missing = dir.path().join("missing.png");
    assert!(exec(
        dir.path(),
        &["set", id.as_str(), layer.as_str(), "--image", missing.to_str().expect("utf-8")],
    )
    .await
    .is_err());
    let src = only_template(dir.path()).canvas.layers[0].src.clone();
    assert!(src.is_some_and(|s| s.starts_with("data:image/png;base64,")));
}

#[tokio::test]
async fn test_set_font_size_is_floored() {
    let dir = tempfile::tempdir().expect("tempdir");
    exec(dir.path(), &["create", "Type"]).await.expect("create");
    let id = only_template(dir.path()).id;
    exec(dir.path(), &["add-text", id.as_str()]).await.expect("add");
    let layer = only_template(dir.path()).canvas.layers[0].id.clone();

    exec(dir.path(), &["set", id.as_str(), layer.as_str(), "--font-size", "0"])
        .await
        .expect("set");
    let stored = only_template(dir.path()).canvas.layers[0].font_size;
    assert_eq!(stored, Some(craft_core::layer::MIN_FONT_SIZE));
}
