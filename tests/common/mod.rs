#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use fund_core::{config::ConfigManager, storage::JsonStore};
use lopdf::{dictionary, Document, Object, Stream};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated data directory with a JSON store and config manager.
pub fn setup_test_env() -> (Arc<JsonStore>, ConfigManager, PathBuf) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let store = Arc::new(JsonStore::new(base.join("data")).expect("create json store"));
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");

    (store, config_manager, base)
}

/// A minimal document with `count` pages sharing resources through the page tree.
pub fn pdf_with_pages(count: usize) -> Vec<u8> {
    labelled_pdf("sheet", count)
}

/// Like [`pdf_with_pages`], with each page printing `(<label> <index>)`.
pub fn labelled_pdf(label: &str, count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids: Vec<Object> = Vec::new();
    for index in 0..count {
        let content = format!("BT /F1 18 Tf 72 700 Td ({label} {index}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize fixture document");
    bytes
}

/// The text printed on each page of a merged document, in page order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("reload merged document");
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).expect("page content");
            let text = String::from_utf8_lossy(&content);
            let start = text.find('(').expect("text operand") + 1;
            let end = text.rfind(')').expect("text operand");
            text[start..end].to_string()
        })
        .collect()
}
