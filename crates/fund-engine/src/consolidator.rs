//! Merges a submission's attachments into one reviewer document.
//!
//! Unreadable, encrypted and empty inputs are skipped and reported; the merge
//! only fails when nothing usable is left.

use std::{collections::BTreeMap, panic};

use fund_domain::{Attachment, Submission};
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::{ports::BlobStore, CoreError};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_TREE_DEPTH: usize = 64;

/// Raw bytes of one attachment, tagged with an identifier for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentBlob {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl AttachmentBlob {
    pub fn new(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Identifiers of the inputs that contributed nothing.
    pub skipped: Vec<String>,
}

/// Fetches attachment content in declared order. Blobs that cannot be fetched
/// are returned as skipped identifiers.
pub fn collect_attachments(
    blobs: &dyn BlobStore,
    attachments: &[Attachment],
) -> (Vec<AttachmentBlob>, Vec<String>) {
    let mut ordered: Vec<&Attachment> = attachments.iter().collect();
    ordered.sort_by_key(|attachment| attachment.order);

    let mut fetched = Vec::with_capacity(ordered.len());
    let mut skipped = Vec::new();
    for attachment in ordered {
        let id = attachment.file_id.to_string();
        match blobs.fetch(attachment.file_id) {
            Ok(bytes) => fetched.push(AttachmentBlob::new(id, bytes)),
            Err(err) => {
                tracing::warn!(file = %id, name = %attachment.file_name, error = %err, "attachment unavailable");
                skipped.push(id);
            }
        }
    }
    (fetched, skipped)
}

pub struct DocumentConsolidator;

impl DocumentConsolidator {
    /// Concatenates the pages of every usable input, in input order.
    pub fn merge(inputs: &[AttachmentBlob]) -> Result<MergedDocument, CoreError> {
        let mut skipped = Vec::new();
        let mut next_id = 1;
        let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
        let mut kids: Vec<ObjectId> = Vec::new();

        for input in inputs {
            let Some(mut document) = load(input) else {
                skipped.push(input.id.clone());
                continue;
            };
            document.renumber_objects_with(next_id);
            next_id = document.max_id + 1;

            let pages = flatten_pages(&document);
            let page_ids: Vec<ObjectId> = pages.iter().map(|(id, _)| *id).collect();
            for (id, object) in document.objects {
                if keeps_object(&object) {
                    objects.insert(id, object);
                }
            }
            for (id, page) in pages {
                objects.insert(id, Object::Dictionary(page));
            }
            kids.extend(page_ids);
        }

        if kids.is_empty() {
            return Err(CoreError::NoMergeableContent { skipped });
        }

        let mut merged = Document::with_version("1.5");
        merged.objects = objects;
        merged.max_id = next_id;
        let pages_id = merged.new_object_id();
        for kid in &kids {
            if let Some(Object::Dictionary(page)) = merged.objects.get_mut(kid) {
                page.set("Parent", pages_id);
            }
        }

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set(
            "Kids",
            kids.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
        );
        pages.set("Count", Object::Integer(kids.len() as i64));
        merged.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", pages_id);
        let catalog_id = merged.add_object(catalog);
        merged.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        merged
            .save_to(&mut bytes)
            .map_err(|err| CoreError::Storage(format!("failed to write merged document: {err}")))?;

        tracing::info!(
            pages = kids.len(),
            inputs = inputs.len(),
            skipped = skipped.len(),
            "attachments consolidated"
        );
        Ok(MergedDocument {
            bytes,
            page_count: kids.len(),
            skipped,
        })
    }

    /// Fetches a submission's attachments and merges them.
    pub fn consolidate(
        blobs: &dyn BlobStore,
        submission: &Submission,
    ) -> Result<MergedDocument, CoreError> {
        let (inputs, mut unavailable) = collect_attachments(blobs, &submission.attachments);
        match Self::merge(&inputs) {
            Ok(mut merged) => {
                unavailable.append(&mut merged.skipped);
                merged.skipped = unavailable;
                Ok(merged)
            }
            Err(CoreError::NoMergeableContent { mut skipped }) => {
                unavailable.append(&mut skipped);
                Err(CoreError::NoMergeableContent {
                    skipped: unavailable,
                })
            }
            Err(err) => Err(err),
        }
    }
}

fn load(input: &AttachmentBlob) -> Option<Document> {
    // The parser can panic on some malformed inputs.
    let parsed = panic::catch_unwind(|| Document::load_mem(&input.bytes));
    let document = match parsed {
        Ok(Ok(document)) => document,
        Ok(Err(err)) => {
            tracing::warn!(file = %input.id, error = %err, "skipping unreadable attachment");
            return None;
        }
        Err(_) => {
            tracing::warn!(file = %input.id, "skipping attachment that crashed the parser");
            return None;
        }
    };
    if document.trailer.get(b"Encrypt").is_ok() {
        tracing::warn!(file = %input.id, "skipping encrypted attachment");
        return None;
    }
    if document.get_pages().is_empty() {
        tracing::warn!(file = %input.id, "skipping attachment without pages");
        return None;
    }
    Some(document)
}

/// Page dictionaries in page order, with inherited attributes copied down so
/// each page survives being re-parented.
fn flatten_pages(document: &Document) -> Vec<(ObjectId, Dictionary)> {
    document
        .get_pages()
        .into_values()
        .filter_map(|id| {
            let page = document.get_object(id).and_then(Object::as_dict).ok()?;
            let mut page = page.clone();
            for key in INHERITABLE {
                if page.get(key).is_err() {
                    if let Some(value) = inherited(document, &page, key) {
                        page.set(key.to_vec(), value);
                    }
                }
            }
            Some((id, page))
        })
        .collect()
}

fn inherited(document: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        let node = document.get_object(id).and_then(Object::as_dict).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Document-level structure is rebuilt for the merged output.
fn keeps_object(object: &Object) -> bool {
    let Object::Dictionary(dictionary) = object else {
        return true;
    };
    let kind = dictionary.get(b"Type").and_then(Object::as_name).ok();
    !matches!(
        kind,
        Some(b"Catalog") | Some(b"Pages") | Some(b"Page") | Some(b"Outlines") | Some(b"Outline")
    )
}
