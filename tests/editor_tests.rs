//! End-to-end tests for the page-tree editor: every operation runs against
//! small real PDFs and its output is reloaded and inspected.

use std::collections::BTreeSet;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use pdfdeck::editor::{
    PageSizeTarget, RangeSpec, RotationMap, delete_pages, merge, reorder_pages, resize_pages,
    rotate_pages, split,
};
use pdfdeck::{DocumentHandle, Error};

const PAGE_WIDTH: i64 = 612;

/// Build a PDF whose page `i` has MediaBox height `base_height + i`, so page
/// identity stays observable across transformations.
fn test_pdf(pages: u32, base_height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for i in 0..pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    0.into(),
                    0.into(),
                    PAGE_WIDTH.into(),
                    (base_height + i64::from(i)).into(),
                ]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(i64::from(pages))),
            ("Kids", Object::Array(kids)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn handle(bytes: Vec<u8>) -> DocumentHandle {
    DocumentHandle::load(bytes).unwrap()
}

/// MediaBox heights of every page, in page order.
fn page_heights(bytes: &[u8]) -> Vec<f64> {
    let loaded = handle(bytes.to_vec());
    (0..loaded.page_count())
        .map(|i| loaded.page_size(i).unwrap().1)
        .collect()
}

/// Decoded content stream of one page.
fn page_content_text(bytes: &[u8], page_index: usize) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().values().nth(page_index).unwrap();
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let stream_id = match page.get(b"Contents").unwrap() {
        Object::Reference(id) => *id,
        other => panic!("expected contents reference, got {other:?}"),
    };
    let stream = doc.get_object(stream_id).unwrap().as_stream().unwrap();
    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    String::from_utf8_lossy(&data).into_owned()
}

#[test]
fn merge_concatenates_all_pages_in_order() {
    let first = handle(test_pdf(2, 700));
    let second = handle(test_pdf(3, 800));

    let merged = merge(&[&first, &second]).unwrap();

    assert_eq!(
        page_heights(&merged),
        vec![700.0, 701.0, 800.0, 801.0, 802.0]
    );
    // sources stay valid and unchanged
    assert_eq!(first.page_count(), 2);
    assert_eq!(second.page_count(), 3);
}

#[test]
fn merge_rejects_empty_input() {
    assert!(matches!(merge(&[]), Err(Error::EmptyInput)));
}

#[test]
fn merge_tolerates_a_single_document() {
    let only = handle(test_pdf(2, 700));
    let rebuilt = merge(&[&only]).unwrap();
    assert_eq!(page_heights(&rebuilt), vec![700.0, 701.0]);
}

#[test]
fn split_extracts_inclusive_ranges() {
    let doc = handle(test_pdf(3, 700));
    let ranges = vec![RangeSpec::new(0, 0).unwrap(), RangeSpec::new(1, 2).unwrap()];

    let outputs = split(&doc, &ranges).unwrap();

    assert_eq!(outputs.len(), 2);
    assert_eq!(page_heights(&outputs[0]), vec![700.0]);
    assert_eq!(page_heights(&outputs[1]), vec![701.0, 702.0]);

    // concatenating the parts reconstructs the original page order
    let mut reconstructed = Vec::new();
    for output in &outputs {
        reconstructed.extend(page_heights(output));
    }
    assert_eq!(reconstructed, page_heights(doc.bytes()));
}

#[test]
fn split_rejects_out_of_bounds_range() {
    let doc = handle(test_pdf(3, 700));
    let ranges = vec![RangeSpec::new(1, 5).unwrap()];
    assert!(matches!(
        split(&doc, &ranges),
        Err(Error::InvalidRange { .. })
    ));
}

#[test]
fn split_rejects_empty_range_list() {
    let doc = handle(test_pdf(3, 700));
    assert!(matches!(
        split(&doc, &[]),
        Err(Error::InvalidRange { .. })
    ));
}

#[test]
fn delete_keeps_remaining_pages_in_order() {
    let doc = handle(test_pdf(3, 700));
    let edited = delete_pages(&doc, &BTreeSet::from([1])).unwrap();
    assert_eq!(page_heights(&edited), vec![700.0, 702.0]);
}

#[test]
fn delete_all_pages_fails() {
    let doc = handle(test_pdf(3, 700));
    let result = delete_pages(&doc, &BTreeSet::from([0, 1, 2]));
    assert!(matches!(result, Err(Error::AllPagesDeleted { .. })));
}

#[test]
fn delete_rejects_out_of_range_index() {
    let doc = handle(test_pdf(3, 700));
    let result = delete_pages(&doc, &BTreeSet::from([5]));
    assert!(matches!(result, Err(Error::PageIndex { .. })));
}

#[test]
fn reorder_moves_pages() {
    let doc = handle(test_pdf(3, 700));
    let reordered = reorder_pages(&doc, &[2, 0, 1]).unwrap();
    assert_eq!(page_heights(&reordered), vec![702.0, 700.0, 701.0]);
}

#[test]
fn reorder_rejects_length_mismatch() {
    let doc = handle(test_pdf(3, 700));
    assert!(matches!(
        reorder_pages(&doc, &[0, 1]),
        Err(Error::OrderLength { .. })
    ));
}

#[test]
fn reorder_duplicates_produce_duplicate_pages() {
    let doc = handle(test_pdf(3, 700));
    let reordered = reorder_pages(&doc, &[0, 0, 1]).unwrap();
    assert_eq!(page_heights(&reordered), vec![700.0, 700.0, 701.0]);
}

#[test]
fn rotate_is_additive_and_round_trips() {
    let doc = handle(test_pdf(2, 700));

    let mut quarter = RotationMap::new();
    quarter.set(0, 90);
    let rotated = handle(rotate_pages(&doc, &quarter).unwrap());
    assert_eq!(rotated.page_rotation(0).unwrap(), 90);
    assert_eq!(rotated.page_rotation(1).unwrap(), 0);

    let mut back = RotationMap::new();
    back.set(0, 270);
    let restored = handle(rotate_pages(&rotated, &back).unwrap());
    assert_eq!(restored.page_rotation(0).unwrap(), 0);
}

#[test]
fn rotate_ignores_indices_beyond_page_count() {
    let doc = handle(test_pdf(2, 700));
    let mut rotations = RotationMap::new();
    rotations.set(99, 90);
    let rotated = handle(rotate_pages(&doc, &rotations).unwrap());
    assert_eq!(rotated.page_count(), 2);
    assert_eq!(rotated.page_rotation(0).unwrap(), 0);
}

#[test]
fn resize_sets_target_box_and_embeds_content() {
    let doc = handle(test_pdf(2, 700));
    let a4 = PageSizeTarget::new(595.28, 841.89);

    let resized = handle(resize_pages(&doc, a4, None).unwrap());

    for page in 0..resized.page_count() {
        let (width, height) = resized.page_size(page).unwrap();
        assert!((width - 595.28).abs() < 0.01);
        assert!((height - 841.89).abs() < 0.01);
    }
    let content = page_content_text(resized.bytes(), 0);
    assert!(content.contains("/Pg Do"), "content was: {content}");
    assert!(content.contains("1 1 1 rg"), "content was: {content}");
}

#[test]
fn resize_never_upscales_embedded_content() {
    // original pages are 612 pt wide; A4 is narrower, so content shrinks
    let doc = handle(test_pdf(1, 792));
    let a4 = PageSizeTarget::new(595.28, 841.89);

    let resized = resize_pages(&doc, a4, None).unwrap();
    let content = page_content_text(&resized, 0);
    let cm_line = content
        .lines()
        .find(|line| line.trim_end().ends_with(" cm"))
        .expect("embed transform present");
    let scale: f64 = cm_line.split_whitespace().next().unwrap().parse().unwrap();
    assert!(scale > 0.0 && scale <= 1.0, "scale was {scale}");
}

#[test]
fn resize_targets_only_selected_pages() {
    let doc = handle(test_pdf(2, 700));
    let a4 = PageSizeTarget::new(595.28, 841.89);

    let resized = resize_pages(&doc, a4, Some(&BTreeSet::from([0]))).unwrap();

    let heights = page_heights(&resized);
    assert!((heights[0] - 841.89).abs() < 0.01);
    assert_eq!(heights[1], 701.0);
}

#[test]
fn resize_rejects_out_of_range_target() {
    let doc = handle(test_pdf(2, 700));
    let a4 = PageSizeTarget::new(595.28, 841.89);
    let result = resize_pages(&doc, a4, Some(&BTreeSet::from([9])));
    assert!(matches!(result, Err(Error::PageIndex { .. })));
}

#[test]
fn source_bytes_stay_untouched_after_edits() {
    let original = test_pdf(3, 700);
    let doc = handle(original.clone());

    let _ = delete_pages(&doc, &BTreeSet::from([0])).unwrap();
    let _ = rotate_pages(&doc, &RotationMap::new()).unwrap();

    assert_eq!(&doc.bytes()[..], &original[..]);
    assert_eq!(doc.page_count(), 3);
}

#[test]
fn save_bytes_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let doc = handle(test_pdf(2, 700));
    let edited = delete_pages(&doc, &BTreeSet::from([0])).unwrap();

    let path = pdfdeck::export::derive_output_name(&dir.path().join("report.pdf"), "_edited");
    pdfdeck::export::save_bytes(&path, &edited).unwrap();

    let reloaded = std::fs::read(&path).unwrap();
    assert_eq!(page_heights(&reloaded), vec![701.0]);
}

#[test]
fn handle_accessors_validate_page_index() {
    let doc = handle(test_pdf(2, 700));
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.page_size(1).unwrap(), (612.0, 701.0));
    assert!(matches!(doc.page_size(2), Err(Error::PageIndex { .. })));
    assert!(matches!(
        doc.page_rotation(9),
        Err(Error::PageIndex { .. })
    ));
}
