#![cfg(feature = "thumbnails")]
//! Thumbnail pipeline tests against generated documents

use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use pdfdeck::Error;
use pdfdeck::thumbs::Thumbnailer;

fn one_page_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("re", vec![100.into(), 100.into(), 200.into(), 200.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
    ]));

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
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

#[test]
fn renders_a_png_data_url() {
    let bytes: Arc<[u8]> = Arc::from(one_page_pdf());
    let mut thumbnailer = Thumbnailer::new();

    let url = thumbnailer.render_page_thumbnail(&bytes, 1, 0.4).unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
}

#[test]
fn repeated_requests_reuse_the_cached_result() {
    let bytes: Arc<[u8]> = Arc::from(one_page_pdf());
    let mut thumbnailer = Thumbnailer::new();

    let first = thumbnailer.render_page_thumbnail(&bytes, 1, 0.4).unwrap();
    let second = thumbnailer.render_page_thumbnail(&bytes, 1, 0.4).unwrap();
    assert_eq!(first, second);
}

#[test]
fn out_of_range_page_fails_without_poisoning_the_view() {
    let bytes: Arc<[u8]> = Arc::from(one_page_pdf());
    let mut thumbnailer = Thumbnailer::new();

    let result = thumbnailer.render_page_thumbnail(&bytes, 5, 0.4);
    assert!(matches!(result, Err(Error::Render { page: 5, .. })));

    // the cached view still serves valid pages
    assert!(thumbnailer.render_page_thumbnail(&bytes, 1, 0.4).is_ok());
}

#[test]
fn render_view_reports_page_count() {
    let bytes: Arc<[u8]> = Arc::from(one_page_pdf());
    let mut thumbnailer = Thumbnailer::new();

    let view = thumbnailer.get_render_view(&bytes).unwrap();
    assert_eq!(view.page_count(), 1);

    // the caller's buffer is untouched by the render handoff
    assert_eq!(&bytes[..], &one_page_pdf()[..]);
}
