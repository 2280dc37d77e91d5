//! Registry behavior under concurrent writers and readers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use assetmill_core::{
    BasicMinifier, BundleKind, BundleRegistry, Dispatch, Error, EventKind, Passthrough,
    RegistryOptions, SkipReason,
};

const ICON_HELP: &str = "<svg viewBox=\"0 0 16 16\"><path d=\"M16 8A8 8 0 1 1 0 8a8 8 0 0 1 16 0zM5.496 6.033h.825c.138 0 .248-.113.266-.25.09-.656.54-1.134 1.342-1.134.686 0 1.314.343 1.314 1.168 0 .635-.374.927-.965 1.371-.673.489-1.206 1.06-1.168 1.987l.003.217a.25.25 0 0 0 .25.246h.811a.25.25 0 0 0 .25-.25v-.105c0-.718.273-.927 1.01-1.486.609-.463 1.244-.977 1.244-2.056 0-1.511-1.276-2.241-2.673-2.241-1.267 0-2.655.59-2.75 2.286zm1.557 5.763c0 .533.425.927 1.01.927.609 0 1.028-.394 1.028-.927 0-.552-.42-.94-1.029-.94-.584 0-1.009.388-1.009.94z\"/></svg>";

const CATALOG_MODULE: &str = "<section class=\"catalog-module\">\n<svg class=\"icon\" viewBox=\"0 0 16 16\"><path d=\"M11.377 13.212a1 1 0 0 1-1.414 0L8 11.249\"/></svg>\n<h2>Catalog</h2>\n</section>";

const CATALOG_ICON: &str = "<svg viewBox=\"0 0 16 16\"><path d=\"M1 1h6v6H1z\"/><path d=\"M9 1h6v6H9z\"/><path d=\"M1 9h6v6H1z\"/><path d=\"M9 9h3v3H9z\"/><path d=\"M11.377 13.212a1 1 0 0 1-1.414 0L8 11.249\"/></svg>";

fn registry() -> Arc<BundleRegistry> {
    Arc::new(BundleRegistry::new(
        RegistryOptions::default(),
        Arc::new(BasicMinifier),
    ))
}

fn text(registry: &BundleRegistry, kind: BundleKind) -> String {
    String::from_utf8(registry.snapshot(kind).unwrap().to_vec()).unwrap()
}

#[test]
fn readers_never_observe_a_torn_fragment() {
    let registry = registry();
    registry.register_icon("icon-help", ICON_HELP).unwrap();

    let paths: Vec<String> = (0..5)
        .map(|i| format!("modules/catalog{i}/catalog.html"))
        .collect();
    let seen = AtomicUsize::new(0);

    thread::scope(|scope| {
        for path in &paths {
            let registry = Arc::clone(&registry);
            scope.spawn(move || {
                for i in 0..100 {
                    let event = if i % 3 == 2 { EventKind::Remove } else { EventKind::Write };
                    registry
                        .apply_file_event(path, event, CATALOG_MODULE.as_bytes().to_vec())
                        .unwrap();
                }
            });
        }

        for _ in 0..4 {
            let registry = Arc::clone(&registry);
            let seen = &seen;
            scope.spawn(move || {
                for _ in 0..100 {
                    let html = text(&registry, BundleKind::Index);
                    if html.contains("catalog-module") {
                        seen.fetch_add(1, Ordering::Relaxed);
                        assert!(html.contains("M11.377 13.212"), "torn snapshot: {html}");
                    }
                    assert_eq!(html.matches("</html>").count(), 1);

                    let sprite = text(&registry, BundleKind::Sprite);
                    assert!(sprite.contains("id=\"icon-help\""));
                }
            });
        }
    });

    let body = registry.bundle(BundleKind::Index).identities();
    assert!(body.len() <= paths.len());
    let unique: std::collections::HashSet<_> = body.iter().collect();
    assert_eq!(unique.len(), body.len(), "duplicate identities: {body:?}");
}

#[test]
fn sprite_readers_never_observe_a_partial_symbol() {
    let registry = registry();
    let seen = AtomicUsize::new(0);

    thread::scope(|scope| {
        let writer = Arc::clone(&registry);
        scope.spawn(move || {
            for i in 0..100 {
                if i % 10 == 9 {
                    writer.reset_sprite();
                }
                for (id, svg) in [("icon-help", ICON_HELP), ("catalog-module", CATALOG_ICON)] {
                    match writer.register_icon(id, svg) {
                        Ok(()) | Err(Error::Sprite(_)) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            }
        });

        for _ in 0..4 {
            let registry = Arc::clone(&registry);
            let seen = &seen;
            scope.spawn(move || {
                for _ in 0..100 {
                    let sprite = text(&registry, BundleKind::Sprite);
                    if sprite.contains("catalog-module") {
                        seen.fetch_add(1, Ordering::Relaxed);
                        assert!(sprite.contains("M11.377 13.212"), "torn sprite: {sprite}");
                        assert!(sprite.matches("<path").count() >= 5);
                    }
                    assert_eq!(sprite.matches("<svg").count(), 1);
                }
            });
        }
    });

    let sprite = text(&registry, BundleKind::Sprite);
    assert!(sprite.contains("id=\"icon-help\""));
    assert!(sprite.contains("id=\"catalog-module\""));
    assert_eq!(registry.icon_count(), 2);
}

#[test]
fn concurrent_icon_registration_admits_one_winner() {
    let registry = registry();
    let winners = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let winners = &winners;
            scope.spawn(move || {
                match registry.register_icon("icon-help", ICON_HELP) {
                    Ok(()) => {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(Error::Sprite(_)) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
            });
        }
    });

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert_eq!(registry.bundle(BundleKind::Sprite).body_len(), 1);
    assert_eq!(text(&registry, BundleKind::Sprite).matches("<symbol").count(), 1);
}

#[test]
fn snapshot_is_cached_until_mutation() {
    let registry = registry();
    registry
        .apply_file_event("a.css", EventKind::Create, b".a { color: red; }".to_vec())
        .unwrap();

    let first = registry.snapshot(BundleKind::Style).unwrap();
    let second = registry.snapshot(BundleKind::Style).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    registry
        .apply_file_event("b.css", EventKind::Create, b".b { color: blue; }".to_vec())
        .unwrap();
    let third = registry.snapshot(BundleKind::Style).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(String::from_utf8_lossy(&third).contains(".b"));
}

#[test]
fn rename_leaves_content_in_place() {
    let registry = Arc::new(BundleRegistry::new(
        RegistryOptions::default(),
        Arc::new(Passthrough),
    ));
    registry
        .apply_file_event("old.css", EventKind::Create, b".same{}".to_vec())
        .unwrap();
    registry
        .apply_file_event("old.css", EventKind::Rename, Vec::new())
        .unwrap();
    // The create for the new name carries identical bytes, so the entry moves.
    registry
        .apply_file_event("new.css", EventKind::Create, b".same{}".to_vec())
        .unwrap();

    assert_eq!(
        registry.bundle(BundleKind::Style).identities(),
        vec!["new.css".to_string()]
    );
}

#[test]
fn complete_documents_and_outputs_are_ignored_end_to_end() {
    let registry = registry();
    let doc = "<!DOCTYPE html><html><head></head><body><p>whole page</p></body></html>";

    assert_eq!(
        registry
            .apply_file_event("pages/full.html", EventKind::Create, doc.as_bytes().to_vec())
            .unwrap(),
        Dispatch::Skipped(SkipReason::FullDocument)
    );
    assert_eq!(
        registry
            .apply_file_event("web/public/index.html", EventKind::Write, b"<p>x</p>".to_vec())
            .unwrap(),
        Dispatch::Skipped(SkipReason::OutputFile)
    );
    registry.inject_html("hello", "<p>hello</p>");

    let html = text(&registry, BundleKind::Index);
    assert_eq!(html.matches("<p>hello</p>").count(), 1);
    assert!(!html.contains("whole page"));
}
