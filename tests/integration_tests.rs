//! Integration tests for Alexandria
//!
//! These tests drive the HTTP backend and the search session against a mock
//! service, covering the full search → parse → sort pipeline.

use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use alexandria::backend::{Backend, HttpBackend};
use alexandria::models::{SearchOutcome, SortKey, TopicKind};
use alexandria::parse::ParseOrchestrator;
use alexandria::session::{SearchSession, SessionPhase};
use alexandria::sort::sort_view;

fn backend_for(server: &mockito::ServerGuard) -> Arc<dyn Backend> {
    Arc::new(
        HttpBackend::new(&server.url(), Duration::from_secs(5))
            .expect("backend against mock server"),
    )
}

#[tokio::test]
async fn test_search_success_populates_results_and_parsed_map() {
    let mut server = mockito::Server::new_async().await;

    let search_mock = server
        .mock("POST", "/api/search")
        .match_body(Matcher::Json(json!({"query": "Bears"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "success",
                "query": "Bears",
                "page_title": "Bear",
                "citations": [
                    "Brunner, Bernd (2007). Bears: A Brief History. Yale University Press. ISBN 978-0-300-12299-2",
                    "Domico, Terry; Newman, Mark (1988). Bears of the World. Facts on File. ISBN 978-0-8160-1536-8"
                ],
                "count": 2
            })
            .to_string(),
        )
        .create_async()
        .await;

    let batch_mock = server
        .mock("POST", "/api/parse/batch")
        .match_body(Matcher::PartialJson(json!({
            "citations": [
                "Brunner, Bernd (2007). Bears: A Brief History. Yale University Press. ISBN 978-0-300-12299-2",
                "Domico, Terry; Newman, Mark (1988). Bears of the World. Facts on File. ISBN 978-0-8160-1536-8"
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [
                    {"title": "Bears: A Brief History", "authors": "Brunner, Bernd", "year": "2007", "isbn": "978-0-300-12299-2"},
                    {"title": "Bears of the World", "authors": "Domico, Terry; Newman, Mark", "year": "1988", "isbn": "978-0-8160-1536-8"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let session = SearchSession::new(backend_for(&server));
    session.search("Bears").await;

    let snapshot = session.snapshot();
    match &snapshot.phase {
        SessionPhase::Results(page) => {
            assert_eq!(page.page_title, "Bear");
            assert_eq!(page.len(), 2);
        }
        other => panic!("unexpected phase {:?}", other),
    }

    let parsed = snapshot.parsed.expect("batch parse ran");
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[&0].primary_title(), "Bears: A Brief History");
    assert_eq!(parsed[&1].year_value(), 1988);

    search_mock.assert_async().await;
    batch_mock.assert_async().await;
}

#[tokio::test]
async fn test_service_error_body_shown_verbatim() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/api/search")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({"error": "No page found for 'Xyzzy'"}).to_string())
        .create_async()
        .await;

    let session = SearchSession::new(backend_for(&server));
    session.search("Xyzzy").await;

    assert_eq!(
        session.snapshot().phase,
        SessionPhase::Error {
            message: "No page found for 'Xyzzy'".to_string()
        }
    );
}

#[tokio::test]
async fn test_disambiguation_selection_and_close() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/api/search")
        .match_body(Matcher::Json(json!({"query": "Mercury"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "disambiguation",
                "options": [
                    {"title": "Mercury (planet)", "display_text": "Mercury, the closest planet to the Sun"},
                    {"title": "Mercury (element)"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    server
        .mock("POST", "/api/search/page")
        .match_body(Matcher::Json(json!({"page_title": "Mercury (planet)"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "success",
                "query": "Mercury (planet)",
                "page_title": "Mercury (planet)",
                "citations": ["Strom, Robert (1987). Mercury: The Elusive Planet. Smithsonian. ISBN 978-0-87474-892-2"],
                "count": 1
            })
            .to_string(),
        )
        .create_async()
        .await;

    server
        .mock("POST", "/api/parse/batch")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"results": [{"title": "Mercury: The Elusive Planet", "year": "1987"}]})
                .to_string(),
        )
        .create_async()
        .await;

    let session = SearchSession::new(backend_for(&server));
    session.search("Mercury").await;

    match &session.snapshot().phase {
        SessionPhase::Ambiguous { kind, options } => {
            assert_eq!(*kind, TopicKind::Disambiguation);
            assert_eq!(options.len(), 2);
            assert_eq!(
                options[0].label(),
                "Mercury, the closest planet to the Sun"
            );
        }
        other => panic!("unexpected phase {:?}", other),
    }

    session.select_topic("Mercury (planet)").await;
    assert!(matches!(session.snapshot().phase, SessionPhase::Results(_)));

    // Closing after a disambiguation selection returns the session to idle
    // with every secondary field back at its default.
    session.close();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(snapshot.parsed.is_none());
    assert_eq!(snapshot.sort_key, SortKey::None);
    assert!(!snapshot.structured_view);
    assert!(snapshot.parse_error.is_none());
}

#[tokio::test]
async fn test_suggestions_status_maps_to_ambiguous() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/api/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "suggestions",
                "options": [{"title": "Bearss, Edwin"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let backend = backend_for(&server);
    let outcome = backend.search("Bears").await.unwrap();
    match outcome {
        SearchOutcome::Ambiguous { kind, options } => {
            assert_eq!(kind, TopicKind::Suggestions);
            assert_eq!(options[0].title, "Bearss, Edwin");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_parse_work_chapter_mapping_and_raw_fallback_sort() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/api/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "success",
                "query": "test",
                "page_title": "Test",
                "citations": ["A (2001)", "\"Ch\" in B (1999)"],
                "count": 2
            })
            .to_string(),
        )
        .create_async()
        .await;

    server
        .mock("POST", "/api/parse/batch")
        .match_body(Matcher::Json(json!({"citations": ["A (2001)", "\"Ch\" in B (1999)"]})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [
                    {"title": "A", "year": "2001"},
                    {"chapter_title": "Ch", "book_title": "B", "year": "1999"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let session = SearchSession::new(backend_for(&server));
    session.search("test").await;

    let snapshot = session.snapshot();
    let parsed = snapshot.parsed.expect("batch parse ran");
    assert!(!parsed[&0].is_chapter());
    assert!(parsed[&1].is_chapter());

    let page = match &snapshot.phase {
        SessionPhase::Results(page) => page,
        other => panic!("unexpected phase {:?}", other),
    };

    // With structured view off, the title sort falls back to the raw-text
    // heuristic: neither citation contains a period, so the whole strings
    // compare and the quoted one orders first.
    let raw_view = sort_view(&page.citations, Some(&parsed), false, SortKey::TitleAsc);
    let raw_order: Vec<usize> = raw_view.iter().map(|i| i.original_index).collect();
    assert_eq!(raw_order, vec![1, 0]);

    // With structured view on the structured titles decide: "A" before "Ch".
    let structured_view = sort_view(&page.citations, Some(&parsed), true, SortKey::TitleAsc);
    let structured_order: Vec<usize> =
        structured_view.iter().map(|i| i.original_index).collect();
    assert_eq!(structured_order, vec![0, 1]);
}

#[tokio::test]
async fn test_batch_failure_degrades_to_raw_results() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/api/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "success",
                "query": "Bears",
                "page_title": "Bear",
                "citations": ["c1", "c2"],
                "count": 2
            })
            .to_string(),
        )
        .create_async()
        .await;

    server
        .mock("POST", "/api/parse/batch")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(json!({"error": "batch parser rejected the request"}).to_string())
        .create_async()
        .await;

    let session = SearchSession::new(backend_for(&server));
    session.search("Bears").await;

    let snapshot = session.snapshot();
    assert!(matches!(snapshot.phase, SessionPhase::Results(_)));
    assert!(snapshot.parsed.is_none());
    assert_eq!(
        snapshot.parse_error.as_deref(),
        Some("batch parser rejected the request")
    );
}

#[tokio::test]
async fn test_per_item_requests_hit_format_specific_endpoints() {
    let mut server = mockito::Server::new_async().await;

    let chapter_citation =
        r#"Butrica, Andrew J. (1996). "Chapter 5". In To See the Unseen. ISBN 978-0-16-048578-7"#;
    let work_citation =
        "Brunner, Bernd (2007). Bears: A Brief History. Yale University Press. ISBN 978-0-300-12299-2";

    let chapter_mock = server
        .mock("POST", "/api/parse/chapter")
        .match_body(Matcher::Json(json!({"citation": chapter_citation})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "chapter_title": "Chapter 5",
                "book_title": "To See the Unseen",
                "chapter_authors": "Butrica, Andrew J.",
                "year": "1996"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let work_mock = server
        .mock("POST", "/api/parse/parenthetical-year")
        .match_body(Matcher::Json(json!({"citation": work_citation})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"title": "Bears: A Brief History", "authors": "Brunner, Bernd", "year": "2007"})
                .to_string(),
        )
        .create_async()
        .await;

    let orchestrator = ParseOrchestrator::new(backend_for(&server));
    let citations = vec![chapter_citation.to_string(), work_citation.to_string()];
    let map = orchestrator.parse_per_item(&citations).await;

    assert_eq!(map.len(), 2);
    assert!(map[&0].is_chapter());
    assert_eq!(map[&1].primary_title(), "Bears: A Brief History");

    chapter_mock.assert_async().await;
    work_mock.assert_async().await;
}

#[tokio::test]
async fn test_per_item_failure_leaves_other_indices_intact() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/api/parse/parenthetical-year")
        .match_body(Matcher::Json(json!({"citation": "Good, Author (2001). Fine Title."})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"title": "Fine Title", "year": "2001"}).to_string())
        .create_async()
        .await;

    server
        .mock("POST", "/api/parse/default")
        .with_status(500)
        .create_async()
        .await;

    let orchestrator = ParseOrchestrator::new(backend_for(&server));
    let citations = vec![
        "unparseable scribble".to_string(),
        "Good, Author (2001). Fine Title.".to_string(),
    ];
    let map = orchestrator.parse_per_item(&citations).await;

    assert_eq!(map.len(), 1);
    assert!(!map.contains_key(&0));
    assert_eq!(map[&1].primary_title(), "Fine Title");
}

#[tokio::test]
async fn test_empty_result_set_is_success_without_parse() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/api/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "success",
                "query": "Obscure",
                "page_title": "Obscure Topic",
                "citations": [],
                "count": 0
            })
            .to_string(),
        )
        .create_async()
        .await;

    // No batch mock: an empty result set must not reach the parse endpoint.
    let session = SearchSession::new(backend_for(&server));
    session.search("Obscure").await;

    let snapshot = session.snapshot();
    match &snapshot.phase {
        SessionPhase::Results(page) => assert!(page.is_empty()),
        other => panic!("unexpected phase {:?}", other),
    }
    assert!(snapshot.parsed.is_none());
}
