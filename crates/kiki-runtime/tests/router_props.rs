//! Property tests for route resolution.

use kiki_runtime::router::{Resolution, Router, extract_params};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Home,
    Lesson,
    Quiz,
    Apps,
    App,
    Teacher,
    NotFound,
}

fn app_router() -> Router<Route> {
    Router::with_routes([
        ("/", Route::Home),
        ("/lesson/:id", Route::Lesson),
        ("/quiz/:id", Route::Quiz),
        ("/apps", Route::Apps),
        ("/apps/:appId", Route::App),
        ("/teacher", Route::Teacher),
        ("/404", Route::NotFound),
    ])
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

proptest! {
    #[test]
    fn lesson_paths_bind_id(id in segment()) {
        let path = format!("/lesson/{id}");
        match app_router().resolve(&path) {
            Resolution::Matched { handler, params, .. } => {
                prop_assert_eq!(handler, Route::Lesson);
                prop_assert_eq!(params.get("id"), Some(id.as_str()));
            }
            Resolution::Unmatched => prop_assert!(false, "unmatched {}", path),
        }
    }

    #[test]
    fn extra_segments_fall_to_not_found(a in segment(), b in segment()) {
        let path = format!("/lesson/{a}/{b}");
        match app_router().resolve(&path) {
            Resolution::Matched { handler, params, .. } => {
                prop_assert_eq!(handler, Route::NotFound);
                prop_assert!(params.is_empty());
            }
            Resolution::Unmatched => prop_assert!(false, "unmatched {}", path),
        }
    }

    #[test]
    fn every_path_resolves_when_not_found_exists(parts in proptest::collection::vec(segment(), 0..5)) {
        let path = format!("/{}", parts.join("/"));
        prop_assert!(app_router().resolve(&path).is_matched());
    }

    #[test]
    fn extract_params_agrees_with_segment_count(parts in proptest::collection::vec(segment(), 1..4)) {
        let path = format!("/{}", parts.join("/"));
        let bound = extract_params("/apps/:appId", &path);
        let expected = parts.len() == 2 && parts[0] == "apps";
        prop_assert_eq!(bound.is_some(), expected);
    }
}

#[test]
fn literal_routes_win_over_parameters() {
    let router = app_router();
    assert!(matches!(
        router.resolve("/apps"),
        Resolution::Matched { handler: Route::Apps, .. }
    ));
    assert!(matches!(
        router.resolve("/teacher"),
        Resolution::Matched { handler: Route::Teacher, .. }
    ));
    assert!(matches!(
        router.resolve("/"),
        Resolution::Matched { handler: Route::Home, .. }
    ));
    assert!(matches!(
        router.resolve("/apps/story"),
        Resolution::Matched { handler: Route::App, .. }
    ));
    assert!(matches!(
        router.resolve("/quiz/3"),
        Resolution::Matched { handler: Route::Quiz, .. }
    ));
}
