//! End-to-end tests: JSON outline documents queried through the public API.

use chrono::{DateTime, TimeZone, Utc};
use outline_query::filter::{explain_with, parse_query, EvalContext, FilterEvaluator};
use outline_query::{saved_searches, Outline, OutlineDocument, OutlineNode};

const DOCUMENT: &str = r#"{
  "nodes": [
    {
      "id": "home",
      "text": "Home",
      "attributes": { "type": "area" },
      "created_at": "2025-01-01T00:00:00Z",
      "children": [
        {
          "id": "garden",
          "text": "Garden project",
          "attributes": { "type": "project", "status": "active" },
          "created_at": "2025-10-01T08:00:00Z",
          "children": [
            {
              "id": "seeds",
              "text": "Order seeds, see [[supplier]]",
              "tags": ["errand"],
              "attributes": { "status": "done", "due": "2025-10-15" },
              "created_at": "2025-10-02T08:00:00Z",
              "modified_at": "2025-10-20T08:00:00Z"
            },
            {
              "id": "fence",
              "text": "Fix fence",
              "attributes": { "status": "todo", "due": "2025-11-20" },
              "created_at": "2025-11-08T08:00:00Z",
              "children": [
                {
                  "id": "posts",
                  "text": "Buy posts",
                  "tags": ["Errand"],
                  "attributes": { "status": "done" },
                  "created_at": "2025-11-09T08:00:00Z"
                }
              ]
            }
          ]
        }
      ]
    },
    {
      "id": "supplier",
      "text": "Supplier contacts",
      "created_at": "2025-03-01T00:00:00Z"
    },
    {
      "id": "views",
      "text": "Views",
      "created_at": "2025-01-01T00:00:00Z",
      "children": [
        {
          "id": "errands",
          "text": "All errands",
          "attributes": { "search": "tag:errand -@status=done" },
          "created_at": "2025-01-01T00:00:00Z"
        },
        {
          "id": "finished",
          "text": "Finished work",
          "attributes": { "search": "@status=done a:(@type=project)" },
          "created_at": "2025-01-01T00:00:00Z"
        }
      ]
    }
  ]
}"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap()
}

fn outline() -> Outline {
    let document: OutlineDocument = serde_json::from_str(DOCUMENT).unwrap();
    Outline::from_document(&document).unwrap()
}

fn search(outline: &Outline, query: &str) -> Vec<String> {
    let filter = parse_query(query).unwrap();
    FilterEvaluator::new(&filter, EvalContext::new(now()))
        .find_matches(outline.roots())
        .iter()
        .map(|n| n.id().to_string())
        .collect()
}

#[test]
fn test_done_items_under_projects() {
    let outline = outline();
    assert_eq!(
        search(&outline, "@status=done a:(@type=project)"),
        ["seeds", "posts"]
    );
}

#[test]
fn test_open_items_with_subtasks() {
    let outline = outline();
    assert_eq!(search(&outline, "@status=todo -children:0"), ["fence"]);
}

#[test]
fn test_direct_children_of_project() {
    let outline = outline();
    assert_eq!(search(&outline, "p:(@type=project)"), ["seeds", "fence"]);
    assert_eq!(search(&outline, "d:2"), ["seeds", "fence"]);
}

#[test]
fn test_overdue_and_upcoming() {
    let outline = outline();
    assert_eq!(search(&outline, "@due<today"), ["seeds"]);
    assert_eq!(search(&outline, "@due>today @due<=+2w"), ["fence"]);
}

#[test]
fn test_recently_created() {
    let outline = outline();
    assert_eq!(search(&outline, "c:>=-7d"), ["fence", "posts"]);
    assert_eq!(search(&outline, "m:2025-10-20"), ["seeds"]);
}

#[test]
fn test_references_and_tags() {
    let outline = outline();
    assert_eq!(search(&outline, "ref:supplier"), ["seeds"]);
    assert_eq!(search(&outline, "tag:errand"), ["seeds", "posts"]);
    assert_eq!(search(&outline, "supplier"), ["seeds", "supplier"]);
}

#[test]
fn test_alternatives_and_grouping() {
    let outline = outline();
    assert_eq!(search(&outline, "fence | seeds"), ["seeds", "fence"]);
    assert_eq!(search(&outline, "(fence | seeds) @status=todo"), ["fence"]);
    assert_eq!(search(&outline, "fence | seeds @status=todo"), ["fence"]);
}

#[test]
fn test_saved_searches_materialize() {
    let outline = outline();
    let context = EvalContext::new(now());
    let searches = saved_searches(&outline);
    assert_eq!(searches.len(), 2);

    let results: Vec<Vec<&str>> = searches
        .iter()
        .map(|s| {
            s.materialize(&outline, &context)
                .unwrap()
                .into_iter()
                .map(|n| n.data().id.as_str())
                .collect()
        })
        .collect();

    // `errands` finds nothing: both errands are done.
    assert!(results[0].is_empty());
    assert_eq!(results[1], ["seeds", "posts"]);
}

#[test]
fn test_explain_matches_every_node() {
    let outline = outline();
    let context = EvalContext::new(now());
    let filter = parse_query("a:(@type=project) (@status=done | -children:0)").unwrap();

    for node in outline.iter() {
        let explanation = explain_with(&filter, node, &context);
        assert_eq!(explanation.matched, filter.matches(node, &context));
    }
}

#[test]
fn test_printed_query_selects_same_nodes() {
    let outline = outline();
    for query in [
        "@status=done a:(@type=project)",
        "-(fence | seeds) d:>1",
        "ref:[[supplier]] | tag:#errand",
        "@due<today",
    ] {
        let printed = parse_query(query).unwrap().to_string();
        assert_eq!(search(&outline, query), search(&outline, &printed), "{printed}");
    }
}
