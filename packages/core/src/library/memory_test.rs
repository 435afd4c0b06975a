//! Tests for the in-memory reference library

use super::*;
use crate::models::Creator;

fn sample_library() -> InMemoryLibrary {
    InMemoryLibrary::from_snapshot(LibrarySnapshot {
        items: vec![
            Item::new("ABCD1234", "Attention Is All You Need")
                .with_creator(Creator::author("Ashish", "Vaswani"))
                .with_abstract("The dominant sequence transduction models are based on recurrent networks")
                .with_tags(["transformers", "nlp"])
                .with_collection("COLL0001")
                .with_date("2017-06-12")
                .with_fulltext("We propose a new simple network architecture, the Transformer."),
            Item::new("EFGH5678", "Deep Residual Learning for Image Recognition")
                .with_creator(Creator::author("Kaiming", "He"))
                .with_abstract("Deeper neural networks are more difficult to train")
                .with_tags(["vision"])
                .with_date("2015-12-10"),
            Item::new("IJKL9012", "A Relational Model of Data for Large Shared Data Banks")
                .with_creator(Creator::author("Edgar", "Codd"))
                .with_date("1970"),
        ],
        collections: vec![
            Collection::new("COLL0001", "Machine Learning"),
            Collection::new("COLL0002", "Databases"),
        ],
    })
}

#[tokio::test]
async fn test_lookup_item_found_and_missing() {
    let library = sample_library();

    let item = library.lookup_item("ABCD1234").await.unwrap();
    assert_eq!(item.title, "Attention Is All You Need");

    let err = library.lookup_item("NOPE").await.unwrap_err();
    assert_eq!(err, LibraryError::item_not_found("NOPE"));
    assert_eq!(err.to_string(), "Item not found: NOPE");
}

#[tokio::test]
async fn test_search_matches_title_creator_and_abstract() {
    let library = sample_library();

    let by_title = library
        .search_library(SearchParams {
            q: Some("residual".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_title.results.len(), 1);
    assert_eq!(by_title.results[0].key, "EFGH5678");

    let by_creator = library
        .search_library(SearchParams {
            q: Some("codd".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_creator.results[0].key, "IJKL9012");

    let by_abstract = library
        .search_library(SearchParams {
            q: Some("recurrent".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_abstract.results[0].key, "ABCD1234");
}

#[tokio::test]
async fn test_search_filters_and_pagination() {
    let library = sample_library();

    let tagged = library
        .search_library(SearchParams {
            tag: Some("NLP".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(tagged.pagination.total, 1);

    let page = library
        .search_library(SearchParams {
            limit: Some(2),
            sort: Some(SortField::Title),
            direction: Some(SortDirection::Asc),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 3);
    assert!(page.pagination.has_more);
    assert_eq!(page.results[0].title, "A Relational Model of Data for Large Shared Data Banks");

    let rest = library
        .search_library(SearchParams {
            limit: Some(2),
            offset: Some(2),
            sort: Some(SortField::Title),
            direction: Some(SortDirection::Asc),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rest.results.len(), 1);
    assert!(!rest.pagination.has_more);
}

#[tokio::test]
async fn test_search_unknown_collection_fails() {
    let library = sample_library();
    let err = library
        .search_library(SearchParams {
            collection_key: Some("MISSING".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::CollectionNotFound { .. }));
}

#[tokio::test]
async fn test_extract_fulltext() {
    let library = sample_library();

    let text = library.extract_fulltext("ABCD1234").await.unwrap();
    assert!(text.contains("Transformer"));

    let err = library.extract_fulltext("EFGH5678").await.unwrap_err();
    assert_eq!(err, LibraryError::fulltext_unavailable("EFGH5678"));
}

#[tokio::test]
async fn test_semantic_search_ranks_by_overlap() {
    let library = sample_library();

    let hits = library
        .semantic_search("transformer network architecture", SemanticOptions::default())
        .await
        .unwrap();

    assert!(!hits.is_empty());
    assert_eq!(hits[0].item.key, "ABCD1234");
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_semantic_search_rejects_empty_query() {
    let library = sample_library();
    let err = library
        .semantic_search("  ", SemanticOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_mutations() {
    let library = sample_library();

    let note = library
        .mutate_library(MutationAction::CreateNote {
            parent_key: "EFGH5678".to_string(),
            content: "Skip connections".to_string(),
        })
        .await
        .unwrap();
    assert!(note.success);
    assert_eq!(note.action, "createNote");
    assert_eq!(note.key.len(), 8);
    assert_eq!(library.lookup_item("EFGH5678").await.unwrap().notes.len(), 1);

    let added = library
        .mutate_library(MutationAction::AddTags {
            item_key: "EFGH5678".to_string(),
            tags: vec!["resnet".to_string(), "vision".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(added.details["added"], serde_json::json!(["resnet"]));

    let removed = library
        .mutate_library(MutationAction::RemoveTags {
            item_key: "EFGH5678".to_string(),
            tags: vec!["vision".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(removed.details["removed"], 1);
    assert_eq!(
        library.lookup_item("EFGH5678").await.unwrap().tags,
        vec!["resnet".to_string()]
    );

    let err = library
        .mutate_library(MutationAction::AddTags {
            item_key: "MISSING".to_string(),
            tags: vec!["x".to_string()],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::ItemNotFound { .. }));
}

#[tokio::test]
async fn test_tag_edits_that_change_nothing_leave_item_untouched() {
    let library = sample_library();
    let before = library.lookup_item("ABCD1234").await.unwrap();

    let added = library
        .mutate_library(MutationAction::AddTags {
            item_key: "ABCD1234".to_string(),
            tags: vec!["nlp".to_string(), "  ".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(added.details["added"], serde_json::json!([]));

    let removed = library
        .mutate_library(MutationAction::RemoveTags {
            item_key: "ABCD1234".to_string(),
            tags: vec!["vision".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(removed.details["removed"], 0);

    let after = library.lookup_item("ABCD1234").await.unwrap();
    assert_eq!(after.date_modified, before.date_modified);
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_collections() {
    let library = sample_library();

    let collections = library.list_collections().await.unwrap();
    let names: Vec<&str> = collections.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Databases", "Machine Learning"]);

    let items = library.collection_items("COLL0001").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].key, "ABCD1234");

    assert!(library.collection_items("NOPE").await.is_err());
}

#[test]
fn test_snapshot_json_roundtrip_keeps_fulltext_private() {
    let json = r#"{
        "items": [{"key": "K1", "title": "T", "fulltext": "body text"}],
        "collections": []
    }"#;
    let library = InMemoryLibrary::from_json_str(json).unwrap();
    let item = tokio_test::block_on(library.lookup_item("K1")).unwrap();

    assert_eq!(item.fulltext.as_deref(), Some("body text"));
    let serialized = serde_json::to_value(&item).unwrap();
    assert!(serialized.get("fulltext").is_none());
    assert_eq!(serialized["itemType"], "journalArticle");
}
