#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use assocx_core::logging_facility::test_capture::init_test_capture;
use assocx_core::{
    AssocError, AssociationResolver, BelongsTo, CascadePolicy, Catalog, MemoryStore, RecordType,
    RemovalAction,
};
use common::{cascade_catalog, insert, insert_post, RecordingStore};

use assocx_core::CascadePolicy::{
    Delete, Destroy, None as Keep, RestrictWithError, RestrictWithException,
};
use serde_json::json;

#[test]
fn test_destroy_cascade_removes_target() {
    // GIVEN a post that destroys its blog
    let store = MemoryStore::new(Arc::new(cascade_catalog(Keep, Destroy, Keep)));
    insert(&store, "Blog", "b1");
    let mut post = insert_post(&store, "p1", None, Some("b1"), None);

    // WHEN the post is destroyed
    store.destroy(&mut post).unwrap();

    // THEN both documents are gone
    assert!(!store.contains("p1"));
    assert!(!store.contains("b1"));
    assert_eq!(store.stats().destroys, 2);
}

#[test]
fn test_delete_cascade_removes_polymorphic_target() {
    // GIVEN a post that deletes its polymorphic subject
    let store = MemoryStore::new(Arc::new(cascade_catalog(Keep, Keep, Delete)));
    insert(&store, "Tag", "t1");
    let mut post = insert_post(&store, "p1", None, None, Some("t1"));

    // WHEN the post is destroyed
    store.destroy(&mut post).unwrap();

    // THEN the subject was deleted, not destroyed
    assert!(!store.contains("t1"));
    assert_eq!(store.stats().deletes, 1);
    assert_eq!(store.stats().destroys, 1);
}

#[test]
fn test_absent_target_is_skipped() {
    // GIVEN a post with destructive cascades but no referenced records
    let catalog = Arc::new(cascade_catalog(Destroy, Delete, Destroy));
    let store = RecordingStore::new(MemoryStore::new(Arc::clone(&catalog)));
    let mut post = insert_post(&store.inner, "p1", None, Some("missing"), None);

    // WHEN its associations are destroyed
    let result = AssociationResolver::new(&catalog, &store).destroy_associations(&mut post);

    // THEN nothing is removed and no error is raised
    assert!(result.is_ok());
    assert!(store.removals().is_empty());
}

#[test]
fn test_none_policy_leaves_target_alone() {
    // GIVEN a post with no cascades
    let store = MemoryStore::new(Arc::new(cascade_catalog(Keep, Keep, Keep)));
    insert(&store, "User", "u1");
    insert(&store, "Blog", "b1");
    let mut post = insert_post(&store, "p1", Some("u1"), Some("b1"), None);

    // WHEN the post is destroyed
    store.destroy(&mut post).unwrap();

    // THEN its targets survive and were never looked up
    assert!(store.contains("u1"));
    assert!(store.contains("b1"));
    assert_eq!(store.stats().lookups(), 0);
}

#[test]
fn test_restrict_with_exception_blocks_destroy() {
    // GIVEN a post restricted by its author
    let store = MemoryStore::new(Arc::new(cascade_catalog(RestrictWithException, Keep, Keep)));
    insert(&store, "User", "u1");
    let mut post = insert_post(&store, "p1", Some("u1"), None, None);

    // WHEN the post is destroyed
    let result = store.destroy(&mut post);

    // THEN it fails naming owner type, reference and owner id
    match result {
        Err(AssocError::RecordExists {
            owner_type,
            association,
            owner_id,
        }) => {
            assert_eq!(owner_type, "Post");
            assert_eq!(association, "author");
            assert_eq!(owner_id, "p1");
        }
        other => panic!("expected RecordExists, got {:?}", other),
    }

    // AND the post and its author are still stored
    assert!(store.contains("p1"));
    assert!(store.contains("u1"));
}

#[test]
fn test_restrict_does_not_roll_back_earlier_cascades() {
    // GIVEN a post whose first reference deletes and whose second restricts
    let mut catalog = Catalog::new();
    catalog
        .register(RecordType::builder("User").build())
        .unwrap();
    catalog.register(RecordType::builder("Blog").build()).unwrap();
    catalog
        .register(
            RecordType::builder("Post")
                .belongs_to(BelongsTo::new("blog").dependent(Delete))
                .unwrap()
                .belongs_to(
                    BelongsTo::new("author")
                        .class_name("User")
                        .dependent(RestrictWithException),
                )
                .unwrap()
                .build(),
        )
        .unwrap();
    let store = MemoryStore::new(Arc::new(catalog));
    insert(&store, "Blog", "b1");
    insert(&store, "User", "u1");
    let post_type = store.catalog().require("Post").unwrap().clone();
    let mut post = assocx_core::Record::with_id(&post_type, "p1");
    post.assign_attributes([("blog_id", json!("b1")), ("author_id", json!("u1"))])
        .unwrap();
    store.save(&post);

    // WHEN the post is destroyed
    let result = store.destroy(&mut post);

    // THEN the restriction fires after the blog was already deleted
    assert!(matches!(result, Err(AssocError::RecordExists { .. })));
    assert!(!store.contains("b1"));
    assert!(store.contains("p1"));
}

#[test]
fn test_restrict_with_error_is_a_logged_no_op() {
    // GIVEN a post whose author is restrict_with_error
    let capture = init_test_capture();
    let store = MemoryStore::new(Arc::new(cascade_catalog(RestrictWithError, Keep, Keep)));
    insert(&store, "User", "u1");
    let mut post = insert_post(&store, "p-restrict-with-error", Some("u1"), None, None);

    // WHEN the post is destroyed
    let result = store.destroy(&mut post);

    // THEN it succeeds, the author survives and a warning was logged
    assert!(result.is_ok());
    assert!(store.contains("u1"));
    let warned = capture.count_events(|e| {
        e.level == tracing::Level::WARN && e.field("record_id") == Some("p-restrict-with-error")
    });
    assert_eq!(warned, 1);
}

#[test]
fn test_cascades_run_in_declaration_order() {
    // GIVEN a post deleting author, blog and subject
    let catalog = Arc::new(cascade_catalog(Delete, Delete, Delete));
    let store = RecordingStore::new(MemoryStore::new(Arc::clone(&catalog)));
    insert(&store.inner, "User", "u1");
    insert(&store.inner, "Blog", "b1");
    insert(&store.inner, "Tag", "t1");
    let mut post = insert_post(&store.inner, "p1", Some("u1"), Some("b1"), Some("t1"));

    // WHEN its associations are destroyed
    AssociationResolver::new(&catalog, &store)
        .destroy_associations(&mut post)
        .unwrap();

    // THEN removals follow declaration order
    let ids: Vec<_> = store.removals().into_iter().map(|(_, id)| id).collect();
    assert_eq!(ids, vec!["u1", "b1", "t1"]);
}

#[test]
fn test_store_failure_propagates_without_rollback() {
    // GIVEN a post deleting author and blog, where the blog removal fails
    let catalog = Arc::new(cascade_catalog(Delete, Delete, Keep));
    let store = RecordingStore::new(MemoryStore::new(Arc::clone(&catalog)));
    insert(&store.inner, "User", "u1");
    insert(&store.inner, "Blog", "b1");
    let mut post = insert_post(&store.inner, "p1", Some("u1"), Some("b1"), None);
    store.fail_removal_of("b1");

    // WHEN its associations are destroyed
    let result = AssociationResolver::new(&catalog, &store).destroy_associations(&mut post);

    // THEN the store error surfaces as-is and the author stays deleted
    assert!(matches!(result, Err(AssocError::Store { .. })));
    assert!(!store.inner.contains("u1"));
    assert!(store.inner.contains("b1"));
    assert_eq!(
        store.removals(),
        vec![
            (RemovalAction::Delete, "u1".to_string()),
            (RemovalAction::Delete, "b1".to_string())
        ]
    );
}

/// Comment -> Post (destroy) -> Blog (destroy)
fn chain_catalog(post_policy: CascadePolicy) -> Catalog {
    let mut catalog = Catalog::new();
    catalog.register(RecordType::builder("Blog").build()).unwrap();
    catalog
        .register(
            RecordType::builder("Post")
                .belongs_to(BelongsTo::new("blog").dependent(Destroy))
                .unwrap()
                .build(),
        )
        .unwrap();
    catalog
        .register(
            RecordType::builder("Comment")
                .belongs_to(BelongsTo::new("post").dependent(post_policy))
                .unwrap()
                .build(),
        )
        .unwrap();
    catalog
}

fn insert_chain(store: &MemoryStore) -> assocx_core::Record {
    insert(store, "Blog", "b1");
    let post_type = store.catalog().require("Post").unwrap().clone();
    let mut post = assocx_core::Record::with_id(&post_type, "p1");
    post.write_attribute("blog_id", "b1").unwrap();
    store.save(&post);
    let comment_type = store.catalog().require("Comment").unwrap().clone();
    let mut comment = assocx_core::Record::with_id(&comment_type, "c1");
    comment.write_attribute("post_id", "p1").unwrap();
    store.save(&comment);
    comment
}

#[test]
fn test_destroy_recurses_into_target_cascades() {
    // GIVEN comment -> post -> blog, all with destroy
    let store = MemoryStore::new(Arc::new(chain_catalog(Destroy)));
    let mut comment = insert_chain(&store);

    // WHEN the comment is destroyed
    store.destroy(&mut comment).unwrap();

    // THEN the whole chain is gone
    assert!(store.is_empty());
}

#[test]
fn test_delete_does_not_recurse() {
    // GIVEN comment -> post (delete) -> blog (destroy)
    let store = MemoryStore::new(Arc::new(chain_catalog(Delete)));
    let mut comment = insert_chain(&store);

    // WHEN the comment is destroyed
    store.destroy(&mut comment).unwrap();

    // THEN the post is deleted but its blog survives
    assert!(!store.contains("c1"));
    assert!(!store.contains("p1"));
    assert!(store.contains("b1"));
}

#[test]
fn test_delete_on_store_skips_cascades() {
    // GIVEN a post that destroys its blog
    let store = MemoryStore::new(Arc::new(cascade_catalog(Keep, Destroy, Keep)));
    insert(&store, "Blog", "b1");
    let post = insert_post(&store, "p1", None, Some("b1"), None);

    // WHEN the post is deleted rather than destroyed
    store.delete(&post).unwrap();

    // THEN the blog survives
    assert!(!store.contains("p1"));
    assert!(store.contains("b1"));
}

/// Post -> Blog (destroy); Blog -> Tag banner (delete), then -> User owner
/// (restrict_with_exception)
fn restricted_chain_store(streamed: bool) -> (MemoryStore, assocx_core::Record) {
    let mut catalog = Catalog::new();
    catalog.register(RecordType::builder("User").build()).unwrap();
    catalog.register(RecordType::builder("Tag").build()).unwrap();
    catalog
        .register(
            RecordType::builder("Blog")
                .belongs_to(BelongsTo::new("banner").class_name("Tag").dependent(Delete))
                .unwrap()
                .belongs_to(
                    BelongsTo::new("owner")
                        .class_name("User")
                        .dependent(RestrictWithException),
                )
                .unwrap()
                .build(),
        )
        .unwrap();
    catalog
        .register(
            RecordType::builder("Post")
                .belongs_to(BelongsTo::new("blog").dependent(Destroy))
                .unwrap()
                .build(),
        )
        .unwrap();
    let store = MemoryStore::new(Arc::new(catalog)).with_streamed_removal(streamed);
    insert(&store, "User", "u1");
    insert(&store, "Tag", "t1");

    let blog_type = store.catalog().require("Blog").unwrap().clone();
    let mut blog = assocx_core::Record::with_id(&blog_type, "b1");
    blog.assign_attributes([("banner_id", json!("t1")), ("owner_id", json!("u1"))])
        .unwrap();
    store.save(&blog);

    let post_type = store.catalog().require("Post").unwrap().clone();
    let mut post = assocx_core::Record::with_id(&post_type, "p1");
    post.write_attribute("blog_id", "b1").unwrap();
    store.save(&post);
    (store, post)
}

#[test]
fn test_streamed_removal_is_preferred() {
    // GIVEN a store offering streamed removal and a post destroying its blog
    let store = MemoryStore::new(Arc::new(cascade_catalog(Keep, Destroy, Keep)))
        .with_streamed_removal(true);
    insert(&store, "Blog", "b1");
    let mut post = insert_post(&store, "p1", None, Some("b1"), None);

    // WHEN the post is destroyed
    store.destroy(&mut post).unwrap();

    // THEN the blog went through the streamed path
    assert!(!store.contains("b1"));
    assert_eq!(store.stats().streamed_removals, 1);
}

#[test]
fn test_streamed_removal_restores_on_failure() {
    // GIVEN a streaming store where the blog deletes its banner, then is restricted
    let (store, mut post) = restricted_chain_store(true);

    // WHEN the post is destroyed
    let result = store.destroy(&mut post);

    // THEN the restriction surfaces
    assert!(matches!(
        result,
        Err(AssocError::RecordExists { ref owner_type, .. }) if owner_type == "Blog"
    ));

    // AND the banner deleted inside the streamed removal is back
    assert!(store.contains("t1"));
    assert_eq!(store.len(), 4);
}

#[test]
fn test_plain_removal_keeps_partial_work() {
    // GIVEN the same chain on a store without streamed removal
    let (store, mut post) = restricted_chain_store(false);

    // WHEN the post is destroyed
    let result = store.destroy(&mut post);

    // THEN the restriction surfaces and the banner stays deleted
    assert!(matches!(result, Err(AssocError::RecordExists { .. })));
    assert!(!store.contains("t1"));
    assert_eq!(store.len(), 3);
}

/// Node -> Node parent (destroy)
fn node_store() -> MemoryStore {
    let mut catalog = Catalog::new();
    catalog
        .register(
            RecordType::builder("Node")
                .belongs_to(BelongsTo::new("parent").class_name("Node").dependent(Destroy))
                .unwrap()
                .build(),
        )
        .unwrap();
    MemoryStore::new(Arc::new(catalog))
}

fn insert_node(store: &MemoryStore, id: &str, parent: &str) -> assocx_core::Record {
    let node_type = store.catalog().require("Node").unwrap().clone();
    let mut node = assocx_core::Record::with_id(&node_type, id);
    node.write_attribute("parent_id", parent).unwrap();
    store.save(&node);
    node
}

#[test]
fn test_self_referencing_destroy_terminates() {
    // GIVEN a node that is its own parent
    let store = node_store();
    let mut node = insert_node(&store, "n1", "n1");

    // WHEN the node is destroyed
    let result = store.destroy(&mut node);

    // THEN it is removed exactly once
    assert!(result.is_ok());
    assert!(store.is_empty());
    assert_eq!(store.stats().destroys, 1);
}

#[test]
fn test_destroy_cycle_between_two_records_terminates() {
    // GIVEN two nodes that are each other's parent
    let store = node_store();
    let mut first = insert_node(&store, "n1", "n2");
    insert_node(&store, "n2", "n1");

    // WHEN the first node is destroyed
    let result = store.destroy(&mut first);

    // THEN both are removed once
    assert!(result.is_ok());
    assert!(store.is_empty());
    assert_eq!(store.stats().destroys, 2);
}

#[test]
fn test_destroy_cycle_can_run_again_after_completion() {
    // GIVEN a self-referencing node that was already destroyed
    let store = node_store();
    let mut first = insert_node(&store, "n1", "n1");
    store.destroy(&mut first).unwrap();

    // WHEN a node with the same id is saved and destroyed again
    let mut again = insert_node(&store, "n1", "n1");
    store.destroy(&mut again).unwrap();

    // THEN the second destroy also removed it
    assert!(store.is_empty());
    assert_eq!(store.stats().destroys, 2);
}

#[test]
fn test_destroy_unsaved_record_keeps_targets() {
    // GIVEN a post that destroys its blog but was never saved
    let store = MemoryStore::new(Arc::new(cascade_catalog(Keep, Destroy, Keep)));
    insert(&store, "Blog", "b1");
    let post_type = store.catalog().require("Post").unwrap().clone();
    let mut post = assocx_core::Record::with_id(&post_type, "p-unsaved");
    post.write_attribute("blog_id", "b1").unwrap();

    // WHEN the post is destroyed
    let result = store.destroy(&mut post);

    // THEN it fails before any cascade runs
    assert!(matches!(result, Err(AssocError::RecordNotFound { .. })));
    assert!(store.contains("b1"));
    assert_eq!(store.stats().destroys, 0);
    assert_eq!(store.stats().lookups(), 0);
}
