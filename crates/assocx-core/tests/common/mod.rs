use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

use assocx_core::{
    AssocError, BelongsTo, Catalog, CascadePolicy, DocumentStore, MemoryStore, Record,
    RecordType, RemovalAction, Result,
};

/// Blog catalog used across the integration tests
///
/// - `User { name }`
/// - `Blog { title, owner -> User }`
/// - `Post { title, author -> User, blog -> Blog, subject -> polymorphic }`
/// - `Tag { label }`
#[allow(dead_code)]
pub fn blog_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .register(RecordType::builder("User").attribute("name").build())
        .unwrap();
    catalog
        .register(
            RecordType::builder("Blog")
                .attribute("title")
                .belongs_to(BelongsTo::new("owner").class_name("User"))
                .unwrap()
                .build(),
        )
        .unwrap();
    catalog
        .register(
            RecordType::builder("Post")
                .attribute("title")
                .belongs_to(BelongsTo::new("author").class_name("User"))
                .unwrap()
                .belongs_to(BelongsTo::new("blog"))
                .unwrap()
                .belongs_to(BelongsTo::new("subject").polymorphic())
                .unwrap()
                .build(),
        )
        .unwrap();
    catalog
        .register(RecordType::builder("Tag").attribute("label").build())
        .unwrap();
    catalog.validate().unwrap();
    catalog
}

/// A `Post` type whose references carry the given cascade policies
///
/// Registered together with `User`, `Blog` and `Tag` (no cascades of their
/// own). Declaration order is `author`, `blog`, `subject`.
#[allow(dead_code)]
pub fn cascade_catalog(author: CascadePolicy, blog: CascadePolicy, subject: CascadePolicy) -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .register(RecordType::builder("User").attribute("name").build())
        .unwrap();
    catalog
        .register(RecordType::builder("Blog").attribute("title").build())
        .unwrap();
    catalog
        .register(RecordType::builder("Tag").attribute("label").build())
        .unwrap();
    catalog
        .register(
            RecordType::builder("Post")
                .attribute("title")
                .belongs_to(BelongsTo::new("author").class_name("User").dependent(author))
                .unwrap()
                .belongs_to(BelongsTo::new("blog").dependent(blog))
                .unwrap()
                .belongs_to(BelongsTo::new("subject").polymorphic().dependent(subject))
                .unwrap()
                .build(),
        )
        .unwrap();
    catalog
}

/// Create and save a record of `type_name` with the given id
#[allow(dead_code)]
pub fn insert(store: &MemoryStore, type_name: &str, id: &str) -> Record {
    let record_type = store.catalog().require(type_name).unwrap().clone();
    let record = Record::with_id(&record_type, id);
    store.save(&record);
    record
}

/// Create and save a `Post` pointing at the given ids
#[allow(dead_code)]
pub fn insert_post(
    store: &MemoryStore,
    id: &str,
    author_id: Option<&str>,
    blog_id: Option<&str>,
    subject_id: Option<&str>,
) -> Record {
    let post_type = store.catalog().require("Post").unwrap().clone();
    let mut post = Record::with_id(&post_type, id);
    if let Some(author_id) = author_id {
        post.write_attribute("author_id", author_id).unwrap();
    }
    if let Some(blog_id) = blog_id {
        post.write_attribute("blog_id", blog_id).unwrap();
    }
    if let Some(subject_id) = subject_id {
        post.write_attribute("subject_id", subject_id).unwrap();
    }
    store.save(&post);
    post
}

/// Store wrapper that records removals and can be told to fail some of them
///
/// Lookups delegate to the inner `MemoryStore`. Removals are recorded as
/// `(action, id)` before being delegated, and fail with `AssocError::Store`
/// for ids registered through `fail_removal_of`.
#[allow(dead_code)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    removals: RefCell<Vec<(RemovalAction, String)>>,
    failing: RefCell<HashSet<String>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            removals: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
        }
    }

    pub fn fail_removal_of(&self, id: &str) {
        self.failing.borrow_mut().insert(id.to_string());
    }

    pub fn removals(&self) -> Vec<(RemovalAction, String)> {
        self.removals.borrow().clone()
    }
}

impl DocumentStore for RecordingStore {
    fn find_by_id(
        &self,
        record_type: &Arc<RecordType>,
        id: Option<&str>,
        quiet: bool,
    ) -> Result<Option<Record>> {
        self.inner.find_by_id(record_type, id, quiet)
    }

    fn load_polymorphic(&self, id: Option<&str>) -> Result<Option<Record>> {
        self.inner.load_polymorphic(id)
    }

    fn remove(&self, target: &Record, action: RemovalAction) -> Result<()> {
        self.removals
            .borrow_mut()
            .push((action, target.id().to_string()));
        if self.failing.borrow().contains(target.id()) {
            return Err(AssocError::Store {
                message: format!("removal of {} refused", target.id()),
            });
        }
        self.inner.remove(target, action)
    }
}
