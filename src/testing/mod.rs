//! Shared fixtures for unit tests.

use crate::schema::{SchemaDocument, SchemaRegistry};

/// A small blog-shaped schema exercising every registry feature: defaults,
/// enum domains, arrays, conditional rules, group rules, secondary indexes,
/// and a custom operation.
pub const SAMPLE_SCHEMA: &str = r#"
models:
  - name: Post
    fields:
      - { name: author_id, type: string, required: true }
      - { name: title, type: string, required: true }
      - { name: body, type: string }
      - { name: published, type: boolean, default: false }
      - { name: published_at, type: timestamp }
      - { name: tags, type: string, array: true }
      - { name: visibility, type: string, enum: [public, unlisted, private], default: public }
    rules:
      - { actor: owner, operations: [create, read, update, delete] }
      - actor: authenticated
        operations: [read]
        condition: { field: published, value: true }
      - { actor: { group: editors }, operations: [update] }
      - actor: public_key
        operations: [read]
        condition: { field: published, value: true }
    indexes:
      - { name: byAuthor, partition_key: author_id, sort_key: title }
      - { name: byPublished, partition_key: published, sort_key: published_at }

custom_types:
  - name: SearchSummary
    fields:
      - { name: total, type: integer, required: true }
      - { name: query, type: string, required: true }

operations:
  - name: searchPosts
    kind: query
    args:
      - { name: term, type: string, required: true }
      - { name: limit, type: integer, default: 10 }
    returns: { model: Post, list: true }
    handler: search_posts
    rules:
      - { actor: authenticated, operations: [read] }

  - name: summarizeSearch
    kind: query
    args:
      - { name: term, type: string, required: true }
    returns: { custom: SearchSummary }
    handler: summarize_search
    rules:
      - { actor: authenticated, operations: [read] }

  - name: purgeDrafts
    kind: mutation
    args: []
    returns: { custom: SearchSummary }
    handler: purge_drafts
    rules: []
"#;

pub fn sample_registry() -> SchemaRegistry {
    let doc = SchemaDocument::from_yaml(SAMPLE_SCHEMA).expect("sample schema parses");
    SchemaRegistry::register(doc).expect("sample schema registers")
}
