//! File-format collaborator (spec.md §6, §9 "Body-field reshaping"):
//! stringifies a document to its on-disk file form. The `$_body` convention
//! is a markdown-format detail, isolated here rather than in the store.

use crate::document::Document;
use docindex_common::{CollectionSchema, FieldType, Value};

/// Render `doc` (already body-wrapped under `$_body` where applicable) as
/// file bytes for the collection's declared format. Fields are rendered as
/// plain JSON scalars (not the internally-tagged `Value` encoding), since
/// the bridge's file content is a user-facing document, not this crate's
/// storage representation.
pub fn stringify(collection: &CollectionSchema, doc: &Document) -> String {
    match collection.format.as_str() {
        "md" => stringify_markdown(doc),
        _ => serde_json::to_string_pretty(&document_to_json(doc)).unwrap_or_default(),
    }
}

fn stringify_markdown(doc: &Document) -> String {
    let body = match doc.get(crate::document::BODY_KEY) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    let mut frontmatter = document_to_json(doc);
    if let serde_json::Value::Object(map) = &mut frontmatter {
        map.remove(crate::document::BODY_KEY);
    }
    let yaml = serde_json::to_string_pretty(&frontmatter).unwrap_or_default();
    format!("---\n{yaml}\n---\n{body}")
}

/// Parse a bridge file's raw contents into a `Document`, coercing each field
/// present in `raw` to its schema-declared type (spec.md §9 "Dynamic
/// payloads": the typed boundary lives at the schema, not inside the store).
/// Markdown-like formats carry the body under a `---` frontmatter fence
/// followed by the body text; other formats are parsed as plain JSON.
pub fn parse(collection: &CollectionSchema, raw: &str) -> Document {
    let (frontmatter, body) = match collection.format.as_str() {
        "md" => split_frontmatter(raw),
        _ => (raw.to_string(), None),
    };
    let parsed: serde_json::Value = serde_json::from_str(&frontmatter).unwrap_or(serde_json::Value::Null);
    let mut doc = json_to_document(collection, &parsed);
    if let Some(body) = body {
        doc.insert(crate::document::BODY_KEY, Value::String(body));
    }
    doc
}

fn split_frontmatter(raw: &str) -> (String, Option<String>) {
    let Some(rest) = raw.strip_prefix("---\n") else { return (raw.to_string(), None) };
    match rest.find("\n---\n") {
        Some(idx) => (rest[..idx].to_string(), Some(rest[idx + 5..].to_string())),
        None => (raw.to_string(), None),
    }
}

fn document_to_json(doc: &Document) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = doc.0.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect();
    serde_json::Value::Object(map)
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) | Value::DateTime(s) | Value::Reference(s) => serde_json::Value::String(s.clone()),
        Value::Number(n) => serde_json::json!(n),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => {
            serde_json::Value::Object(entries.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect())
        }
        Value::Null => serde_json::Value::Null,
    }
}

fn json_to_document(collection: &CollectionSchema, parsed: &serde_json::Value) -> Document {
    let mut doc = Document::new();
    let serde_json::Value::Object(map) = parsed else { return doc };
    for field in &collection.fields {
        if let Some(raw) = map.get(&field.name) {
            if let Some(value) = json_to_value(raw, field.field_type) {
                doc.insert(field.name.clone(), value);
            }
        }
    }
    if let Some(serde_json::Value::String(s)) = map.get(crate::document::TEMPLATE_KEY) {
        doc.insert(crate::document::TEMPLATE_KEY, Value::String(s.clone()));
    }
    doc
}

fn json_to_value(raw: &serde_json::Value, ty: FieldType) -> Option<Value> {
    match (raw, ty) {
        (serde_json::Value::String(s), FieldType::String) => Some(Value::String(s.clone())),
        (serde_json::Value::String(s), FieldType::DateTime) => Some(Value::DateTime(s.clone())),
        (serde_json::Value::String(s), FieldType::Reference) => Some(Value::Reference(s.clone())),
        (serde_json::Value::String(s), FieldType::RichText) => Some(Value::String(s.clone())),
        (serde_json::Value::Number(n), FieldType::Number) => n.as_f64().map(Value::Number),
        (serde_json::Value::Bool(b), FieldType::Bool) => Some(Value::Bool(*b)),
        (serde_json::Value::Array(items), FieldType::Object) => {
            Some(Value::List(items.iter().filter_map(|i| json_to_value(i, FieldType::Object)).collect()))
        }
        (serde_json::Value::Object(_), FieldType::Object) => Some(json_scalar_to_value(raw)),
        (serde_json::Value::Null, _) => Some(Value::Null),
        _ => None,
    }
}

fn json_scalar_to_value(raw: &serde_json::Value) -> Value {
    match raw {
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_scalar_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(map.iter().map(|(k, v)| (k.clone(), json_scalar_to_value(v))).collect()),
        serde_json::Value::Null => Value::Null,
    }
}

/// Whether `collection` is a union of templates (spec.md §6), requiring the
/// `_template` discriminator on every document.
pub fn requires_template(collection: &CollectionSchema) -> bool { collection.templated }

/// The last namespace segment of a document's matching template, annotated
/// onto `get` results as `_template` (spec.md §4.4).
pub fn template_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => s.rsplit('/').next().map(|s| s.to_string()),
        _ => None,
    }
}

/// Whether `field_type` belongs to a format that reshapes its body under
/// `$_body` (markdown-like formats only, per spec.md §9).
pub fn uses_body_reshaping(field_type: FieldType) -> bool { matches!(field_type, FieldType::RichText) }

#[cfg(test)]
mod tests {
    use super::*;
    use docindex_common::{CompositeIndexDecl, FieldDef};

    fn posts() -> CollectionSchema {
        CollectionSchema {
            name: "posts".into(),
            root_path: "content/posts".into(),
            format: "md".into(),
            fields: vec![FieldDef::new("title", FieldType::String)],
            composite_indexes: Vec::<CompositeIndexDecl>::new(),
            templated: false,
        }
    }

    #[test]
    fn markdown_stringify_wraps_body_under_frontmatter_fence() {
        let mut doc = Document::new();
        doc.insert("title", Value::String("Hello".into()));
        doc.insert(crate::document::BODY_KEY, Value::String("content here".into()));
        let rendered = stringify(&posts(), &doc);
        assert!(rendered.starts_with("---\n"));
        assert!(rendered.ends_with("content here"));
    }
}
