use serde_json::{json, Map, Value};

use crate::store::Record;

/// Convert a record into the public wire format
/// { id, type, attributes, meta?, links }
pub fn record_to_api_value(record: &Record, model: &str, include_meta: bool) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), Value::String(record.id.to_string()));
    obj.insert("type".into(), Value::String(model.to_string()));
    obj.insert("attributes".into(), Value::Object(record.fields.clone()));

    if include_meta {
        obj.insert(
            "meta".into(),
            json!({
                "created_at": record.created_at.to_rfc3339(),
                "updated_at": record.updated_at.to_rfc3339(),
                "owner_id": record.owner_id,
            }),
        );
    }

    obj.insert(
        "links".into(),
        json!({ "self": format!("/api/data/{}/{}", model, record.id) }),
    );

    Value::Object(obj)
}

/// Convert a list of records to API values
pub fn records_to_api_values(records: &[Record], model: &str, include_meta: bool) -> Vec<Value> {
    records
        .iter()
        .map(|r| record_to_api_value(r, model, include_meta))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_format_carries_attributes_and_links() {
        let mut fields = Map::new();
        fields.insert("title".into(), json!("hello"));
        let record = Record::new(Some("user-1".into()), fields);

        let v = record_to_api_value(&record, "Post", false);
        assert_eq!(v["type"], json!("Post"));
        assert_eq!(v["attributes"]["title"], json!("hello"));
        assert_eq!(
            v["links"]["self"],
            json!(format!("/api/data/Post/{}", record.id))
        );
        assert!(v.get("meta").is_none());
    }

    #[test]
    fn meta_is_opt_in() {
        let record = Record::new(Some("user-1".into()), Map::new());
        let v = record_to_api_value(&record, "Post", true);
        assert_eq!(v["meta"]["owner_id"], json!("user-1"));
        assert!(v["meta"].get("created_at").is_some());
    }
}
