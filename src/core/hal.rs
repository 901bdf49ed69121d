// HAL envelope extraction and typed decoding shared by all collection endpoints.
use crate::core::error::{Error, ErrorKind};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Locate the embedded collection named `relation` inside a HAL document.
///
/// Collection responses arrive as `{"_embedded": {"<relation>": [...]}, ...}`.
/// Absence of `_embedded` (or a non-object value) is `MalformedEnvelope`;
/// absence of the relation key is `RelationNotFound`. An empty array is a
/// valid, empty collection, not an error. Elements are returned in server
/// order; nothing here re-sorts.
pub fn embedded<'a>(document: &'a Value, relation: &str) -> Result<&'a [Value], Error> {
    let embedded = document
        .get("_embedded")
        .ok_or_else(|| {
            Error::new(ErrorKind::MalformedEnvelope)
                .with_message("response has no _embedded object")
                .with_relation(relation)
        })?;
    if !embedded.is_object() {
        return Err(Error::new(ErrorKind::MalformedEnvelope)
            .with_message("_embedded is not an object")
            .with_relation(relation));
    }

    let collection = embedded.get(relation).ok_or_else(|| {
        Error::new(ErrorKind::RelationNotFound)
            .with_message("relation missing from _embedded")
            .with_relation(relation)
    })?;
    collection
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| {
            Error::new(ErrorKind::MalformedEnvelope)
                .with_message("relation value is not an array")
                .with_relation(relation)
        })
}

/// Decode one JSON value into a record, ignoring unknown fields.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, Error> {
    T::deserialize(value).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message(format!("failed to decode {}", type_label::<T>()))
            .with_source(err)
    })
}

/// Decode every element of `items` in order. The first failure aborts the
/// whole call (carrying the failing element's index); no partial results.
pub fn decode_all<T: DeserializeOwned>(items: &[Value]) -> Result<Vec<T>, Error> {
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        records.push(decode(item).map_err(|err| err.with_index(index))?);
    }
    Ok(records)
}

fn type_label<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_all, embedded};
    use crate::core::error::ErrorKind;
    use serde::Deserialize;
    use serde_json::json;
    use std::error::Error as StdError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        id: i64,
        #[serde(rename = "lastName")]
        last_name: String,
    }

    #[test]
    fn embedded_preserves_server_order() {
        let doc = json!({
            "_embedded": {
                "people": [
                    {"id": 3, "lastName": "Zed"},
                    {"id": 1, "lastName": "Adams"},
                    {"id": 2, "lastName": "Mori"}
                ]
            }
        });

        let items = embedded(&doc, "people").expect("items");
        let people: Vec<Person> = decode_all(items).expect("decode");
        let ids: Vec<i64> = people.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(people[0].last_name, "Zed");
    }

    #[test]
    fn missing_embedded_is_malformed_envelope() {
        let doc = json!({"foo": "bar"});
        let err = embedded(&doc, "people").expect_err("bare document");
        assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);
    }

    #[test]
    fn non_object_embedded_is_malformed_envelope() {
        let doc = json!({"_embedded": [1, 2, 3]});
        let err = embedded(&doc, "people").expect_err("array envelope");
        assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);
    }

    #[test]
    fn missing_relation_is_relation_not_found() {
        let doc = json!({"_embedded": {"others": []}});
        let err = embedded(&doc, "people").expect_err("foreign relation");
        assert_eq!(err.kind(), ErrorKind::RelationNotFound);
        assert_eq!(err.relation(), Some("people"));
    }

    #[test]
    fn non_array_relation_is_malformed_envelope() {
        let doc = json!({"_embedded": {"people": {"id": 1}}});
        let err = embedded(&doc, "people").expect_err("object relation");
        assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);
    }

    #[test]
    fn empty_relation_is_empty_collection() {
        let doc = json!({"_embedded": {"people": []}});
        let items = embedded(&doc, "people").expect("items");
        assert!(items.is_empty());
        let people: Vec<Person> = decode_all(items).expect("decode");
        assert!(people.is_empty());
    }

    #[test]
    fn extra_top_level_fields_are_ignored() {
        let doc = json!({
            "_embedded": {"people": [{"id": 1, "lastName": "Adams"}]},
            "_links": {"self": {"href": "http://x/people"}},
            "page": {"size": 20, "totalElements": 1}
        });

        let items = embedded(&doc, "people").expect("items");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let value = json!({
            "id": 9,
            "lastName": "Okafor",
            "_links": {"self": {"href": "http://x/people/9"}}
        });

        let person: Person = decode(&value).expect("person");
        assert_eq!(
            person,
            Person {
                id: 9,
                last_name: "Okafor".to_string()
            }
        );
    }

    #[test]
    fn decode_missing_field_names_type_and_field() {
        let value = json!({"id": 9});
        let err = decode::<Person>(&value).expect_err("partial person");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.message().expect("message").contains("Person"));
        let source = err.source().expect("source");
        assert!(source.to_string().contains("lastName"));
    }

    #[test]
    fn decode_all_is_all_or_nothing() {
        let items = [
            json!({"id": 1, "lastName": "Adams"}),
            json!({"id": "not-a-number", "lastName": "Zed"}),
            json!({"id": 3, "lastName": "Mori"}),
        ];

        let err = decode_all::<Person>(&items).expect_err("bad element");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.index(), Some(1));
    }
}
