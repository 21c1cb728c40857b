use crate::config::UpdateMode;
use crate::errors::StoreError;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A car record as clients see it. Documents are schemaless, so this is the
/// raw JSON object; `_id` is always rendered as a hex string.
pub type CarDoc = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// Fields `PATCH /car/:id` is allowed to write.
pub const MUTABLE_FIELDS: [&str; 8] = [
    "name",
    "sellerName",
    "sellerEmail",
    "subCategory",
    "price",
    "rating",
    "quantity",
    "description",
];

/// Store-generated car identifier. Parsing is the only way to build one from
/// client input, so malformed ids never reach a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId(ObjectId);

impl CarId {
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl FromStr for CarId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|_| StoreError::InvalidId(s.to_string()))
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubCategory {
    SportsCar,
    PoliceCar,
    FiretruckCar,
}

impl SubCategory {
    /// Literal tag stored in `subCategory`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SportsCar => "sports car",
            Self::PoliceCar => "police car",
            Self::FiretruckCar => "firetruck car",
        }
    }
}

/// The allow-listed subset of an update body, ready to be `$set`.
#[derive(Debug, Clone, PartialEq)]
pub struct CarPatch {
    fields: CarDoc,
}

impl CarPatch {
    pub fn from_body(body: &CarDoc, mode: UpdateMode) -> Self {
        let fields = MUTABLE_FIELDS
            .iter()
            .filter_map(|&key| match (body.get(key), mode) {
                (Some(value), _) => Some((key.to_string(), value.clone())),
                (None, UpdateMode::Replace) => Some((key.to_string(), Value::Null)),
                (None, UpdateMode::Partial) => None,
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &CarDoc {
        &self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> CarDoc {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn car_id_round_trips_through_hex() {
        let id = CarId::generate();
        let parsed: CarId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for bad in ["", "123", "not-an-object-id", "zzzzzzzzzzzzzzzzzzzzzzzz"] {
            assert!(matches!(bad.parse::<CarId>(), Err(StoreError::InvalidId(_))));
        }
    }

    #[test]
    fn partial_patch_keeps_only_present_allowed_fields() {
        let patch = CarPatch::from_body(
            &body(json!({ "name": "Falcon", "price": null, "color": "red", "_id": "x" })),
            UpdateMode::Partial,
        );
        assert_eq!(patch.fields(), &body(json!({ "name": "Falcon", "price": null })));
    }

    #[test]
    fn replace_patch_nulls_missing_allowed_fields() {
        let patch = CarPatch::from_body(&body(json!({ "rating": 4 })), UpdateMode::Replace);
        assert_eq!(patch.fields().len(), MUTABLE_FIELDS.len());
        assert_eq!(patch.fields()["rating"], json!(4));
        assert_eq!(patch.fields()["name"], Value::Null);
        assert!(!patch.fields().contains_key("color"));
    }

    #[test]
    fn outcomes_serialize_camel_case() {
        let out = serde_json::to_value(DeleteOutcome {
            acknowledged: true,
            deleted_count: 1,
        })
        .unwrap();
        assert_eq!(out, json!({ "acknowledged": true, "deletedCount": 1 }));
    }
}
