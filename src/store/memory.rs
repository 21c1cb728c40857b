use super::{CarFilter, CarStore};
use crate::errors::StoreError;
use crate::models::{
    CarDoc, CarId, CarPatch, DeleteOutcome, ID_FIELD, InsertOutcome, UpdateOutcome,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ordered_float::OrderedFloat;
use regex::RegexBuilder;
use serde_json::Value;
use std::sync::Arc;

/// In-process store with the same query semantics as the MongoDB backend.
/// Used for local runs (`STORE_BACKEND=memory`) and tests.
#[derive(Clone, Default)]
pub struct MemoryCarStore {
    inner: Arc<DashMap<CarId, CarDoc>>,
}

/// Sort key mirroring the document store's cross-type ordering:
/// missing/null, then numbers, then strings, then everything else.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PriceKey {
    Missing,
    Number(OrderedFloat<f64>),
    Text(String),
    Other,
}

impl PriceKey {
    fn of(car: &CarDoc) -> Self {
        match car.get("price") {
            None | Some(Value::Null) => Self::Missing,
            Some(Value::Number(n)) => n
                .as_f64()
                .map_or(Self::Other, |f| Self::Number(OrderedFloat(f))),
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(_) => Self::Other,
        }
    }
}

impl MemoryCarStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_id(id: CarId, car: &CarDoc) -> CarDoc {
        let mut out = car.clone();
        out.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        out
    }

    /// Snapshot of every document in id order, which is insertion order for
    /// generated ids.
    fn snapshot(&self) -> Vec<(CarId, CarDoc)> {
        let mut all: Vec<_> = self
            .inner
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }
}

#[async_trait]
impl CarStore for MemoryCarStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_name_index(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.len() as u64)
    }

    async fn list_by_price(&self, skip: u64, limit: u64) -> Result<Vec<CarDoc>, StoreError> {
        let mut all = self.snapshot();
        // stable sort keeps id order among equal prices
        all.sort_by_cached_key(|(_, car)| PriceKey::of(car));

        Ok(all
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(id, car)| Self::with_id(id, &car))
            .collect())
    }

    async fn find(&self, filter: &CarFilter) -> Result<Vec<CarDoc>, StoreError> {
        let matches: Box<dyn Fn(&CarDoc) -> bool + Send> = match filter {
            CarFilter::SubCategory(category) => {
                let tag = category.as_str();
                Box::new(move |car| car.get("subCategory").and_then(Value::as_str) == Some(tag))
            }
            CarFilter::SellerEmail(email) => {
                let email = email.clone();
                Box::new(move |car| {
                    car.get("sellerEmail").and_then(Value::as_str) == Some(email.as_str())
                })
            }
            CarFilter::NameContains(needle) => {
                let re = RegexBuilder::new(&CarFilter::name_pattern(needle))
                    .case_insensitive(true)
                    .build()?;
                Box::new(move |car| {
                    car.get("name")
                        .and_then(Value::as_str)
                        .is_some_and(|name| re.is_match(name))
                })
            }
        };

        Ok(self
            .snapshot()
            .into_iter()
            .filter(|(_, car)| matches(car))
            .map(|(id, car)| Self::with_id(id, &car))
            .collect())
    }

    async fn find_by_id(&self, id: CarId) -> Result<Option<CarDoc>, StoreError> {
        Ok(self.inner.get(&id).map(|r| Self::with_id(id, r.value())))
    }

    async fn insert(&self, mut car: CarDoc) -> Result<InsertOutcome, StoreError> {
        car.remove(ID_FIELD);
        let id = CarId::generate();
        self.inner.insert(id, car);

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id.to_string(),
        })
    }

    async fn upsert(&self, id: CarId, patch: &CarPatch) -> Result<UpdateOutcome, StoreError> {
        let outcome = match self.inner.entry(id) {
            Entry::Occupied(mut entry) => {
                let car = entry.get_mut();
                let mut modified = false;
                for (key, value) in patch.fields() {
                    if car.get(key) != Some(value) {
                        car.insert(key.clone(), value.clone());
                        modified = true;
                    }
                }
                UpdateOutcome {
                    acknowledged: true,
                    matched_count: 1,
                    modified_count: u64::from(modified),
                    upserted_count: 0,
                    upserted_id: None,
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(patch.fields().clone());
                UpdateOutcome {
                    acknowledged: true,
                    matched_count: 0,
                    modified_count: 0,
                    upserted_count: 1,
                    upserted_id: Some(id.to_string()),
                }
            }
        };
        Ok(outcome)
    }

    async fn delete(&self, id: CarId) -> Result<DeleteOutcome, StoreError> {
        let removed = self.inner.remove(&id).is_some();
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: u64::from(removed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateMode;
    use crate::models::SubCategory;
    use serde_json::json;

    fn car(v: Value) -> CarDoc {
        v.as_object().cloned().unwrap()
    }

    async fn seeded(cars: Vec<Value>) -> (MemoryCarStore, Vec<CarId>) {
        let store = MemoryCarStore::new();
        let mut ids = Vec::new();
        for c in cars {
            let out = store.insert(car(c)).await.unwrap();
            ids.push(out.inserted_id.parse().unwrap());
        }
        (store, ids)
    }

    fn names(cars: &[CarDoc]) -> Vec<&str> {
        cars.iter().map(|c| c["name"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let (store, ids) = seeded(vec![json!({ "name": "Falcon", "price": "19.99", "extra": [1, 2] })]).await;
        let found = store.find_by_id(ids[0]).await.unwrap().unwrap();
        assert_eq!(found["name"], json!("Falcon"));
        assert_eq!(found["price"], json!("19.99"));
        assert_eq!(found["extra"], json!([1, 2]));
        assert_eq!(found["_id"], json!(ids[0].to_string()));
    }

    #[tokio::test]
    async fn client_supplied_id_is_ignored() {
        let (store, ids) = seeded(vec![json!({ "_id": "mine", "name": "A" })]).await;
        let found = store.find_by_id(ids[0]).await.unwrap().unwrap();
        assert_eq!(found["_id"], json!(ids[0].to_string()));
    }

    #[tokio::test]
    async fn listing_orders_by_price_across_types() {
        let (store, _) = seeded(vec![
            json!({ "name": "text-b", "price": "9" }),
            json!({ "name": "num-10", "price": 10 }),
            json!({ "name": "none" }),
            json!({ "name": "num-2.5", "price": 2.5 }),
            json!({ "name": "text-a", "price": "19.99" }),
        ])
        .await;

        let page = store.list_by_price(0, 20).await.unwrap();
        assert_eq!(names(&page), ["none", "num-2.5", "num-10", "text-a", "text-b"]);
    }

    #[tokio::test]
    async fn listing_skips_and_limits() {
        let cars = (0..25).map(|i| json!({ "name": format!("car-{i:02}"), "price": i })).collect();
        let (store, _) = seeded(cars).await;

        assert_eq!(store.list_by_price(0, 20).await.unwrap().len(), 20);
        let second = store.list_by_price(20, 20).await.unwrap();
        assert_eq!(names(&second), ["car-20", "car-21", "car-22", "car-23", "car-24"]);
        assert!(store.list_by_price(40, 20).await.unwrap().is_empty());
        assert!(store.list_by_price(u64::MAX, 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_filter_is_exact() {
        let (store, _) = seeded(vec![
            json!({ "name": "A", "subCategory": "sports car" }),
            json!({ "name": "B", "subCategory": "police car" }),
            json!({ "name": "C", "subCategory": "Sports Car" }),
            json!({ "name": "D", "subCategory": "sports car" }),
        ])
        .await;

        let sports = store.find(&CarFilter::SubCategory(SubCategory::SportsCar)).await.unwrap();
        assert_eq!(names(&sports), ["A", "D"]);
        let fire = store.find(&CarFilter::SubCategory(SubCategory::FiretruckCar)).await.unwrap();
        assert!(fire.is_empty());
    }

    #[tokio::test]
    async fn seller_email_is_case_sensitive() {
        let (store, _) = seeded(vec![
            json!({ "name": "A", "sellerEmail": "a@b.com" }),
            json!({ "name": "B", "sellerEmail": "A@B.com" }),
        ])
        .await;
        let mine = store.find(&CarFilter::SellerEmail("a@b.com".into())).await.unwrap();
        assert_eq!(names(&mine), ["A"]);
    }

    #[tokio::test]
    async fn name_search_is_case_insensitive_and_literal() {
        let (store, _) = seeded(vec![
            json!({ "name": "Red Racer" }),
            json!({ "name": "Blue Bolt" }),
            json!({ "name": "Mr. T" }),
            json!({ "name": 12 }),
        ])
        .await;

        let red = store.find(&CarFilter::NameContains("red".into())).await.unwrap();
        assert_eq!(names(&red), ["Red Racer"]);
        assert!(store.find(&CarFilter::NameContains("green".into())).await.unwrap().is_empty());
        // "." must not act as a wildcard
        assert!(store.find(&CarFilter::NameContains("d.R".into())).await.unwrap().is_empty());
        let dotted = store.find(&CarFilter::NameContains("r. t".into())).await.unwrap();
        assert_eq!(names(&dotted), ["Mr. T"]);
        assert!(store.find(&CarFilter::NameContains(".*".into())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_updates_allowed_fields_only() {
        let (store, ids) = seeded(vec![json!({ "name": "Old", "color": "red", "rating": 3 })]).await;
        let body = car(json!({ "name": "New", "color": "blue" }));
        let out = store
            .upsert(ids[0], &CarPatch::from_body(&body, UpdateMode::Partial))
            .await
            .unwrap();
        assert_eq!((out.matched_count, out.modified_count, out.upserted_count), (1, 1, 0));

        let found = store.find_by_id(ids[0]).await.unwrap().unwrap();
        assert_eq!(found["name"], json!("New"));
        assert_eq!(found["color"], json!("red"));
        assert_eq!(found["rating"], json!(3));
    }

    #[tokio::test]
    async fn replace_mode_nulls_missing_fields() {
        let (store, ids) = seeded(vec![json!({ "name": "Old", "rating": 3 })]).await;
        let body = car(json!({ "name": "New" }));
        store
            .upsert(ids[0], &CarPatch::from_body(&body, UpdateMode::Replace))
            .await
            .unwrap();
        let found = store.find_by_id(ids[0]).await.unwrap().unwrap();
        assert_eq!(found["rating"], Value::Null);
    }

    #[tokio::test]
    async fn unchanged_upsert_reports_no_modification() {
        let (store, ids) = seeded(vec![json!({ "name": "Same" })]).await;
        let patch = CarPatch::from_body(&car(json!({ "name": "Same" })), UpdateMode::Partial);
        let out = store.upsert(ids[0], &patch).await.unwrap();
        assert_eq!((out.matched_count, out.modified_count), (1, 0));
    }

    #[tokio::test]
    async fn upsert_creates_missing_document() {
        let store = MemoryCarStore::new();
        let id = CarId::generate();
        let patch = CarPatch::from_body(&car(json!({ "name": "Ghost" })), UpdateMode::Partial);
        let out = store.upsert(id, &patch).await.unwrap();
        assert_eq!(out.upserted_id, Some(id.to_string()));
        assert_eq!(out.upserted_count, 1);
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap()["name"], json!("Ghost"));
    }

    #[tokio::test]
    async fn delete_reports_count() {
        let (store, ids) = seeded(vec![json!({ "name": "Gone" })]).await;
        assert_eq!(store.delete(ids[0]).await.unwrap().deleted_count, 1);
        assert_eq!(store.delete(ids[0]).await.unwrap().deleted_count, 0);
        assert!(store.find_by_id(ids[0]).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
