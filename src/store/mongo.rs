use super::{CarFilter, CarStore};
use crate::config::DbConfig;
use crate::errors::StoreError;
use crate::models::{
    CarDoc, CarId, CarPatch, DeleteOutcome, ID_FIELD, InsertOutcome, UpdateOutcome,
};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use serde_json::Value;

const NAME_INDEX: &str = "names";

pub struct MongoCarStore {
    client: Client,
    cars: Collection<Document>,
}

impl MongoCarStore {
    /// Builds the driver client. The driver connects lazily, so an unreachable
    /// server only shows up on the first operation (see `ping`).
    pub async fn connect(db: &DbConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(db.connection_uri()).await?;
        let cars = client
            .database(&db.database)
            .collection::<Document>(&db.collection);

        Ok(Self { client, cars })
    }
}

fn filter_doc(filter: &CarFilter) -> Document {
    match filter {
        CarFilter::SubCategory(category) => doc! { "subCategory": category.as_str() },
        CarFilter::SellerEmail(email) => doc! { "sellerEmail": email.as_str() },
        CarFilter::NameContains(needle) => doc! {
            "name": { "$regex": CarFilter::name_pattern(needle), "$options": "i" }
        },
    }
}

fn id_filter(id: CarId) -> Document {
    doc! { "_id": id.object_id() }
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a stored document as client JSON: relaxed extended JSON, with
/// `_id` flattened to its hex string.
fn to_car(mut document: Document) -> CarDoc {
    let id = document.remove(ID_FIELD);
    let mut car = match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => CarDoc::new(),
    };
    if let Some(id) = id {
        car.insert(ID_FIELD.to_string(), Value::String(id_to_string(&id)));
    }
    car
}

fn to_document(car: &CarDoc) -> Result<Document, StoreError> {
    Ok(bson::to_document(car)?)
}

#[async_trait]
impl CarStore for MongoCarStore {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn ensure_name_index(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().name(NAME_INDEX.to_string()).build())
            .build();
        let created = self.cars.create_index(index).await?;
        tracing::info!("[mongodb] index ready: {}", created.index_name);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.cars.count_documents(doc! {}).await?)
    }

    async fn list_by_price(&self, skip: u64, limit: u64) -> Result<Vec<CarDoc>, StoreError> {
        // the server rejects skip/limit values outside i64
        let skip = skip.min(i64::MAX as u64);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let docs: Vec<Document> = self
            .cars
            .find(doc! {})
            .sort(doc! { "price": 1 })
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok(docs.into_iter().map(to_car).collect())
    }

    async fn find(&self, filter: &CarFilter) -> Result<Vec<CarDoc>, StoreError> {
        let docs: Vec<Document> = self.cars.find(filter_doc(filter)).await?.try_collect().await?;
        Ok(docs.into_iter().map(to_car).collect())
    }

    async fn find_by_id(&self, id: CarId) -> Result<Option<CarDoc>, StoreError> {
        Ok(self.cars.find_one(id_filter(id)).await?.map(to_car))
    }

    async fn insert(&self, mut car: CarDoc) -> Result<InsertOutcome, StoreError> {
        car.remove(ID_FIELD);
        let result = self.cars.insert_one(to_document(&car)?).await?;

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id_to_string(&result.inserted_id),
        })
    }

    async fn upsert(&self, id: CarId, patch: &CarPatch) -> Result<UpdateOutcome, StoreError> {
        let update = doc! { "$set": to_document(patch.fields())? };
        let result = self
            .cars
            .update_one(id_filter(id), update)
            .upsert(true)
            .await?;

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id.as_ref().map(id_to_string),
        })
    }

    async fn delete(&self, id: CarId) -> Result<DeleteOutcome, StoreError> {
        let result = self.cars.delete_one(id_filter(id)).await?;
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("[mongodb] connection closed");
    }
}
