//! # Data-access component
//!
//! `DataStore` owns the only MongoDB handle in the process and is the only
//! code that touches the driver. It translates the five logical item
//! operations into collection calls, stringifies the internal record
//! identifier on the way out (via [`ItemRecord`](crate::models::ItemRecord)
//! conversion at the boundary), and classifies driver failures into the
//! [`ApiError`] taxonomy.
//!
//! Connection state is an explicit two-state lifecycle: every operation
//! resolves the session exactly once at entry and fails with
//! `ApiError::NotConnected` while disconnected. The lock is never held across
//! an await; `Client` and `Collection` handles are cheap clones.

use std::sync::RwLock;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use rocket::futures::TryStreamExt;

use crate::config::Settings;
use crate::errors::ApiError;
use crate::models::{ItemDocument, NewItem, UpdateItem};

/// Fixed records inserted on first-ever connection against an empty
/// collection.
const SAMPLE_ITEMS: [(i64, &str, &str); 5] = [
    (1, "John", "Doe"),
    (2, "Jane", "Smith"),
    (3, "Peter", "Jones"),
    (4, "Emily", "Williams"),
    (5, "Michael", "Brown"),
];

#[derive(Clone)]
struct Session {
    client: Client,
    items: Collection<ItemDocument>,
}

enum ConnState {
    Disconnected,
    Connected(Session),
}

pub struct DataStore {
    settings: Settings,
    state: RwLock<ConnState>,
}

impl DataStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: RwLock::new(ConnState::Disconnected),
        }
    }

    /// Establishes the connection, verifies reachability with a ping, ensures
    /// the unique index on `ID`, and seeds the sample records when the
    /// collection is empty. On any failure the store stays disconnected and
    /// subsequent operations report `NotConnected`.
    pub async fn connect(&self) -> Result<(), ApiError> {
        let mut options = ClientOptions::parse(self.settings.mongo_uri()).await?;
        options.server_selection_timeout = Some(Duration::from_secs(5));
        let client = Client::with_options(options)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        let items = client
            .database(&self.settings.db_name)
            .collection::<ItemDocument>(&self.settings.collection_name);

        let index = IndexModel::builder()
            .keys(doc! { "ID": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        items.create_index(index).await?;

        if items.count_documents(doc! {}).await? == 0 {
            log::info!(
                "collection {:?} is empty, seeding {} sample items",
                self.settings.collection_name,
                SAMPLE_ITEMS.len()
            );
            let samples = SAMPLE_ITEMS.map(|(item_id, first_name, last_name)| ItemDocument {
                oid: None,
                item_id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            });
            items.insert_many(samples).await?;
        }

        log::info!("connected to mongodb database {:?}", self.settings.db_name);

        if let Ok(mut state) = self.state.write() {
            *state = ConnState::Connected(Session { client, items });
        }
        Ok(())
    }

    /// Releases the connection. A no-op when never connected.
    pub async fn disconnect(&self) {
        let previous = match self.state.write() {
            Ok(mut state) => std::mem::replace(&mut *state, ConnState::Disconnected),
            Err(_) => return,
        };

        if let ConnState::Connected(session) = previous {
            session.client.shutdown().await;
            log::info!("mongodb connection closed");
        }
    }

    fn session(&self) -> Result<Session, ApiError> {
        match self.state.read() {
            Ok(state) => match &*state {
                ConnState::Connected(session) => Ok(session.clone()),
                ConnState::Disconnected => Err(ApiError::NotConnected),
            },
            Err(_) => Err(ApiError::NotConnected),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<ItemDocument>, ApiError> {
        let session = self.session()?;

        let mut cursor = session.items.find(doc! {}).await?;
        let mut items = Vec::new();
        while let Some(item) = cursor.try_next().await? {
            items.push(item);
        }
        Ok(items)
    }

    pub async fn get_by_id(&self, item_id: i64) -> Result<Option<ItemDocument>, ApiError> {
        let session = self.session()?;
        Ok(session.items.find_one(doc! { "ID": item_id }).await?)
    }

    /// Inserts a new item and returns it as stored, internal identifier
    /// included. A uniqueness-constraint violation on `ID` is reported as
    /// `DuplicateId`, distinct from any other write failure.
    pub async fn create(&self, new_item: &NewItem) -> Result<ItemDocument, ApiError> {
        let session = self.session()?;

        let inserted_id = match session.items.insert_one(new_item.to_document()).await {
            Ok(result) => result.inserted_id,
            Err(err) if is_duplicate_key(&err) => {
                return Err(ApiError::DuplicateId(new_item.item_id));
            }
            Err(err) => return Err(err.into()),
        };

        session
            .items
            .find_one(doc! { "_id": inserted_id })
            .await?
            .ok_or_else(|| ApiError::Store("inserted item vanished before read-back".to_string()))
    }

    /// Applies only the supplied fields. An empty patch returns the current
    /// record unchanged; `None` means no record has the given `ID`.
    pub async fn update(
        &self,
        item_id: i64,
        patch: &UpdateItem,
    ) -> Result<Option<ItemDocument>, ApiError> {
        let session = self.session()?;

        let set = patch.set_document()?;
        if set.is_empty() {
            return Ok(session.items.find_one(doc! { "ID": item_id }).await?);
        }

        Ok(session
            .items
            .find_one_and_update(doc! { "ID": item_id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    /// Removes the record with the given `ID`; `false` means nothing matched.
    pub async fn delete(&self, item_id: i64) -> Result<bool, ApiError> {
        let session = self.session()?;

        let result = session.items.delete_one(doc! { "ID": item_id }).await?;
        Ok(result.deleted_count > 0)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_err)) if write_err.code == 11000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patch;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn disconnected_store() -> DataStore {
        DataStore::new(Settings {
            host: "localhost".to_string(),
            port: 27017,
            username: String::new(),
            password: String::new(),
            db_name: "itemdata_test".to_string(),
            collection_name: "data".to_string(),
            uri_override: None,
        })
    }

    #[rocket::async_test]
    async fn operations_before_connect_report_not_connected() {
        let store = disconnected_store();
        let new_item = NewItem {
            item_id: 1,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
        };

        assert!(matches!(store.get_all().await, Err(ApiError::NotConnected)));
        assert!(matches!(
            store.get_by_id(1).await,
            Err(ApiError::NotConnected)
        ));
        assert!(matches!(
            store.create(&new_item).await,
            Err(ApiError::NotConnected)
        ));
        assert!(matches!(
            store.update(1, &UpdateItem::default()).await,
            Err(ApiError::NotConnected)
        ));
        assert!(matches!(store.delete(1).await, Err(ApiError::NotConnected)));
    }

    #[rocket::async_test]
    async fn disconnect_without_connect_is_a_noop() {
        let store = disconnected_store();
        store.disconnect().await;
        assert!(matches!(store.get_all().await, Err(ApiError::NotConnected)));
    }

    // Exercises seeding, duplicate classification, partial updates, and
    // deletion against a real server. Requires MONGODB_TEST_URI, e.g.
    // `MONGODB_TEST_URI=mongodb://localhost:27017/ cargo test`.
    #[rocket::async_test]
    async fn live_store_end_to_end() {
        let Ok(uri) = std::env::var("MONGODB_TEST_URI") else {
            eprintln!("MONGODB_TEST_URI not set, skipping live store test");
            return;
        };

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .subsec_nanos();
        let collection_name = format!("items_{}_{}", std::process::id(), nanos);

        let settings = Settings {
            host: String::new(),
            port: 0,
            username: String::new(),
            password: String::new(),
            db_name: "itemdata_test".to_string(),
            collection_name: collection_name.clone(),
            uri_override: Some(uri.clone()),
        };
        let store = DataStore::new(settings);
        store.connect().await.expect("connect");

        // First-ever connection against an empty collection seeds IDs 1-5.
        let seeded = store.get_all().await.expect("get_all");
        let mut ids: Vec<i64> = seeded.iter().map(|item| item.item_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(seeded.iter().all(|item| item.oid.is_some()));

        // Reconnecting against the now non-empty collection must not re-seed.
        store.connect().await.expect("reconnect");
        assert_eq!(store.get_all().await.expect("get_all").len(), 5);

        // Create, then read back by business ID.
        let new_item = NewItem {
            item_id: 6,
            first_name: "Alice".to_string(),
            last_name: "Angel".to_string(),
        };
        let created = store.create(&new_item).await.expect("create");
        assert!(created.oid.is_some());

        let fetched = store
            .get_by_id(6)
            .await
            .expect("get_by_id")
            .expect("item 6 exists");
        assert_eq!(fetched.first_name, "Alice");
        assert_eq!(fetched.last_name, "Angel");

        // Second create with the same ID is a duplicate, and exactly one
        // record with that ID exists afterward.
        assert!(matches!(
            store.create(&new_item).await,
            Err(ApiError::DuplicateId(6))
        ));
        let after_duplicate = store.get_all().await.expect("get_all");
        assert_eq!(
            after_duplicate
                .iter()
                .filter(|item| item.item_id == 6)
                .count(),
            1
        );

        // Empty patch is an idempotent no-op.
        let unchanged = store
            .update(6, &UpdateItem::default())
            .await
            .expect("update")
            .expect("item 6 exists");
        assert_eq!(unchanged.first_name, "Alice");
        assert_eq!(unchanged.last_name, "Angel");

        // Partial update touches only the supplied field.
        let patch = UpdateItem {
            first_name: Patch::Set("Alicia".to_string()),
            last_name: Patch::Unset,
        };
        let updated = store
            .update(6, &patch)
            .await
            .expect("update")
            .expect("item 6 exists");
        assert_eq!(updated.first_name, "Alicia");
        assert_eq!(updated.last_name, "Angel");

        // Updating a missing ID reports not-found and creates nothing.
        assert!(store.update(999, &patch).await.expect("update").is_none());
        assert!(store.get_by_id(999).await.expect("get_by_id").is_none());

        // Delete is true once, then the record is gone and delete is false.
        assert!(store.delete(6).await.expect("delete"));
        assert!(store.get_by_id(6).await.expect("get_by_id").is_none());
        assert!(!store.delete(6).await.expect("delete"));

        // Drop the scratch collection before closing up.
        let cleanup = Client::with_uri_str(&uri).await.expect("cleanup client");
        cleanup
            .database("itemdata_test")
            .collection::<ItemDocument>(&collection_name)
            .drop()
            .await
            .expect("drop collection");
        cleanup.shutdown().await;

        store.disconnect().await;
        assert!(matches!(store.get_all().await, Err(ApiError::NotConnected)));
    }
}
