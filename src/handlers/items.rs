//! # Item handlers
//!
//! One route per data-access operation. Handlers validate the request shape,
//! call the store, and let [`ApiError`]'s responder translate failures to
//! status codes; no other logic lives here.

use rocket::serde::json::Json;
use rocket::{Route, State, delete, get, post, put, response::status, routes};

use crate::db::DataStore;
use crate::errors::ApiError;
use crate::models::{ItemRecord, NewItem, UpdateItem};

pub fn routes() -> Vec<Route> {
    routes![create_item, get_items, get_item_by_id, update_item, delete_item]
}

#[post("/", format = "json", data = "<new_item>")]
pub async fn create_item(
    store: &State<DataStore>,
    new_item: Json<NewItem>,
) -> Result<status::Created<Json<ItemRecord>>, ApiError> {
    let new_item = new_item.into_inner();
    new_item.validate()?;

    let created = store.create(&new_item).await?;
    Ok(status::Created::new(format!("/items/{}", new_item.item_id))
        .body(Json(ItemRecord::from(created))))
}

#[get("/")]
pub async fn get_items(store: &State<DataStore>) -> Result<Json<Vec<ItemRecord>>, ApiError> {
    let items = store.get_all().await?;
    Ok(Json(items.into_iter().map(ItemRecord::from).collect()))
}

#[get("/<item_id>")]
pub async fn get_item_by_id(
    store: &State<DataStore>,
    item_id: i64,
) -> Result<Json<ItemRecord>, ApiError> {
    let item = store
        .get_by_id(item_id)
        .await?
        .ok_or(ApiError::NotFound(item_id))?;
    Ok(Json(item.into()))
}

#[put("/<item_id>", format = "json", data = "<patch>")]
pub async fn update_item(
    store: &State<DataStore>,
    item_id: i64,
    patch: Json<UpdateItem>,
) -> Result<Json<ItemRecord>, ApiError> {
    let updated = store
        .update(item_id, &patch.into_inner())
        .await?
        .ok_or(ApiError::NotFound(item_id))?;
    Ok(Json(updated.into()))
}

#[delete("/<item_id>")]
pub async fn delete_item(
    store: &State<DataStore>,
    item_id: i64,
) -> Result<status::NoContent, ApiError> {
    if store.delete(item_id).await? {
        Ok(status::NoContent)
    } else {
        Err(ApiError::NotFound(item_id))
    }
}
