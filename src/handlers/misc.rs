//! Legacy surface: the original single endpoint that dumps every record.

use rocket::serde::json::Json;
use rocket::{Route, State, get, routes as rocket_routes};

use crate::db::DataStore;
use crate::errors::ApiError;
use crate::models::ItemRecord;

#[get("/data")]
pub async fn get_data(store: &State<DataStore>) -> Result<Json<Vec<ItemRecord>>, ApiError> {
    let items = store.get_all().await?;
    Ok(Json(items.into_iter().map(ItemRecord::from).collect()))
}

pub fn routes() -> Vec<Route> {
    rocket_routes![get_data]
}
