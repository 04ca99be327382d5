pub mod items;
pub mod misc;

use rocket::serde::json::Json;
use rocket::{catch, get};
use serde_json::{Value, json};

#[get("/")]
pub fn index() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[catch(404)]
pub fn catch404() -> Json<Value> {
    Json(json!({
        "error": "resource not found",
        "status": 404
    }))
}

#[catch(422)]
pub fn catch422() -> Json<Value> {
    Json(json!({
        "error": "request body could not be parsed",
        "status": 422
    }))
}

#[catch(500)]
pub fn catch500() -> Json<Value> {
    Json(json!({
        "error": "internal server error",
        "status": 500
    }))
}
