//! # Itemdata - a small CRUD service for item records backed by MongoDB
//!
//! ## Environment Variables
//!
//! - `MONGO_URI`: pre-assembled MongoDB connection string (optional)
//! - `MONGO_HOST`, `MONGO_PORT`, `MONGO_USER`, `MONGO_PASSWORD`: discrete
//!   connection parameters used when no `MONGO_URI` is set
//! - `MONGO_DB_NAME`, `MONGO_COLLECTION_NAME`: storage location

use rocket::{Build, Rocket, catchers, fairing::AdHoc, http::Method, launch, routes};
use rocket_cors::{AllowedOrigins, CorsOptions};

use crate::{config::Settings, db::DataStore};

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;

/// Assembles the full route table around an already-constructed store, so
/// tests can mount the exact instance the binary serves.
pub fn build_rocket(store: DataStore) -> Rocket<Build> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true);

    rocket::build()
        .manage(store)
        .attach(cors.to_cors().expect("Failed to build cors"))
        .attach(AdHoc::on_shutdown("Store Disconnect", |rocket| {
            Box::pin(async move {
                if let Some(store) = rocket.state::<DataStore>() {
                    store.disconnect().await;
                }
            })
        }))
        .register(
            "/",
            catchers![
                handlers::catch404,
                handlers::catch422,
                handlers::catch500
            ],
        )
        .mount("/", routes![handlers::index])
        .mount("/", handlers::misc::routes())
        .mount("/items", handlers::items::routes())
}

/// Opens the store before launch and keeps serving even when the database is
/// unreachable; every data route then answers 503 until a restart.
#[launch]
async fn rocket() -> _ {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env().expect("invalid mongodb configuration");
    let store = DataStore::new(settings);

    if let Err(err) = store.connect().await {
        eprintln!("database connection failed, serving without a store: {err}");
    }

    build_rocket(store)
}
