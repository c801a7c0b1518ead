use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use marketplace_engine::{run_migrations, FulfillmentApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{health, order_status},
    webhook_routes::payment_confirmation_webhook,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Database at {} is ready", config.database_url);
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let fulfillment_api = FulfillmentApi::with_timeout(db.clone(), config.fulfillment_timeout);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkt::access_log"))
            .app_data(web::Data::new(fulfillment_api))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .route("/webhook/payment-confirmation", web::post().to(payment_confirmation_webhook::<SqliteDatabase>))
            .route("/order-status/{payment_reference}", web::get().to(order_status::<SqliteDatabase>))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
