pub mod health;
pub mod users;
pub mod categories;
pub mod products;
pub mod orders;

use actix_web::{error::InternalError, web, HttpResponse};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Corps JSON invalide: renvoyer {"error": ...} comme le reste de l'API
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Invalid request body: {}", err)
        }));
        InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config)
        .service(health::index)
        .configure(users::users_routes)
        .configure(categories::categories_routes)
        .configure(products::products_routes)
        .configure(orders::orders_routes);
}
