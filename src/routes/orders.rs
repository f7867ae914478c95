use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::ApiError;
use crate::models::dto::CreateOrderRequest;
use crate::services::order_service::OrderService;

#[get("")]
pub async fn list_orders(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let orders = OrderService::list_orders(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[get("/{id}")]
pub async fn get_order(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let order = OrderService::get_order(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// POST /orders - vérifie le stock, décrémente et crée la commande (tout ou rien)
#[post("")]
pub async fn create_order(
    body: web::Json<CreateOrderRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let order = OrderService::create_order(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

pub fn orders_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .service(list_orders)
            .service(create_order)
            .service(get_order)
    );
}
