use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::ApiError;
use crate::models::dto::{CreateProductRequest, UpdateProductRequest};
use crate::services::product_service::ProductService;

#[get("")]
pub async fn list_products(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let products = ProductService::list_products(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(products))
}

/// GET /products/{id} - inclut le nom de la catégorie
#[get("/{id}")]
pub async fn get_product(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let product = ProductService::get_product(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

#[post("")]
pub async fn create_product(
    body: web::Json<CreateProductRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let product = ProductService::create_product(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

#[put("/{id}")]
pub async fn update_product(
    path: web::Path<i32>,
    body: web::Json<UpdateProductRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let product =
        ProductService::update_product(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

#[delete("/{id}")]
pub async fn delete_product(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    ProductService::delete_product(db.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Product {} deleted", id)
    })))
}

pub fn products_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .service(list_products)
            .service(create_product)
            .service(get_product)
            .service(update_product)
            .service(delete_product)
    );
}
