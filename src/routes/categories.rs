use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::ApiError;
use crate::models::dto::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::services::category_service::CategoryService;

#[get("")]
pub async fn list_categories(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let categories = CategoryService::list_categories(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(categories))
}

#[get("/{id}")]
pub async fn get_category(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let category = CategoryService::get_category(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

#[post("")]
pub async fn create_category(
    body: web::Json<CreateCategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let category = CategoryService::create_category(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(category))
}

#[put("/{id}")]
pub async fn update_category(
    path: web::Path<i32>,
    body: web::Json<UpdateCategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let category =
        CategoryService::update_category(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// DELETE /categories/{id} - 409 tant que des produits y sont rattachés
#[delete("/{id}")]
pub async fn delete_category(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    CategoryService::delete_category(db.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Category {} deleted", id)
    })))
}

#[get("/{id}/products")]
pub async fn list_category_products(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let products = CategoryService::list_category_products(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(products))
}

pub fn categories_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .service(list_categories)
            .service(create_category)
            .service(list_category_products)
            .service(get_category)
            .service(update_category)
            .service(delete_category)
    );
}
