use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::ApiError;
use crate::models::dto::{CreateUserRequest, UpdateUserRequest};
use crate::services::order_service::OrderService;
use crate::services::user_service::UserService;

/// GET /users
#[get("")]
pub async fn list_users(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let users = UserService::list_users(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /users/{id}
#[get("/{id}")]
pub async fn get_user(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::get_user(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /users - 409 si le username ou l'email existe déjà
#[post("")]
pub async fn create_user(
    body: web::Json<CreateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::create_user(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User created successfully",
        "user": user
    })))
}

/// PUT /users/{id} - mise à jour partielle
#[put("/{id}")]
pub async fn update_user(
    path: web::Path<i32>,
    body: web::Json<UpdateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::update_user(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /users/{id}
#[delete("/{id}")]
pub async fn delete_user(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    UserService::delete_user(db.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("User {} deleted", id)
    })))
}

/// GET /users/{id}/orders
#[get("/{id}/orders")]
pub async fn list_user_orders(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let orders = OrderService::list_user_orders(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub fn users_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(list_users)
            .service(create_user)
            .service(list_user_orders)
            .service(get_user)
            .service(update_user)
            .service(delete_user)
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};

    use crate::routes::configure_routes;
    use crate::test_utils::setup_test_db;

    #[actix_web::test]
    async fn create_duplicate_and_list() {
        let db = setup_test_db().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .configure(configure_routes),
        )
        .await;

        let payload = json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "hunter2"
        });

        let req = test::TestRequest::post().uri("/users").set_json(&payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["role"], "staff");
        assert!(body["user"].get("password").is_none());

        let req = test::TestRequest::post().uri("/users").set_json(&payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "User already exists");

        let req = test::TestRequest::get().uri("/users").to_request();
        let users: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(users.as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn missing_user_is_404() {
        let db = setup_test_db().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/users/42").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "User 42 not found");
    }

    #[actix_web::test]
    async fn malformed_body_is_400_json() {
        let db = setup_test_db().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "username": "no-email" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }
}
