use actix_web::{get, HttpResponse};
use chrono::Utc;
use crate::models::health::HealthResponse;

#[get("/")]
pub async fn index() -> HttpResponse {
    let response = HealthResponse {
        name: "StockWise".to_string(),
        status: "ok".to_string(),
        time: Utc::now(),
    };

    HttpResponse::Ok().json(response)
}
