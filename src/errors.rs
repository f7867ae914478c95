use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use thiserror::Error;

/// Erreurs renvoyées par les services et converties en réponse HTTP
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ApiError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        ApiError::NotFound { entity, id }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Database(e) => {
                // On logge l'erreur réelle, le client reçoit un message générique
                tracing::error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "An internal error occurred"
                }))
            }
            ApiError::Validation(errors) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation failed",
                "details": errors
            })),
            other => HttpResponse::build(other.status_code()).json(serde_json::json!({
                "error": other.to_string()
            })),
        }
    }
}

/// Erreurs de démarrage (configuration, connexion, bind du serveur)
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
