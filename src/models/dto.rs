// Data Transfer Objects: corps des requêtes et réponses structurées
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_role() -> String {
    "staff".to_string()
}

fn default_active() -> bool {
    true
}

// ---------------------------------------------------------------- users

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Mise à jour partielle: seuls les champs présents sont modifiés
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

// ----------------------------------------------------------- categories

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name cannot be empty"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, message = "Category name cannot be empty"))]
    pub name: Option<String>,
    // absent: inchangé, null: effacé, "...": remplacé
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
}

// ------------------------------------------------------------- products

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: String,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i32,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    pub category_id: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: Option<i32>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    pub category_id: Option<i32>,
}

/// Produit avec le nom de sa catégorie (jointure)
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub price: i32,
    pub quantity: i32,
    pub category_id: i32,
    pub category_name: Option<String>,
}

// --------------------------------------------------------------- orders

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub user_id: i32,
    #[validate(length(min = 1, message = "Order must contain at least one item"), nested)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub product_name: Option<String>,
    pub unit_price: Option<i32>,
    pub quantity: i32,
    pub subtotal: i32,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub total_amount: i32,
    pub user_id: i32,
    pub username: Option<String>,
    pub items: Vec<OrderItemResponse>,
}
