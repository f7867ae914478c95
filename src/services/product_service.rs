use sea_orm::*;
use tracing::{info, warn};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::models::dto::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::models::{category, order_items, product};

pub struct ProductService;

impl ProductService {
    /// Produit + nom de la catégorie jointe
    pub fn to_response(product: product::Model, category: Option<category::Model>) -> ProductResponse {
        ProductResponse {
            id: product.id,
            name: product.name,
            price: product.price,
            quantity: product.quantity,
            category_id: product.category_id,
            category_name: category.map(|c| c.name),
        }
    }

    pub async fn list_products<C: ConnectionTrait>(db: &C) -> ApiResult<Vec<ProductResponse>> {
        let rows = product::Entity::find()
            .find_also_related(category::Entity)
            .order_by_asc(product::Column::Id)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(p, c)| Self::to_response(p, c))
            .collect())
    }

    pub async fn get_product<C: ConnectionTrait>(db: &C, id: i32) -> ApiResult<ProductResponse> {
        let (product, category) = product::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", id))?;

        Ok(Self::to_response(product, category))
    }

    pub async fn create_product<C: ConnectionTrait>(
        db: &C,
        request: CreateProductRequest,
    ) -> ApiResult<ProductResponse> {
        request.validate()?;
        let category = Self::require_category(db, request.category_id).await?;

        let new_product = product::ActiveModel {
            name: Set(request.name),
            price: Set(request.price),
            quantity: Set(request.quantity),
            category_id: Set(request.category_id),
            ..Default::default()
        };

        let created = new_product.insert(db).await?;
        info!("Created product '{}' (id {}) in category {}", created.name, created.id, category.id);
        Ok(Self::to_response(created, Some(category)))
    }

    /// Mise à jour partielle. Une catégorie inexistante est refusée avant toute écriture.
    pub async fn update_product<C: ConnectionTrait>(
        db: &C,
        id: i32,
        request: UpdateProductRequest,
    ) -> ApiResult<ProductResponse> {
        request.validate()?;

        let existing = product::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", id))?;

        let category_id = request.category_id.unwrap_or(existing.category_id);
        let category = Self::require_category(db, category_id).await?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(quantity) = request.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(category_id) = request.category_id {
            active.category_id = Set(category_id);
        }

        let updated = active.update(db).await?;
        info!("Updated product {}", updated.id);
        Ok(Self::to_response(updated, Some(category)))
    }

    /// Supprime un produit, refusé tant qu'une ligne de commande le référence
    pub async fn delete_product<C: ConnectionTrait>(db: &C, id: i32) -> ApiResult<()> {
        let existing = product::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", id))?;

        let item_count = order_items::Entity::find()
            .filter(order_items::Column::ProductId.eq(id))
            .count(db)
            .await?;

        if item_count > 0 {
            warn!("Refused to delete product {}: {} order item(s) attached", id, item_count);
            return Err(ApiError::Conflict(format!(
                "Cannot delete product '{}': {} order item(s) still reference it",
                existing.name, item_count
            )));
        }

        existing.delete(db).await?;
        info!("Deleted product {}", id);
        Ok(())
    }

    async fn require_category<C: ConnectionTrait>(
        db: &C,
        category_id: i32,
    ) -> ApiResult<category::Model> {
        category::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::BadRequest(format!("Category {} does not exist", category_id)))
    }
}
