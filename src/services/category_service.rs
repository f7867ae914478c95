use sea_orm::*;
use tracing::{info, warn};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::models::dto::{CreateCategoryRequest, ProductResponse, UpdateCategoryRequest};
use crate::models::{category, product};
use crate::services::product_service::ProductService;

pub struct CategoryService;

impl CategoryService {
    pub async fn list_categories<C: ConnectionTrait>(db: &C) -> ApiResult<Vec<category::Model>> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Id)
            .all(db)
            .await?;
        Ok(categories)
    }

    pub async fn get_category<C: ConnectionTrait>(db: &C, id: i32) -> ApiResult<category::Model> {
        category::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Category", id))
    }

    pub async fn create_category<C: ConnectionTrait>(
        db: &C,
        request: CreateCategoryRequest,
    ) -> ApiResult<category::Model> {
        request.validate()?;

        let new_category = category::ActiveModel {
            name: Set(request.name),
            description: Set(request.description),
            ..Default::default()
        };

        let created = new_category.insert(db).await?;
        info!("Created category '{}' (id {})", created.name, created.id);
        Ok(created)
    }

    pub async fn update_category<C: ConnectionTrait>(
        db: &C,
        id: i32,
        request: UpdateCategoryRequest,
    ) -> ApiResult<category::Model> {
        request.validate()?;
        let existing = Self::get_category(db, id).await?;

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }

        Ok(active.update(db).await?)
    }

    /// Supprime une catégorie, refusé tant qu'un produit la référence
    pub async fn delete_category<C: ConnectionTrait>(db: &C, id: i32) -> ApiResult<()> {
        let existing = Self::get_category(db, id).await?;

        let product_count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(db)
            .await?;

        if product_count > 0 {
            warn!("Refused to delete category {}: {} product(s) attached", id, product_count);
            return Err(ApiError::Conflict(format!(
                "Cannot delete category '{}': {} product(s) still reference it",
                existing.name, product_count
            )));
        }

        existing.delete(db).await?;
        info!("Deleted category {}", id);
        Ok(())
    }

    pub async fn list_category_products<C: ConnectionTrait>(
        db: &C,
        id: i32,
    ) -> ApiResult<Vec<ProductResponse>> {
        let existing = Self::get_category(db, id).await?;

        let products = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .order_by_asc(product::Column::Id)
            .all(db)
            .await?;

        Ok(products
            .into_iter()
            .map(|p| ProductService::to_response(p, Some(existing.clone())))
            .collect())
    }
}
