use sea_orm::*;
use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::models::dto::{CreateUserRequest, UpdateUserRequest};
use crate::models::{orders, users};

pub struct UserService;

impl UserService {
    pub async fn list_users<C: ConnectionTrait>(db: &C) -> ApiResult<Vec<users::Model>> {
        let users = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(db)
            .await?;
        Ok(users)
    }

    pub async fn get_user<C: ConnectionTrait>(db: &C, id: i32) -> ApiResult<users::Model> {
        users::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("User", id))
    }

    /// Crée un utilisateur. Le mot de passe est stocké tel quel.
    /// Un username ou un email déjà pris renvoie Conflict sans créer de ligne.
    pub async fn create_user<C: ConnectionTrait>(
        db: &C,
        request: CreateUserRequest,
    ) -> ApiResult<users::Model> {
        request.validate()?;

        let existing = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(&request.username))
                    .add(users::Column::Email.eq(&request.email)),
            )
            .one(db)
            .await?;

        if existing.is_some() {
            warn!("Rejected duplicate user '{}'", request.username);
            return Err(ApiError::Conflict("User already exists".to_string()));
        }

        let new_user = users::ActiveModel {
            username: Set(request.username),
            email: Set(request.email),
            password: Set(request.password),
            role: Set(request.role),
            is_active: Set(request.is_active),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let user = new_user.insert(db).await?;
        info!("Created user '{}' (id {})", user.username, user.id);
        Ok(user)
    }

    pub async fn update_user<C: ConnectionTrait>(
        db: &C,
        id: i32,
        request: UpdateUserRequest,
    ) -> ApiResult<users::Model> {
        request.validate()?;
        let user = Self::get_user(db, id).await?;

        // Vérifier l'unicité uniquement contre les AUTRES utilisateurs
        let mut clash = Condition::any();
        if let Some(username) = &request.username {
            clash = clash.add(users::Column::Username.eq(username));
        }
        if let Some(email) = &request.email {
            clash = clash.add(users::Column::Email.eq(email));
        }
        if !clash.is_empty() {
            let taken = users::Entity::find()
                .filter(clash)
                .filter(users::Column::Id.ne(id))
                .one(db)
                .await?;
            if taken.is_some() {
                return Err(ApiError::Conflict("User already exists".to_string()));
            }
        }

        let mut active: users::ActiveModel = user.into();
        if let Some(username) = request.username {
            active.username = Set(username);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(password) = request.password {
            active.password = Set(password);
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(db).await?;
        info!("Updated user {}", updated.id);
        Ok(updated)
    }

    /// Supprime un utilisateur, refusé tant qu'il a des commandes
    pub async fn delete_user<C: ConnectionTrait>(db: &C, id: i32) -> ApiResult<()> {
        let user = Self::get_user(db, id).await?;

        let order_count = orders::Entity::find()
            .filter(orders::Column::UserId.eq(id))
            .count(db)
            .await?;

        if order_count > 0 {
            warn!("Refused to delete user {}: {} order(s) attached", id, order_count);
            return Err(ApiError::Conflict(format!(
                "Cannot delete user '{}': {} order(s) still reference it",
                user.username, order_count
            )));
        }

        user.delete(db).await?;
        info!("Deleted user {}", id);
        Ok(())
    }
}
