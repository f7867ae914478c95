use sea_orm::*;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::collections::btree_map::Entry;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::models::dto::{CreateOrderRequest, OrderItemResponse, OrderResponse};
use crate::models::{order_items, orders, product, users};
use crate::services::user_service::UserService;

pub struct OrderService;

/// Ligne validée, prête à être écrite
struct PendingLine {
    product_id: i32,
    quantity: i32,
    subtotal: i32,
}

impl OrderService {
    /// Crée une commande en une seule transaction:
    /// 1. vérifie l'utilisateur
    /// 2. vérifie le stock de chaque ligne (aucune écriture avant la fin des vérifications)
    /// 3. calcule subtotal = prix × quantité et total = somme des subtotals
    /// 4. décrémente le stock
    /// 5. insère l'en-tête et les lignes, puis commit
    /// Toute erreur déclenche un rollback complet.
    #[instrument(skip(db, request), fields(user_id = request.user_id, lines = request.items.len()))]
    pub async fn create_order(
        db: &DatabaseConnection,
        request: CreateOrderRequest,
    ) -> ApiResult<OrderResponse> {
        request.validate()?;

        let txn = db.begin().await?;

        match Self::place_order(&txn, request).await {
            Ok(response) => {
                txn.commit().await?;
                info!("Created order {} (total {})", response.id, response.total_amount);
                Ok(response)
            }
            Err(e) => {
                // L'erreur d'origine prime sur un éventuel échec du rollback
                if let Err(rollback_err) = txn.rollback().await {
                    error!("Rollback failed after rejected order: {}", rollback_err);
                }
                warn!("Order rejected: {}", e);
                Err(e)
            }
        }
    }

    async fn place_order(
        txn: &DatabaseTransaction,
        request: CreateOrderRequest,
    ) -> ApiResult<OrderResponse> {
        let user = users::Entity::find_by_id(request.user_id)
            .one(txn)
            .await?
            .ok_or_else(|| ApiError::not_found("User", request.user_id))?;

        // Stock restant en mémoire: une même référence sur plusieurs lignes
        // est vérifiée contre le stock déjà réservé par les lignes précédentes
        let mut stock: BTreeMap<i32, product::Model> = BTreeMap::new();
        let mut lines: Vec<PendingLine> = Vec::with_capacity(request.items.len());
        let mut total_amount: i32 = 0;

        for item in &request.items {
            let product = match stock.entry(item.product_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let loaded = product::Entity::find_by_id(item.product_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ApiError::not_found("Product", item.product_id))?;
                    entry.insert(loaded)
                }
            };

            if product.quantity < item.quantity {
                return Err(ApiError::BadRequest(format!(
                    "Insufficient stock for product '{}' (id {}): available {}, requested {}",
                    product.name, product.id, product.quantity, item.quantity
                )));
            }

            let subtotal = product
                .price
                .checked_mul(item.quantity)
                .ok_or_else(|| ApiError::BadRequest("Order amount is too large".to_string()))?;
            total_amount = total_amount
                .checked_add(subtotal)
                .ok_or_else(|| ApiError::BadRequest("Order amount is too large".to_string()))?;

            product.quantity -= item.quantity;

            lines.push(PendingLine {
                product_id: product.id,
                quantity: item.quantity,
                subtotal,
            });
        }

        // Toutes les lignes sont valides: on écrit
        for reserved in stock.values() {
            product::ActiveModel {
                id: Unchanged(reserved.id),
                quantity: Set(reserved.quantity),
                ..Default::default()
            }
            .update(txn)
            .await?;
        }

        let order = orders::ActiveModel {
            created_at: Set(Utc::now()),
            total_amount: Set(total_amount),
            user_id: Set(user.id),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let saved = order_items::ActiveModel {
                product_id: Set(line.product_id),
                order_id: Set(order.id),
                quantity: Set(line.quantity),
                subtotal: Set(line.subtotal),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            let ordered = stock.get(&saved.product_id);
            items.push(OrderItemResponse {
                id: saved.id,
                product_id: saved.product_id,
                product_name: ordered.map(|p| p.name.clone()),
                unit_price: ordered.map(|p| p.price),
                quantity: saved.quantity,
                subtotal: saved.subtotal,
            });
        }

        Ok(OrderResponse {
            id: order.id,
            created_at: order.created_at,
            total_amount: order.total_amount,
            user_id: order.user_id,
            username: Some(user.username),
            items,
        })
    }

    pub async fn list_orders<C: ConnectionTrait>(db: &C) -> ApiResult<Vec<OrderResponse>> {
        let rows = orders::Entity::find()
            .find_also_related(users::Entity)
            .order_by_asc(orders::Column::Id)
            .all(db)
            .await?;

        Self::with_items(db, rows).await
    }

    pub async fn get_order<C: ConnectionTrait>(db: &C, id: i32) -> ApiResult<OrderResponse> {
        let row = orders::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", id))?;

        Self::with_items(db, vec![row])
            .await?
            .pop()
            .ok_or_else(|| ApiError::not_found("Order", id))
    }

    pub async fn list_user_orders<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
    ) -> ApiResult<Vec<OrderResponse>> {
        let user = UserService::get_user(db, user_id).await?;

        let rows = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user.id))
            .order_by_asc(orders::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|order| (order, Some(user.clone())))
            .collect();

        Self::with_items(db, rows).await
    }

    /// Joint les lignes (et leur produit) aux en-têtes en UNE seule requête
    async fn with_items<C: ConnectionTrait>(
        db: &C,
        rows: Vec<(orders::Model, Option<users::Model>)>,
    ) -> ApiResult<Vec<OrderResponse>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = rows.iter().map(|(order, _)| order.id).collect();

        let item_rows = order_items::Entity::find()
            .filter(order_items::Column::OrderId.is_in(order_ids))
            .find_also_related(product::Entity)
            .order_by_asc(order_items::Column::Id)
            .all(db)
            .await?;

        let mut items_by_order: HashMap<i32, Vec<OrderItemResponse>> = HashMap::new();
        for (item, product) in item_rows {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    product_name: product.as_ref().map(|p| p.name.clone()),
                    unit_price: product.as_ref().map(|p| p.price),
                    quantity: item.quantity,
                    subtotal: item.subtotal,
                });
        }

        Ok(rows
            .into_iter()
            .map(|(order, user)| OrderResponse {
                id: order.id,
                created_at: order.created_at,
                total_amount: order.total_amount,
                user_id: order.user_id,
                username: user.map(|u| u.username),
                items: items_by_order.remove(&order.id).unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dto::OrderItemRequest;
    use crate::test_utils::{seed_category, seed_product, seed_user, setup_test_db};

    fn order_for(user_id: i32, items: &[(i32, i32)]) -> CreateOrderRequest {
        CreateOrderRequest {
            user_id,
            items: items
                .iter()
                .map(|&(product_id, quantity)| OrderItemRequest { product_id, quantity })
                .collect(),
        }
    }

    async fn stock_of(db: &DatabaseConnection, id: i32) -> i32 {
        product::Entity::find_by_id(id)
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    async fn count_items(db: &DatabaseConnection) -> u64 {
        order_items::Entity::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn order_totals_subtotals_and_decrements_stock() {
        let db = setup_test_db().await;
        let user = seed_user(&db, "clerk").await;
        let category = seed_category(&db, "General").await;
        let a = seed_product(&db, "A", 10, 5, category.id).await;
        let b = seed_product(&db, "B", 5, 3, category.id).await;

        let order = OrderService::create_order(&db, order_for(user.id, &[(a.id, 2), (b.id, 1)]))
            .await
            .unwrap();

        assert_eq!(order.total_amount, 25);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].subtotal, 20);
        assert_eq!(order.items[1].subtotal, 5);
        assert_eq!(order.username.as_deref(), Some("clerk"));

        assert_eq!(stock_of(&db, a.id).await, 3);
        assert_eq!(stock_of(&db, b.id).await, 2);
        assert_eq!(count_items(&db).await, 2);
    }

    #[tokio::test]
    async fn insufficient_stock_rolls_back_everything() {
        let db = setup_test_db().await;
        let user = seed_user(&db, "clerk").await;
        let category = seed_category(&db, "General").await;
        let a = seed_product(&db, "A", 10, 5, category.id).await;
        let b = seed_product(&db, "Scarce", 5, 1, category.id).await;

        let result =
            OrderService::create_order(&db, order_for(user.id, &[(a.id, 2), (b.id, 4)])).await;

        match result {
            Err(ApiError::BadRequest(msg)) => {
                assert!(msg.contains("Scarce"));
                assert!(msg.contains("available 1"));
            }
            other => panic!("expected insufficient stock, got {:?}", other),
        }

        assert_eq!(stock_of(&db, a.id).await, 5);
        assert_eq!(stock_of(&db, b.id).await, 1);
        assert_eq!(orders::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(count_items(&db).await, 0);
    }

    #[tokio::test]
    async fn repeated_product_lines_share_the_same_stock() {
        let db = setup_test_db().await;
        let user = seed_user(&db, "clerk").await;
        let category = seed_category(&db, "General").await;
        let a = seed_product(&db, "A", 10, 3, category.id).await;

        let result =
            OrderService::create_order(&db, order_for(user.id, &[(a.id, 2), (a.id, 2)])).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert_eq!(stock_of(&db, a.id).await, 3);

        let order = OrderService::create_order(&db, order_for(user.id, &[(a.id, 1), (a.id, 2)]))
            .await
            .unwrap();
        assert_eq!(order.total_amount, 30);
        assert_eq!(stock_of(&db, a.id).await, 0);
    }

    #[tokio::test]
    async fn amount_overflow_is_rejected_without_changes() {
        let db = setup_test_db().await;
        let user = seed_user(&db, "clerk").await;
        let category = seed_category(&db, "General").await;
        let pricey = seed_product(&db, "Pricey", i32::MAX, 5, category.id).await;

        match OrderService::create_order(&db, order_for(user.id, &[(pricey.id, 2)])).await {
            Err(ApiError::BadRequest(msg)) => assert!(msg.contains("too large")),
            other => panic!("expected overflow rejection, got {:?}", other),
        }
        assert_eq!(stock_of(&db, pricey.id).await, 5);
        assert_eq!(orders::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let db = setup_test_db().await;
        let category = seed_category(&db, "General").await;
        let a = seed_product(&db, "A", 10, 5, category.id).await;

        let result = OrderService::create_order(&db, order_for(77, &[(a.id, 1)])).await;
        assert!(matches!(result, Err(ApiError::NotFound { entity: "User", id: 77 })));
        assert_eq!(stock_of(&db, a.id).await, 5);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found_and_nothing_changes() {
        let db = setup_test_db().await;
        let user = seed_user(&db, "clerk").await;
        let category = seed_category(&db, "General").await;
        let a = seed_product(&db, "A", 10, 5, category.id).await;

        let result =
            OrderService::create_order(&db, order_for(user.id, &[(a.id, 1), (555, 1)])).await;
        assert!(matches!(result, Err(ApiError::NotFound { entity: "Product", id: 555 })));
        assert_eq!(stock_of(&db, a.id).await, 5);
    }

    #[tokio::test]
    async fn empty_or_zero_quantity_orders_fail_validation() {
        let db = setup_test_db().await;
        let user = seed_user(&db, "clerk").await;
        let category = seed_category(&db, "General").await;
        let a = seed_product(&db, "A", 10, 5, category.id).await;

        assert!(matches!(
            OrderService::create_order(&db, order_for(user.id, &[])).await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            OrderService::create_order(&db, order_for(user.id, &[(a.id, 0)])).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn retrieval_joins_user_and_products() {
        let db = setup_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let category = seed_category(&db, "General").await;
        let a = seed_product(&db, "Lamp", 7, 10, category.id).await;

        let first = OrderService::create_order(&db, order_for(alice.id, &[(a.id, 1)]))
            .await
            .unwrap();
        OrderService::create_order(&db, order_for(bob.id, &[(a.id, 3)]))
            .await
            .unwrap();

        let all = OrderService::list_orders(&db).await.unwrap();
        assert_eq!(all.len(), 2);

        let fetched = OrderService::get_order(&db, first.id).await.unwrap();
        assert_eq!(fetched.username.as_deref(), Some("alice"));
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].product_name.as_deref(), Some("Lamp"));
        assert_eq!(fetched.items[0].unit_price, Some(7));

        let bobs = OrderService::list_user_orders(&db, bob.id).await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].total_amount, 21);

        assert!(matches!(
            OrderService::get_order(&db, 999).await,
            Err(ApiError::NotFound { entity: "Order", .. })
        ));
    }
}
