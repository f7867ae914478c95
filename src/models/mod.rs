// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque entité correspond à une table SQLite avec SeaORM.
//
// Liste des modules:
//   - health : Réponse de l'endpoint GET /
//   - users : Utilisateurs (rôle présent mais jamais vérifié)
//   - category : Catégories de produits
//   - product : Produits et stock disponible
//   - orders : En-têtes de commande (total calculé à la création)
//   - order_items : Lignes de commande (subtotal = prix × quantité)
//   - dto : Data Transfer Objects pour les requêtes et réponses API
//
// Points d'attention:
//   - Les clés étrangères sont explicites:
//       product.category_id    -> category.id
//       order_items.product_id -> product.id
//       order_items.order_id   -> orders.id
//       orders.user_id         -> users.id
//   - Pas de graphe d'objets: des ids + des jointures explicites
//
// ============================================================================

pub mod health;
pub mod users;
pub mod category;
pub mod product;
pub mod orders;
pub mod order_items;
pub mod dto;
