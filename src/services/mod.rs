pub mod user_service;
pub mod category_service;
pub mod product_service;
pub mod order_service;
