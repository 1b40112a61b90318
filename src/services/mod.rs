pub mod checkout;
pub mod orders;
pub mod products;
pub mod reconciliation;
pub mod users;

pub use checkout::CheckoutService;
pub use orders::OrderService;
pub use products::ProductService;
pub use reconciliation::ReconciliationService;
pub use users::UserService;
