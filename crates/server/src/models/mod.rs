//! Domain models for the Solemart server.
//!
//! These types represent validated domain objects separate from database row
//! types (see `crate::db`) and define the JSON shapes returned by routes.

pub mod cart;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{CartItem, CartItemView, CartProductSummary, CartView};
pub use product::{CatalogEntry, Product, ProductInput, ProductPatch};
pub use session::SessionUser;
pub use user::{User, UserProfile, UserResponse};
