//! Entity records mirrored from the backend.
//!
//! Every record accepts both `_id` and `id` for its identifier and writes
//! `_id` back out.

pub mod category;
pub mod notification;
pub mod order;
pub mod product;
pub mod shop;
pub mod user;

pub use category::{Category, CategoryDraft, Subcategory, find_category};
pub use notification::Notification;
pub use order::{AddressError, NewOrder, Order, OrderCustomer, OrderError, ShippingAddress};
pub use product::{CartItemError, Product, ProductDraft, Variant};
pub use shop::{MenuItem, MenuItemDraft, Shop, ShopDraft};
pub use user::{AuthSession, User};
