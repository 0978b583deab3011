//! Repositories: the public operations of the persistence layer.
//!
//! Each repository is a stateless namespace of associated functions. Every
//! function borrows an executor for exactly one operation; multi-statement
//! operations open a scoped transaction on a [`crate::executor::ClientExecutor`]
//! and commit or roll back before returning.

mod category;
mod customer;
mod inventory;
mod order;
mod product;
mod token;
mod user;

pub use category::{CategoryRepo, CategoryUpdate};
pub use customer::{CompanyRepo, CustomerRepo};
pub use inventory::InventoryRepo;
pub use order::{OrderRepo, RevenuePeriodUnit};
pub use product::ProductRepo;
pub use token::TokenRepo;
pub use user::UserRepo;
