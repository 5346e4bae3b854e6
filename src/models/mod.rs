mod category;
mod product;
mod user;

pub use category::{Category, NewCategory, UpdateCategory};
pub use product::{NewProduct, Product, ProductWithCategory, PurchaseOutcome, UpdateProduct};
pub use user::{NewUser, Role, User};
