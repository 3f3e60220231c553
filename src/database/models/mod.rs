pub mod category;
pub mod item;
pub mod user;

pub use category::Category;
pub use item::{ApiItem, Item};
pub use user::User;
