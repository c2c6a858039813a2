//! Table mappings of the domain entities.

mod user;

pub use user::UserRow;
