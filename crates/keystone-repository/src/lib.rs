//! # Keystone Repository
//!
//! Generic persistence for any [`Entity`](keystone_core::Entity):
//!
//! ```text
//! Service
//!   ↓  Arc<dyn Repository<E>>     (generic contract)
//! SqlRepository<E>                (SQL generated from TableMapping)
//!   ↓  DatabasePool               (MySQL or PostgreSQL)
//! Store
//! ```
//!
//! [`InMemoryRepository`] implements the same contract without a store.

mod filter;
mod mapping;
mod mappings;
mod memory;
pub mod pool;
pub mod sql;
mod traits;

pub use filter::*;
pub use mapping::*;
pub use mappings::*;
pub use memory::InMemoryRepository;
pub use pool::*;
pub use sql::{SqlRepository, SqlUserRepository, SqlUserRepositoryParameters};
pub use traits::*;
