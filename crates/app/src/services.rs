//! Application services: the token lifecycle and the hierarchical sync.
//!
//! Both are stateless functions over the [`CloudApi`](crate::ports::CloudApi)
//! port. The state they act on is owned by the
//! [`CommandRouter`](crate::router::CommandRouter).

pub mod sync_engine;
pub mod token_lifecycle;
