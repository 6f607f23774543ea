//! Types shared across resources.

pub mod common;
pub mod money;
pub mod nullable;
pub mod pagination;

pub use common::{Address, Deleted, Metadata};
pub use nullable::Nullable;
pub use pagination::{ListParams, Ordering, Pageable, Paginator};
