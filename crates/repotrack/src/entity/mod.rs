//! SeaORM entity definitions for the repotrack schema.

pub mod commit;
pub mod prelude;
pub mod tracked_repository;
