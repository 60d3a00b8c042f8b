//! Built-in checks.

mod duplicate_alias;
mod name_collision;
mod unexposed_dependency;

pub use duplicate_alias::DuplicateAliasCheck;
pub use name_collision::NameCollisionCheck;
pub use unexposed_dependency::UnexposedDependencyCheck;
