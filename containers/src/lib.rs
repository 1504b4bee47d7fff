pub mod deferred_release;
pub mod erased_storage;
pub mod error;
pub mod prelude;
