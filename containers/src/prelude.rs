pub use super::deferred_release::{DeferredRelease, ReleaseTicket};
pub use super::erased_storage::ErasedBox;
pub use super::error::ContainerErrors;
