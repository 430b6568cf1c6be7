//! Vouch storage - one JSON file mapping user ids to their vouches.

pub mod record;
pub mod vouches;

pub use record::VouchRecord;
pub use vouches::{StoreError, VouchStore};
