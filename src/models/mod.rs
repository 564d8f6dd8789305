//! Data models for the BioOS platform.
//!
//! Field names serialize in camelCase so stored JSON stays compatible with the
//! dashboard's existing `bio_*` storage records.

mod chat;
mod entry;
mod history;
mod profile;
mod update;
mod view;

pub use chat::*;
pub use entry::*;
pub use history::*;
pub use profile::*;
pub use update::*;
pub use view::*;
