pub mod format_store;

pub use format_store::{FormatDraft, FormatStore, FormatUpdate, InMemoryFormatStore};
