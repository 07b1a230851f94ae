//! Concrete vendor adapters.
//!
//! Each adapter documents its known response shapes as ordered path lists,
//! most-recent-first, so future vendor changes are additive.

pub mod kling;
pub mod luma;
pub mod pixverse;

pub use kling::KlingAdapter;
pub use luma::LumaAdapter;
pub use pixverse::PixverseAdapter;
