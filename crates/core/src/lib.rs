//! # Spiro Core
//!
//! Domain types, traits, and error definitions for the Spiro comment service.
//! The assembler in [`page`] is pure; [`service`] wires it to a
//! [`CommentStore`]. Store implementations live in `spiro-store`, so every
//! other crate depends inward on this one.

pub mod error;
pub mod comment;
pub mod store;
pub mod page;
pub mod service;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ErrorCode, Result, StoreError};
pub use comment::{ArticleId, Comment, CommentId, CommentPageResult, PrimaryCommentView, NO_PARENT};
pub use store::{CommentStore, RangeFetch, RangeQuery};
pub use page::{PageLimits, PageRequest, PageWindow, assemble};
pub use service::CommentListService;
