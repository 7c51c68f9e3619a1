//! linehistory-core — versioning core for a source-code editor.
//!
//! Records every edit as a timestamped [`version::Version`] against a
//! per-line [`line::Line`] history, and lets a caller scrub any
//! [`block::Block`] (a named region of a file) independently to an
//! arbitrary past moment via [`session::Session::apply_index`].

pub mod block;
pub mod config;
pub mod edit;
pub mod error;
pub mod file;
pub mod ids;
pub mod line;
pub mod order;
pub mod session;
pub mod store;
pub mod tag;
pub mod timeline;
pub mod version;

#[cfg(test)]
mod tests;

pub use block::{Block, BlockInfo, BlockKind};
pub use config::CoreConfig;
pub use edit::MultiLineChange;
pub use error::{CoreError, CoreResult, NotFoundKind};
pub use ids::{BlockId, FileId, LineId, TagId};
pub use session::Session;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
