//! Sheetwright Engine library.
//!
//! Application layer around the sheet component tree.
//!
//! ## Structure
//!
//! - `use_cases/` - Template editing orchestration over the component tree
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
