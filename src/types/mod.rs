//! Domain types shared by the resources and the controller
//!
//! - action: pending-action flag pair
//! - files: storage listing entries
//! - forms: save-action request forms
//! - logs: log entries
//! - values: measurement entries

pub mod action;
pub mod files;
pub mod forms;
pub mod logs;
pub mod values;

pub use action::*;
pub use files::*;
pub use forms::*;
pub use logs::*;
pub use values::*;
