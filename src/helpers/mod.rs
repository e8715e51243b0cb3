//! Helper functions shared by the generator, templates and dashboard

mod date;
mod url;

pub use date::*;
pub use url::*;
