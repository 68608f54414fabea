//! Feedcheck core: result records, aggregation and run policy, free of IO beyond readers.
mod exit;
mod input;
mod result;
mod summary;

pub use exit::ExitPolicy;
pub use input::{read_url_list, InputError, UrlList};
pub use result::{Status, ValidationResult};
pub use summary::Summary;
