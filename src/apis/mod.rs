pub mod atcoder;
pub mod clist;
pub mod factory;

pub use atcoder::{AtCoderCrawler, ExtractStrategy};
pub use clist::{ClistAccount, ClistCrawler};
pub use factory::{create_sources, SourceMode};
