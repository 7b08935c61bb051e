pub mod extract;
pub mod fetch;

pub use extract::HtmlExtractor;
pub use fetch::TheNewsApiClient;

pub mod prelude {
    pub use super::extract::HtmlExtractor;
    pub use super::fetch::TheNewsApiClient;
    pub use nd_core::{NewsSource, RawArticle, Result, TextExtractor};
}
