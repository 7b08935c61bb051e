pub mod error;
pub mod ingest;
pub mod models;
pub mod similarity;
pub mod storage;
pub mod transport;
pub mod types;

pub use error::Error;
pub use ingest::{NewsSource, TextExtractor};
pub use models::InferenceModel;
pub use similarity::cosine_similarity;
pub use storage::DocumentStore;
pub use transport::EmailTransport;
pub use types::{
    DigestSection, NewsletterRecord, PersonalDigest, RawArticle, RawArticlesRecord,
    SummarizedArticle, TopicDigest, UserRecord,
};

pub type Result<T> = std::result::Result<T, Error>;
