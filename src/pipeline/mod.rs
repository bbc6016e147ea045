// Pipeline stages: annotate raw articles, then normalize the batch.

pub mod annotate;
pub mod normalize;
pub mod records;

pub use annotate::{annotate_articles, AnnotateOptions};
pub use normalize::{normalize_persons, normalize_records};
pub use records::{Article, ArticleRecord, DateWindow};
