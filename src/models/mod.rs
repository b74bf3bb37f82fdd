mod date;
mod news;
mod rewrite;

pub use date::IngestDate;
pub use news::{ArticleCandidate, NewNewsRecord, NewsRecord, RawContent, Source};
pub use rewrite::{ParsedRewrite, RewriteResult};
