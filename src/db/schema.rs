pub const SCHEMA: &str = r#"
-- url is the dedup key; existence is checked before each insert
CREATE TABLE IF NOT EXISTS news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT,
    scraped_title TEXT,
    title TEXT,
    summary TEXT,
    image_url TEXT,
    scraped_text TEXT,
    rewritten_article TEXT,
    input_tokens TEXT,
    output_tokens TEXT,
    cost TEXT,
    source TEXT,
    date TEXT
);

CREATE INDEX IF NOT EXISTS idx_news_url ON news(url);
CREATE INDEX IF NOT EXISTS idx_news_date ON news(date);
"#;
