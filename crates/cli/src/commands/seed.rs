//! `spiro seed`: Insert sample comments into the configured store.

use spiro_config::AppConfig;
use spiro_core::{Comment, CommentStore};

pub async fn run(
    article_id: u64,
    primaries: usize,
    replies: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = spiro_store::build_from_config(&config.store).await?;

    if store.name() == "memory" {
        println!("⚠️  The memory backend is discarded on exit; set store.backend = \"sqlite\"");
    }

    let inserted = seed_article(store.as_ref(), article_id, primaries, replies).await?;
    let total = store.count(article_id).await?;

    println!("🌱 Seeded article {article_id}");
    println!("   Inserted: {inserted}");
    println!("   Total:    {total}");

    Ok(())
}

/// Insert `primaries` primary comments, each followed by `replies` replies.
pub async fn seed_article(
    store: &dyn CommentStore,
    article_id: u64,
    primaries: usize,
    replies: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut inserted = 0;
    for p in 0..primaries {
        let author = (p % 7) as u64 + 1;
        let primary = Comment::primary(article_id, author, format!("Comment #{}", p + 1))
            .with_author_name(format!("user{author}"));
        let parent = store.insert(primary).await?;
        inserted += 1;

        for r in 0..replies {
            let author = ((p + r + 1) % 7) as u64 + 1;
            let reply = Comment::reply(
                article_id,
                parent,
                author,
                format!("Reply #{} to comment #{}", r + 1, p + 1),
            )
            .with_author_name(format!("user{author}"));
            store.insert(reply).await?;
            inserted += 1;
        }
    }
    Ok(inserted)
}
