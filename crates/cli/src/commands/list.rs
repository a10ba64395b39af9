//! `spiro list`: Print one page of an article's comments.

use spiro_config::AppConfig;
use spiro_core::{CommentListService, PageRequest};

pub async fn run(
    article_id: u64,
    offset: i64,
    count: i64,
    sub_count: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = spiro_store::build_from_config(&config.store).await?;

    let service = CommentListService::new(store)
        .with_limits(config.pagination.limits())
        .with_serialized_reads(config.pagination.serialize_store_reads);

    let request = PageRequest::new(
        article_id,
        offset,
        count,
        sub_count.unwrap_or(config.pagination.default_sub_comment_count),
    );

    let page = service.get_comment_list(&request).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);

    Ok(())
}
