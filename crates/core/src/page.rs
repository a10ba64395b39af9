//! Hierarchical page assembly.
//!
//! A page is fetched with one over-fetched range read: `primary_count + 1`
//! primaries and `sub_count + 1` replies per primary. The extra element at
//! each level is a probe. If it came back, more items exist beyond the page
//! and the probe is dropped before the page is returned.
//!
//! The store cannot know in advance which primary will be the probe, so it
//! also returns that primary's replies. Those are discarded here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::comment::{ArticleId, CommentId, CommentPageResult, PrimaryCommentView};
use crate::error::{Error, Result};
use crate::store::{RangeFetch, RangeQuery};

/// Raw pagination arguments as received from a caller.
///
/// Counts are signed so that negative input can be reported instead of
/// failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub article_id: ArticleId,
    pub primary_offset: i64,
    pub primary_count: i64,
    pub sub_count: i64,
}

/// Upper bounds on page sizes. `None` leaves a dimension unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    #[serde(default)]
    pub max_primary_count: Option<u64>,
    #[serde(default)]
    pub max_sub_count: Option<u64>,
}

/// A validated page request. Only [`PageRequest::validate`] builds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    article_id: ArticleId,
    offset: u64,
    primary_count: u64,
    sub_count: u64,
}

impl PageRequest {
    pub fn new(article_id: ArticleId, primary_offset: i64, primary_count: i64, sub_count: i64) -> Self {
        Self {
            article_id,
            primary_offset,
            primary_count,
            sub_count,
        }
    }

    /// Reject negative arguments and counts above `limits`.
    pub fn validate(&self, limits: &PageLimits) -> Result<PageWindow> {
        let offset = non_negative(
            self.primary_offset,
            "primary_comment_offset",
            "primary comment offset is less than 0",
        )?;
        let primary_count = non_negative(
            self.primary_count,
            "primary_comment_count",
            "primary comment count is less than 0",
        )?;
        let sub_count = non_negative(
            self.sub_count,
            "sub_comment_count",
            "sub comment count is less than 0",
        )?;

        if let Some(max) = limits.max_primary_count.filter(|max| primary_count > *max) {
            return Err(Error::invalid_argument(
                "primary_comment_count",
                format!("primary comment count is greater than {max}"),
            ));
        }
        if let Some(max) = limits.max_sub_count.filter(|max| sub_count > *max) {
            return Err(Error::invalid_argument(
                "sub_comment_count",
                format!("sub comment count is greater than {max}"),
            ));
        }

        Ok(PageWindow {
            article_id: self.article_id,
            offset,
            primary_count,
            sub_count,
        })
    }
}

fn non_negative(value: i64, argument: &'static str, message: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::invalid_argument(argument, message))
}

impl PageWindow {
    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn primary_count(&self) -> u64 {
        self.primary_count
    }

    pub fn sub_count(&self) -> u64 {
        self.sub_count
    }

    /// The store read for this window, with one probe element per level.
    pub fn range_query(&self) -> RangeQuery {
        RangeQuery {
            article_id: self.article_id,
            offset: self.offset,
            primary_limit: self.primary_count.saturating_add(1),
            sub_limit_per_primary: self.sub_count.saturating_add(1),
        }
    }
}

/// Turn an over-fetched [`RangeFetch`] into the page for `window`.
pub fn assemble(window: &PageWindow, fetch: RangeFetch) -> CommentPageResult {
    if !fetch.found {
        return CommentPageResult::empty(window.article_id);
    }

    let RangeFetch {
        mut primaries,
        subs,
        ..
    } = fetch;

    // Primary probe.
    let mut excluded: Option<CommentId> = None;
    let primary_is_more = primaries.len() as u64 == window.primary_count.saturating_add(1);
    if primary_is_more {
        excluded = primaries.pop().map(|probe| probe.comment_id);
    }

    let positions: HashMap<CommentId, usize> = primaries
        .iter()
        .enumerate()
        .map(|(i, c)| (c.comment_id, i))
        .collect();
    let mut comment_list: Vec<PrimaryCommentView> =
        primaries.into_iter().map(PrimaryCommentView::new).collect();

    for sub in subs {
        if Some(sub.parent_comment_id) == excluded {
            continue;
        }
        match positions.get(&sub.parent_comment_id) {
            Some(&i) => comment_list[i].sub_comment_list.push(sub),
            None => debug!(
                comment_id = sub.comment_id,
                parent_comment_id = sub.parent_comment_id,
                "Dropping reply whose parent is not on the page"
            ),
        }
    }

    // Reply probes. With sub_count = 0 a lone probe leaves an empty list
    // that still reports more replies.
    let reply_probe_len = window.sub_count.saturating_add(1);
    for view in &mut comment_list {
        view.is_more = view.sub_comment_list.len() as u64 == reply_probe_len;
        if view.is_more {
            view.sub_comment_list.pop();
        }
    }

    CommentPageResult {
        article_id: window.article_id,
        comment_list,
        is_more: primary_is_more,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::Comment;

    fn primary(id: CommentId) -> Comment {
        Comment::primary(7, 1, format!("primary {id}")).with_id(id)
    }

    fn reply(parent: CommentId, id: CommentId) -> Comment {
        Comment::reply(7, parent, 2, format!("reply {id}")).with_id(id)
    }

    fn window(primary_count: i64, sub_count: i64) -> PageWindow {
        PageRequest::new(7, 0, primary_count, sub_count)
            .validate(&PageLimits::default())
            .unwrap()
    }

    fn ids(comments: &[Comment]) -> Vec<CommentId> {
        comments.iter().map(|c| c.comment_id).collect()
    }

    #[test]
    fn window_keeps_validated_values() {
        let window = PageRequest::new(7, 4, 10, 3)
            .validate(&PageLimits::default())
            .unwrap();
        assert_eq!(window.article_id(), 7);
        assert_eq!(window.offset(), 4);
        assert_eq!(window.primary_count(), 10);
        assert_eq!(window.sub_count(), 3);

        let query = window.range_query();
        assert_eq!(query.primary_limit, 11);
        assert_eq!(query.sub_limit_per_primary, 4);
    }

    #[test]
    fn negative_arguments_rejected() {
        let limits = PageLimits::default();
        let cases = [
            (PageRequest::new(7, -1, 10, 5), "primary_comment_offset"),
            (PageRequest::new(7, 0, -1, 5), "primary_comment_count"),
            (PageRequest::new(7, 0, 10, -1), "sub_comment_count"),
        ];
        for (request, expected) in cases {
            match request.validate(&limits) {
                Err(Error::InvalidArgument { argument, .. }) => assert_eq!(argument, expected),
                other => panic!("expected InvalidArgument for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn offset_is_checked_first() {
        let err = PageRequest::new(7, -5, -5, -5)
            .validate(&PageLimits::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: primary comment offset is less than 0"
        );
    }

    #[test]
    fn limits_cap_counts() {
        let limits = PageLimits {
            max_primary_count: Some(128),
            max_sub_count: Some(20),
        };
        assert!(PageRequest::new(7, 0, 128, 20).validate(&limits).is_ok());
        assert!(PageRequest::new(7, 0, 129, 20).validate(&limits).is_err());
        assert!(PageRequest::new(7, 0, 10, 21).validate(&limits).is_err());
    }

    #[test]
    fn range_query_adds_probes() {
        let window = PageRequest::new(7, 30, 10, 3)
            .validate(&PageLimits::default())
            .unwrap();
        let query = window.range_query();
        assert_eq!(query.article_id, 7);
        assert_eq!(query.offset, 30);
        assert_eq!(query.primary_limit, 11);
        assert_eq!(query.sub_limit_per_primary, 4);
    }

    #[test]
    fn not_found_yields_empty_page() {
        let page = assemble(&window(10, 5), RangeFetch::not_found());
        assert_eq!(page, CommentPageResult::empty(7));
    }

    #[test]
    fn truncated_primary_and_its_replies_are_dropped() {
        // primary_count=2, sub_count=1, P3 is the probe.
        let fetch = RangeFetch::new(
            vec![primary(1), primary(2), primary(3)],
            vec![reply(1, 11), reply(1, 12), reply(3, 19)],
        );
        let page = assemble(&window(2, 1), fetch);

        assert!(page.is_more);
        assert_eq!(page.comment_list.len(), 2);

        let p1 = &page.comment_list[0];
        assert_eq!(p1.comment.comment_id, 1);
        assert_eq!(ids(&p1.sub_comment_list), vec![11]);
        assert!(p1.is_more);

        let p2 = &page.comment_list[1];
        assert_eq!(p2.comment.comment_id, 2);
        assert!(p2.sub_comment_list.is_empty());
        assert!(!p2.is_more);

        let all_replies: Vec<CommentId> = page
            .comment_list
            .iter()
            .flat_map(|p| ids(&p.sub_comment_list))
            .collect();
        assert!(!all_replies.contains(&19));
    }

    #[test]
    fn short_window_keeps_every_primary_in_order() {
        let fetch = RangeFetch::new(vec![primary(5), primary(3), primary(9)], vec![]);
        let page = assemble(&window(5, 2), fetch);

        assert!(!page.is_more);
        let order: Vec<CommentId> = page.comment_list.iter().map(|p| p.comment.comment_id).collect();
        assert_eq!(order, vec![5, 3, 9]);
    }

    #[test]
    fn exact_page_is_not_more() {
        let fetch = RangeFetch::new(
            vec![primary(1), primary(2)],
            vec![reply(1, 11), reply(1, 12), reply(2, 21)],
        );
        let page = assemble(&window(2, 2), fetch);

        assert!(!page.is_more);
        assert_eq!(ids(&page.comment_list[0].sub_comment_list), vec![11, 12]);
        assert!(!page.comment_list[0].is_more);
        assert_eq!(ids(&page.comment_list[1].sub_comment_list), vec![21]);
        assert!(!page.comment_list[1].is_more);
    }

    #[test]
    fn replies_keep_input_order() {
        let fetch = RangeFetch::new(
            vec![primary(1), primary(2)],
            vec![reply(2, 30), reply(1, 20), reply(2, 10), reply(1, 5)],
        );
        let page = assemble(&window(2, 5), fetch);

        assert_eq!(ids(&page.comment_list[0].sub_comment_list), vec![20, 5]);
        assert_eq!(ids(&page.comment_list[1].sub_comment_list), vec![30, 10]);
    }

    #[test]
    fn zero_sub_count_reports_more_with_empty_list() {
        let fetch = RangeFetch::new(vec![primary(1), primary(2)], vec![reply(1, 11)]);
        let page = assemble(&window(2, 0), fetch);

        let p1 = &page.comment_list[0];
        assert!(p1.sub_comment_list.is_empty());
        assert!(p1.is_more);
        assert!(!page.comment_list[1].is_more);
    }

    #[test]
    fn zero_primary_count_only_probes() {
        let fetch = RangeFetch::new(vec![primary(1)], vec![reply(1, 11)]);
        let page = assemble(&window(0, 3), fetch);

        assert!(page.comment_list.is_empty());
        assert!(page.is_more);
    }

    #[test]
    fn orphan_reply_is_dropped() {
        let fetch = RangeFetch::new(vec![primary(1)], vec![reply(1, 11), reply(99, 12)]);
        let page = assemble(&window(3, 3), fetch);

        assert_eq!(page.comment_count(), 2);
        assert_eq!(ids(&page.comment_list[0].sub_comment_list), vec![11]);
    }

    #[test]
    fn zero_id_primary_is_not_mistaken_for_excluded() {
        // No truncation happens here; a primary that really has id 0 keeps
        // its replies.
        let fetch = RangeFetch::new(vec![primary(0), primary(4)], vec![reply(0, 8)]);
        let page = assemble(&window(5, 5), fetch);

        assert!(!page.is_more);
        assert_eq!(ids(&page.comment_list[0].sub_comment_list), vec![8]);
    }

    #[test]
    fn assembly_is_deterministic() {
        let fetch = RangeFetch::new(
            vec![primary(1), primary(2), primary(3)],
            vec![reply(1, 11), reply(2, 21), reply(2, 22), reply(3, 31)],
        );
        let w = window(2, 1);
        let first = serde_json::to_string(&assemble(&w, fetch.clone())).unwrap();
        let second = serde_json::to_string(&assemble(&w, fetch)).unwrap();
        assert_eq!(first, second);
    }
}
