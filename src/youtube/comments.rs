use reqwest::Client;

use crate::{
    config::Settings,
    error::{Result, TuneflowError},
    types::{Comment, CommentThread, CommentThreadListResponse},
    utils,
};

const PAGE_SIZE: &str = "100";

/// Fetches top-level comments for a video.
///
/// With `prioritize_pinned` a single page is requested and only comments
/// flagged `pinned` are kept. Otherwise up to `settings.comment_pages` pages are
/// fetched in relevance order (most liked first), following `nextPageToken`.
pub async fn fetch_comments(
    settings: &Settings,
    video_id: &str,
    prioritize_pinned: bool,
) -> Result<Vec<Comment>> {
    if video_id.trim().is_empty() {
        return Err(TuneflowError::invalid_input("Video ID is required"));
    }

    let api_key = settings.youtube_api_key()?;
    let client = utils::http_client();
    let api_url = format!("{}/commentThreads", settings.youtube_api_url);

    if prioritize_pinned {
        let page = fetch_page(&client, &api_url, api_key, video_id, None, false).await?;
        let pinned = page
            .items
            .into_iter()
            .filter(is_pinned)
            .map(to_comment)
            .collect();
        return Ok(pinned);
    }

    let mut all_comments = Vec::new();
    let mut next_page_token: Option<String> = None;
    let mut fetched_pages = 0;

    loop {
        let page = fetch_page(
            &client,
            &api_url,
            api_key,
            video_id,
            next_page_token.as_deref(),
            true,
        )
        .await?;

        all_comments.extend(page.items.into_iter().map(to_comment));
        fetched_pages += 1;
        next_page_token = page.next_page_token;

        if next_page_token.is_none() || fetched_pages >= settings.comment_pages {
            break;
        }
    }

    tracing::debug!(
        video_id,
        comments = all_comments.len(),
        pages = fetched_pages,
        "fetched youtube comments"
    );
    Ok(all_comments)
}

async fn fetch_page(
    client: &Client,
    api_url: &str,
    api_key: &str,
    video_id: &str,
    page_token: Option<&str>,
    by_relevance: bool,
) -> Result<CommentThreadListResponse> {
    let mut query: Vec<(&str, &str)> = vec![
        ("part", "snippet"),
        ("videoId", video_id),
        ("maxResults", PAGE_SIZE),
        ("textFormat", "plainText"),
        ("key", api_key),
    ];
    if by_relevance {
        query.push(("order", "relevance"));
    }
    if let Some(token) = page_token {
        query.push(("pageToken", token));
    }

    let response = client.get(api_url).query(&query).send().await?;
    if !response.status().is_success() {
        return Err(TuneflowError::from_response("YouTube", response).await);
    }

    Ok(response.json::<CommentThreadListResponse>().await?)
}

fn is_pinned(thread: &CommentThread) -> bool {
    thread
        .snippet
        .as_ref()
        .and_then(|s| s.top_level_comment.as_ref())
        .and_then(|c| c.snippet.as_ref())
        .and_then(|s| s.pinned)
        .unwrap_or(false)
}

fn to_comment(thread: CommentThread) -> Comment {
    let snippet = thread
        .snippet
        .and_then(|s| s.top_level_comment)
        .and_then(|c| c.snippet);

    match snippet {
        Some(s) => Comment {
            id: thread.id,
            author: s.author_display_name,
            text: s.text_display,
            published_at: s.published_at,
        },
        None => Comment {
            id: thread.id,
            ..Comment::default()
        },
    }
}
