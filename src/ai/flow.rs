use std::{
    sync::{Arc, LazyLock},
    time::{Duration, Instant},
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    ai::{
        provider::{GenerateRequest, LlmProvider, Message, MessageRole, Part},
        tool,
    },
    art,
    config::Settings,
    dedup::dedupe_songs,
    error::{Result, TuneflowError},
    management::{AI_RESULT_TTL, CacheStore},
    types::{Comment, Song, SongGuess, SongList},
    utils, youtube,
};

pub const MAX_PROMPT_LENGTH: usize = 2048;

/// A batch that yields this many songs is taken to be a tracklist.
const TRACKLIST_THRESHOLD: usize = 5;
const MAX_TOOL_ROUNDS: usize = 5;

static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Presentation}\x{200D}\x{FE0F}]+")
        .expect("valid emoji regex")
});
static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}:\d{2}(?::\d{2})?\b").expect("valid timestamp regex")
});
static EDITED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bEdited\b").expect("valid edited regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("valid code fence regex")
});

const EXTRACTION_PROMPT: &str = "You are an AI that extracts song titles and artists from YouTube comments.

The user will provide a comment, and you will return a list of songs mentioned in the comment.

Use the extractSongInfo tool to extract the song title and artist from the comment text. Be as accurate as possible. Look for patterns like \"Artist - Title\" or \"Title by Artist\".

Answer only with JSON of the form {\"songs\": [{\"title\": \"...\", \"artist\": \"...\"}]}. Use an empty list when no song is mentioned.";

/// Input of one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(default)]
    pub youtube_url: String,
    #[serde(default)]
    pub prioritize_pinned_comments: bool,
    #[serde(default)]
    pub scan_description: bool,
    #[serde(default)]
    pub chapters: Option<String>,
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Removes emoji, timestamps and "Edited" markers, then collapses whitespace.
pub fn clean_text(text: &str) -> String {
    let cleaned = EMOJI.replace_all(text, "");
    let cleaned = TIMESTAMP.replace_all(&cleaned, "");
    let cleaned = EDITED.replace_all(&cleaned, "");
    WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
}

/// Caps `text` at [`MAX_PROMPT_LENGTH`] characters.
pub fn truncate_prompt(text: &str, label: &str) -> String {
    let length = text.chars().count();
    tracing::debug!(label, length, "prompt length");
    if length > MAX_PROMPT_LENGTH {
        tracing::warn!(label, length, "prompt exceeds {MAX_PROMPT_LENGTH} chars, truncating");
        return text.chars().take(MAX_PROMPT_LENGTH).collect();
    }
    text.to_string()
}

/// Packs comments greedily into batches that fit one prompt.
pub fn batch_comments(comments: &[String]) -> Vec<Vec<String>> {
    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_length = 0;

    for comment in comments {
        let entry_length = format!("Comment {}:\n{}\n---\n", current.len() + 1, comment)
            .chars()
            .count();
        if current_length + entry_length > MAX_PROMPT_LENGTH && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            current_length = 0;
        }
        current.push(comment.clone());
        current_length += entry_length;
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

pub fn batch_prompt(batch: &[String]) -> String {
    batch
        .iter()
        .enumerate()
        .map(|(i, comment)| format!("Comment {}:\n{}", i + 1, comment))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Parses the model's final answer, tolerating code fences and chatter.
pub fn parse_songs(text: &str) -> Vec<SongGuess> {
    let trimmed = text.trim();
    let unfenced = CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    let parsed = serde_json::from_str::<SongList>(unfenced).ok().or_else(|| {
        let start = unfenced.find('{')?;
        let end = unfenced.rfind('}')?;
        serde_json::from_str::<SongList>(unfenced.get(start..=end)?).ok()
    });

    match parsed {
        Some(list) => list
            .songs
            .into_iter()
            .filter(|s| !s.title.trim().is_empty())
            .collect(),
        None => {
            tracing::warn!("model output was not a song list");
            Vec::new()
        }
    }
}

#[derive(Default)]
struct PromptStats {
    calls: u32,
    total: Duration,
}

/// The extraction pipeline: sources, batched prompts, dedup and art.
pub struct SongExtractor {
    settings: Arc<Settings>,
    llm: Arc<dyn LlmProvider>,
    cache: Arc<dyn CacheStore>,
}

impl SongExtractor {
    pub fn new(settings: Arc<Settings>, llm: Arc<dyn LlmProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self { settings, llm, cache }
    }

    /// Runs a full extraction and returns unique songs with any cached art.
    pub async fn extract(&self, request: &ExtractRequest) -> Result<Vec<Song>> {
        let started = Instant::now();
        let mut stats = PromptStats::default();

        if let Some(chapters) = request.chapters.as_deref().filter(|c| !c.trim().is_empty()) {
            let text = truncate_prompt(&clean_text(chapters), "chapters");
            let songs = match self.cached_prompt("chapters", &text, false, &mut stats).await {
                Ok(songs) => songs,
                Err(e) => {
                    tracing::error!(error = %e, "chapter extraction failed");
                    Vec::new()
                }
            };
            let songs = songs.into_iter().map(Song::from).collect();
            return Ok(art::attach_cached_art(&self.settings, &self.cache, songs).await);
        }

        let video_id = utils::parse_video_id(&request.youtube_url)?;

        let comments = match &request.comments {
            Some(comments) => comments.clone(),
            None => {
                youtube::fetch_comments(&self.settings, &video_id, request.prioritize_pinned_comments)
                    .await?
            }
        };
        tracing::info!(video_id, comments = comments.len(), "processing comments");

        let description = if request.scan_description {
            match &request.description {
                Some(description) => description.clone(),
                None => youtube::fetch_description(&self.settings, &video_id)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "could not fetch video description");
                        String::new()
                    }),
            }
        } else {
            String::new()
        };

        let texts: Vec<String> = comments
            .iter()
            .filter_map(|c| c.text.as_deref())
            .map(clean_text)
            .filter(|t| !t.is_empty())
            .collect();

        let mut guesses: Vec<SongGuess> = Vec::new();
        for batch in batch_comments(&texts) {
            let prompt = truncate_prompt(&batch_prompt(&batch), &format!("batch of {}", batch.len()));
            let songs = match self.cached_prompt("ai", &prompt, true, &mut stats).await {
                Ok(songs) => songs,
                Err(e) => {
                    tracing::error!(error = %e, "comment batch extraction failed");
                    Vec::new()
                }
            };
            let found = songs.len();
            guesses.extend(songs);

            if request.prioritize_pinned_comments && found >= TRACKLIST_THRESHOLD {
                tracing::info!(songs = found, "tracklist detected, skipping remaining comments");
                break;
            }
        }

        if !description.trim().is_empty() {
            let text = truncate_prompt(&clean_text(&description), "description");
            match self.cached_prompt("ai", &text, true, &mut stats).await {
                Ok(songs) => guesses.extend(songs),
                Err(e) => tracing::error!(error = %e, "description extraction failed"),
            }
        }

        let songs = dedupe_songs(guesses.into_iter().map(Song::from).collect());
        let avg_ms = if stats.calls > 0 {
            stats.total.as_millis() / u128::from(stats.calls)
        } else {
            0
        };
        tracing::info!(
            provider = self.llm.name(),
            ai_calls = stats.calls,
            ai_ms = stats.total.as_millis() as u64,
            avg_ms = avg_ms as u64,
            elapsed_ms = started.elapsed().as_millis() as u64,
            unique_songs = songs.len(),
            "extraction finished"
        );

        Ok(art::attach_cached_art(&self.settings, &self.cache, songs).await)
    }

    /// Extracts songs from an already prepared prompt, going through the cache.
    async fn cached_prompt(
        &self,
        namespace: &str,
        text: &str,
        cache_empty: bool,
        stats: &mut PromptStats,
    ) -> Result<Vec<SongGuess>> {
        let key = format!("{namespace}:{}", utils::digest(text));

        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<SongList>(&cached) {
                Ok(list) if cache_empty || !list.songs.is_empty() => {
                    tracing::debug!(namespace, "ai cache hit");
                    return Ok(list.songs);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "ignoring unreadable ai cache entry"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ai cache read failed"),
        }

        let started = Instant::now();
        let songs = self.run_prompt(text).await?;
        stats.calls += 1;
        stats.total += started.elapsed();

        if cache_empty || !songs.is_empty() {
            let value = serde_json::to_string(&SongList { songs: songs.clone() })?;
            if let Err(e) = self.cache.set(&key, &value, AI_RESULT_TTL).await {
                tracing::warn!(error = %e, "ai cache write failed");
            }
        }

        Ok(songs)
    }

    /// One prompt with a bounded tool loop.
    async fn run_prompt(&self, text: &str) -> Result<Vec<SongGuess>> {
        let mut messages = vec![Message::user_text(format!(
            "{EXTRACTION_PROMPT}\n\nComment: {text}"
        ))];
        let tools = vec![tool::extract_song_info_tool()];

        for _ in 0..MAX_TOOL_ROUNDS {
            let response = self
                .llm
                .generate(GenerateRequest {
                    messages: messages.clone(),
                    tools: tools.clone(),
                    temperature: None,
                })
                .await?;

            if response.tool_calls.is_empty() {
                return Ok(parse_songs(response.text.as_deref().unwrap_or_default()));
            }

            let mut model_parts = Vec::new();
            if let Some(text) = response.text {
                model_parts.push(Part::Text(text));
            }
            let results = response
                .tool_calls
                .iter()
                .map(|call| Part::ToolResult {
                    name: call.name.clone(),
                    response: tool::execute(call),
                })
                .collect();
            model_parts.extend(response.tool_calls.into_iter().map(Part::ToolCall));

            messages.push(Message {
                role: MessageRole::Model,
                parts: model_parts,
            });
            messages.push(Message {
                role: MessageRole::User,
                parts: results,
            });
        }

        Err(TuneflowError::llm(format!(
            "model kept calling tools after {MAX_TOOL_ROUNDS} rounds"
        )))
    }
}
