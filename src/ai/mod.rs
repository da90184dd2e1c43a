//! # AI Extraction
//!
//! Turns free text from YouTube (comments, descriptions, chapter lists) into
//! `{title, artist}` guesses with a language model.
//!
//! The model is driven through the [`LlmProvider`] trait so the flow can run
//! against Gemini in production and against scripted providers in tests. Each
//! prompt offers the model the `extractSongInfo` tool, executes any tool calls
//! locally and feeds the results back until the model answers with a JSON
//! song list. Results are memoized in the [`crate::management::CacheStore`]
//! for a day, keyed by a digest of the prompt.

pub mod flow;
pub mod gemini;
pub mod playlist_name;
pub mod provider;
pub mod tool;

pub use flow::{ExtractRequest, SongExtractor, clean_text, truncate_prompt};
pub use gemini::GeminiProvider;
pub use playlist_name::generate_playlist_name;
pub use provider::{
    GenerateRequest, GenerateResponse, LlmProvider, Message, MessageRole, Part, ToolCall,
    ToolDescription,
};
pub use tool::extract_song_info;
