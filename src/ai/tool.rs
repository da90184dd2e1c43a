use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::{
    ai::provider::{ToolCall, ToolDescription},
    types::SongGuess,
};

pub const EXTRACT_SONG_INFO: &str = "extractSongInfo";

static BY_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+by\s+").expect("valid by separator regex"));

pub fn extract_song_info_tool() -> ToolDescription {
    ToolDescription {
        name: EXTRACT_SONG_INFO.to_string(),
        description: "Extracts song title and artist from a given text.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to extract song information from."
                }
            },
            "required": ["text"]
        }),
    }
}

/// Naive split of `"Artist - Title"` or `"Title by Artist"`.
pub fn extract_song_info(text: &str) -> SongGuess {
    let parts: Vec<&str> = text.split('-').collect();
    if parts.len() >= 2 {
        return SongGuess {
            artist: parts[0].trim().to_string(),
            title: parts[1].trim().to_string(),
        };
    }

    let by_parts: Vec<&str> = BY_SEPARATOR.split(text).collect();
    if by_parts.len() == 2 {
        return SongGuess {
            title: by_parts[0].trim().to_string(),
            artist: by_parts[1].trim().to_string(),
        };
    }

    SongGuess {
        artist: "Unknown".to_string(),
        title: text.trim().to_string(),
    }
}

/// Runs a tool call locally and returns the function response payload.
pub fn execute(call: &ToolCall) -> Value {
    match call.name.as_str() {
        EXTRACT_SONG_INFO => {
            let text = call.arguments["text"].as_str().unwrap_or_default();
            let guess = extract_song_info(text);
            json!({ "title": guess.title, "artist": guess.artist })
        }
        other => {
            tracing::warn!(tool = other, "model called an unknown tool");
            json!({ "error": format!("unknown tool {other}") })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_dash_artist_first() {
        let guess = extract_song_info("Daft Punk - One More Time");
        assert_eq!(guess.artist, "Daft Punk");
        assert_eq!(guess.title, "One More Time");

        // Only the first two parts are used.
        let guess = extract_song_info("Jay-Z - Empire State of Mind");
        assert_eq!(guess.artist, "Jay");
        assert_eq!(guess.title, "Z");
    }

    #[test]
    fn splits_on_by_case_insensitively() {
        let guess = extract_song_info("Hey Jude BY The Beatles");
        assert_eq!(guess.title, "Hey Jude");
        assert_eq!(guess.artist, "The Beatles");
    }

    #[test]
    fn falls_back_to_unknown_artist() {
        let guess = extract_song_info("  just a vibe  ");
        assert_eq!(guess.artist, "Unknown");
        assert_eq!(guess.title, "just a vibe");
    }

    #[test]
    fn executes_known_tool() {
        let call = ToolCall {
            name: EXTRACT_SONG_INFO.into(),
            arguments: json!({ "text": "Adele - Hello" }),
        };
        assert_eq!(execute(&call), json!({ "title": "Hello", "artist": "Adele" }));
    }
}
