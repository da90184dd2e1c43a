use crate::{
    ai::provider::{GenerateRequest, LlmProvider, Message},
    error::{Result, TuneflowError},
    types::Song,
};

/// Builds the naming prompt from genre hints and up to five songs.
pub fn playlist_name_prompt(genres: &[String], songs: &[Song]) -> String {
    let genres = if genres.is_empty() {
        "various genres".to_string()
    } else {
        genres.join(", ")
    };

    let mut sentences = vec![
        "Create a short, catchy playlist name for a Spotify playlist.".to_string(),
        format!("The playlist contains songs from these genres/categories: {genres}."),
    ];
    if !songs.is_empty() {
        let sample = songs
            .iter()
            .take(5)
            .map(|s| format!("{} by {}", s.title, s.artist))
            .collect::<Vec<_>>()
            .join("; ");
        sentences.push(format!("Here are some of the songs: {sample}."));
    }
    sentences.push(
        "The name should be fun, engaging, and reflect the genres. Only return the name, no extra text."
            .to_string(),
    );

    sentences.join(" ")
}

/// Asks the model for a playlist name.
pub async fn generate_playlist_name(
    llm: &dyn LlmProvider,
    genres: &[String],
    songs: &[Song],
) -> Result<String> {
    let response = llm
        .generate(GenerateRequest {
            messages: vec![Message::user_text(playlist_name_prompt(genres, songs))],
            tools: Vec::new(),
            temperature: Some(0.9),
        })
        .await?;

    let name = response
        .text
        .as_deref()
        .map(|t| t.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .unwrap_or_default();

    if name.is_empty() {
        return Err(TuneflowError::llm("model returned an empty playlist name"));
    }
    Ok(name.to_string())
}
