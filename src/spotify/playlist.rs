use crate::{
    config::Settings,
    error::{Result, TuneflowError},
    spotify::send,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        CreatePlaylistResponse, SpotifyPlaylist, SpotifyUser,
    },
    utils,
};

pub const PLAYLIST_DESCRIPTION: &str = "Created by TuneFlow. https://tuneflow.chron0.tech";

/// Spotify accepts at most 100 URIs per add-items request.
const TRACKS_PER_REQUEST: usize = 100;

/// Id of the user owning `access_token`.
pub async fn current_user(settings: &Settings, access_token: &str) -> Result<SpotifyUser> {
    let request = utils::http_client()
        .get(format!("{}/me", settings.spotify_api_url))
        .bearer_auth(access_token);

    let response = send(request).await?;
    Ok(response.json::<SpotifyUser>().await?)
}

/// Creates a playlist for the current user and fills it with `track_uris`.
pub async fn create_playlist(
    settings: &Settings,
    access_token: &str,
    name: &str,
    track_uris: &[String],
    public: bool,
) -> Result<SpotifyPlaylist> {
    if name.trim().is_empty() || track_uris.is_empty() {
        return Err(TuneflowError::invalid_input(
            "Missing or invalid playlistName or trackUris",
        ));
    }

    let user = current_user(settings, access_token).await?;
    let client = utils::http_client();

    let request = client
        .post(format!("{}/users/{}/playlists", settings.spotify_api_url, user.id))
        .bearer_auth(access_token)
        .json(&CreatePlaylistRequest {
            name: name.trim().to_string(),
            description: PLAYLIST_DESCRIPTION.to_string(),
            public,
        });
    let playlist = send(request).await?.json::<CreatePlaylistResponse>().await?;

    tracing::info!(
        playlist_id = %playlist.id,
        tracks = track_uris.len(),
        "created spotify playlist"
    );

    for chunk in track_uris.chunks(TRACKS_PER_REQUEST) {
        let request = client
            .post(format!(
                "{}/playlists/{}/tracks",
                settings.spotify_api_url, playlist.id
            ))
            .bearer_auth(access_token)
            .json(&AddTrackToPlaylistRequest {
                uris: chunk.to_vec(),
            });
        let added = send(request).await?.json::<AddTrackToPlaylistResponse>().await?;
        tracing::debug!(snapshot = %added.snapshot_id, count = chunk.len(), "added tracks");
    }

    Ok(SpotifyPlaylist {
        playlist_id: playlist.id,
        playlist_url: playlist.external_urls.spotify,
    })
}
