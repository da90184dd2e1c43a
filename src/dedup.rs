//! Collapsing duplicate song mentions.

use std::collections::HashMap;

use crate::types::Song;

/// Removes duplicates by the case-sensitive `"{title}-{artist}"` key.
///
/// Each key keeps the position of its first occurrence and the value of its
/// last one, so a later mention carrying more detail wins.
pub fn dedupe_songs(songs: Vec<Song>) -> Vec<Song> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Song> = Vec::with_capacity(songs.len());

    for song in songs {
        let key = song.dedup_key();
        match positions.get(&key) {
            Some(&index) => unique[index] = song,
            None => {
                positions.insert(key, unique.len());
                unique.push(song);
            }
        }
    }

    unique
}
