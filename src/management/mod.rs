mod auth;
mod cache;

pub use auth::TokenManager;
pub use cache::{
    AI_RESULT_TTL, ALBUM_ART_TTL, CacheStore, FETCH_LOCK_TTL, FileCache, MemoryCache,
    PARSED_SONGS_TTL, build_cache,
};
