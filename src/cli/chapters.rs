use tabled::Table;

use crate::{
    config::Settings, error, info,
    types::ChapterTableRow,
    utils, youtube,
};

pub async fn chapters(settings: &Settings, url: &str) {
    let video_id = match utils::parse_video_id(url) {
        Ok(id) => id,
        Err(e) => error!("{}", e),
    };

    let pb = super::spinner("Reading video description...");
    let chapters = youtube::fetch_chapters(settings, &video_id).await;
    pb.finish_and_clear();

    if chapters.is_empty() {
        info!("No chapters found for video {}", video_id);
        return;
    }

    let rows: Vec<ChapterTableRow> = chapters
        .into_iter()
        .map(|c| ChapterTableRow {
            start: c.start,
            title: c.title,
        })
        .collect();
    println!("{}", Table::new(rows));
}
