//! Provider payload builders shared by the end-to-end suites.

#![allow(dead_code)]

use serde_json::{json, Value};

pub const DEEZER_ARTIST_ID: i64 = 27;
pub const JAMENDO_CLIENT_ID: &str = "test-client-id";

pub fn deezer_track_json(id: i64, title: &str, artist_id: i64, artist_name: &str) -> Value {
    json!({
        "id": id,
        "readable": true,
        "title": title,
        "duration": 224,
        "preview": format!("https://cdn.example/preview/{}.mp3", id),
        "artist": {"id": artist_id, "name": artist_name, "type": "artist"},
        "album": {
            "id": id * 10,
            "title": "Album",
            "cover_medium": format!("https://cdn.example/{}/medium.jpg", id),
            "cover_big": format!("https://cdn.example/{}/big.jpg", id),
            "cover_xl": format!("https://cdn.example/{}/xl.jpg", id)
        },
        "type": "track"
    })
}

/// A Deezer `data` envelope with `count` tracks by one artist, ids starting at `first_id`.
pub fn deezer_page(first_id: i64, count: i64, artist_id: i64) -> Value {
    let data: Vec<Value> = (first_id..first_id + count)
        .map(|id| deezer_track_json(id, &format!("Track {}", id), artist_id, &format!("Artist {}", artist_id)))
        .collect();
    json!({"data": data, "total": count})
}

pub fn jamendo_track_json(id: &str, name: &str, artist_id: &str, artist_name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "duration": 180,
        "artist_id": artist_id,
        "artist_name": artist_name,
        "album_image": format!("https://img.example/{}/album.jpg", id),
        "image": format!("https://img.example/{}/track.jpg", id),
        "audio": format!("https://stream.example/{}.mp3", id),
        "audiodownload": format!("https://download.example/{}.mp3", id)
    })
}

pub fn jamendo_page(tracks: Vec<Value>) -> Value {
    json!({
        "headers": {
            "status": "success",
            "code": 0,
            "error_message": "",
            "warnings": "",
            "results_count": tracks.len()
        },
        "results": tracks
    })
}
