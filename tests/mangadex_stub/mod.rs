use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

#[allow(dead_code)]
pub const PAGE_BYTES: &[u8] = b"page-bytes";
#[allow(dead_code)]
pub const COVER_BYTES: &[u8] = b"cover-bytes";

#[derive(Debug, Clone)]
pub struct StubChapter {
    pub id: String,
    pub number: Option<String>,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StubGroup {
    pub id: String,
    pub name: String,
    /// Sent inline on chapter listings; otherwise only `/group/{id}` knows it.
    pub inline: bool,
}

#[derive(Debug, Clone)]
pub struct StubManga {
    pub id: String,
    pub title: String,
    pub chapters: Vec<StubChapter>,
    pub groups: Vec<StubGroup>,
}

#[allow(dead_code)]
pub fn chapter(id: &str, number: Option<&str>, group_id: Option<&str>) -> StubChapter {
    StubChapter {
        id: id.to_owned(),
        number: number.map(str::to_owned),
        group_id: group_id.map(str::to_owned),
    }
}

#[allow(dead_code)]
pub fn group(id: &str, name: &str, inline: bool) -> StubGroup {
    StubGroup {
        id: id.to_owned(),
        name: name.to_owned(),
        inline,
    }
}

/// Serves just enough of the MangaDex API, at-home image network and uploads
/// host for one manga. Every request path (with query) is recorded.
pub struct MangadexStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl MangadexStub {
    pub fn spawn(manga: StubManga) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start mangadex stub server");
        let base_url = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let log = Arc::clone(&requests);
        let stub_base = base_url.clone();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let raw = request.url().to_string();
                log.lock().expect("request log").push(raw.clone());

                let parsed = url::Url::parse(&format!("http://stub{raw}")).expect("parse path");
                let query: Vec<(String, String)> = parsed
                    .query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                let segments: Vec<&str> = parsed
                    .path_segments()
                    .map(|s| s.collect())
                    .unwrap_or_default();

                let response = match segments.as_slice() {
                    ["chapter"] => Reply::Json(200, chapter_list(&manga, &query)),
                    ["chapter", id] => match manga.chapters.iter().find(|c| c.id == *id) {
                        Some(c) => Reply::Json(200, chapter_info(&manga, c)),
                        None => not_found(),
                    },
                    ["at-home", "server", id] => Reply::Json(
                        200,
                        json!({
                            "result": "ok",
                            "baseUrl": stub_base,
                            "chapter": { "hash": id, "data": ["x1-a.png", "x2-b.jpg"] }
                        }),
                    ),
                    ["data", _hash, _file] => Reply::Bytes(PAGE_BYTES),
                    ["group", id] => match manga.groups.iter().find(|g| g.id == *id) {
                        Some(g) => Reply::Json(
                            200,
                            json!({ "data": { "id": g.id, "type": "scanlation_group", "attributes": { "name": g.name } } }),
                        ),
                        None => not_found(),
                    },
                    ["manga", id] if *id == manga.id => Reply::Json(200, manga_info(&manga)),
                    ["cover"] => Reply::Json(
                        200,
                        json!({
                            "data": [
                                { "id": "cv1", "type": "cover_art", "attributes": { "volume": "1", "fileName": "old.jpg" } },
                                { "id": "cv2", "type": "cover_art", "attributes": { "volume": "2", "fileName": "cover.png" } },
                                { "id": "cv0", "type": "cover_art", "attributes": { "volume": null, "fileName": "none.jpg" } }
                            ]
                        }),
                    ),
                    ["covers", _manga, _file] => Reply::Bytes(COVER_BYTES),
                    _ => not_found(),
                };

                let _ = match response {
                    Reply::Json(status, body) => request.respond(
                        tiny_http::Response::from_string(body.to_string())
                            .with_status_code(status)
                            .with_header(header("Content-Type", "application/json")),
                    ),
                    Reply::Bytes(bytes) => request.respond(
                        tiny_http::Response::from_data(bytes.to_vec())
                            .with_header(header("Content-Type", "application/octet-stream")),
                    ),
                };
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }

    /// Chapter ids whose pages were requested through the at-home endpoint.
    pub fn downloaded_chapters(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.strip_prefix("/at-home/server/"))
            .map(str::to_owned)
            .collect()
    }
}

impl Drop for MangadexStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

enum Reply {
    Json(u16, Value),
    Bytes(&'static [u8]),
}

fn not_found() -> Reply {
    Reply::Json(
        404,
        json!({ "result": "error", "errors": [{ "status": 404, "title": "Not Found" }] }),
    )
}

fn header(name: &str, value: &str) -> tiny_http::Header {
    tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("valid header")
}

fn param<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn chapter_resource(manga: &StubManga, c: &StubChapter) -> Value {
    let mut relationships = vec![json!({ "id": manga.id, "type": "manga" })];
    if let Some(group_id) = &c.group_id {
        let inline = manga.groups.iter().find(|g| g.id == *group_id && g.inline);
        relationships.push(match inline {
            Some(g) => json!({ "id": g.id, "type": "scanlation_group", "attributes": { "name": g.name } }),
            None => json!({ "id": group_id, "type": "scanlation_group" }),
        });
    }
    json!({
        "id": c.id,
        "type": "chapter",
        "attributes": { "chapter": c.number, "translatedLanguage": "en" },
        "relationships": relationships
    })
}

fn chapter_list(manga: &StubManga, query: &[(String, String)]) -> Value {
    if param(query, "manga") != Some(manga.id.as_str()) {
        return json!({ "result": "ok", "data": [], "limit": 100, "offset": 0, "total": 0 });
    }

    if param(query, "order[chapter]") == Some("desc") {
        let latest = manga
            .chapters
            .iter()
            .filter(|c| c.number.as_deref().and_then(|n| n.parse::<f64>().ok()).is_some())
            .max_by(|a, b| {
                let n = |c: &StubChapter| c.number.as_deref().unwrap_or("0").parse::<f64>().unwrap_or(0.0);
                n(a).total_cmp(&n(b))
            });
        let data: Vec<Value> = latest.into_iter().map(|c| chapter_resource(manga, c)).collect();
        return json!({ "result": "ok", "data": data, "limit": 1, "offset": 0, "total": manga.chapters.len() });
    }

    let limit = param(query, "limit").and_then(|v| v.parse::<usize>().ok()).unwrap_or(100);
    let offset = param(query, "offset").and_then(|v| v.parse::<usize>().ok()).unwrap_or(0);
    let data: Vec<Value> = manga
        .chapters
        .iter()
        .skip(offset)
        .take(limit)
        .map(|c| chapter_resource(manga, c))
        .collect();
    json!({
        "result": "ok",
        "data": data,
        "limit": limit,
        "offset": offset,
        "total": manga.chapters.len()
    })
}

fn chapter_info(manga: &StubManga, c: &StubChapter) -> Value {
    json!({ "result": "ok", "data": chapter_resource(manga, c) })
}

fn manga_info(manga: &StubManga) -> Value {
    json!({
        "result": "ok",
        "data": {
            "id": manga.id,
            "type": "manga",
            "attributes": {
                "title": { "en": manga.title },
                "description": { "en": "A striker story." },
                "status": "ongoing",
                "tags": [
                    { "id": "t1", "type": "tag", "attributes": { "name": { "en": "Sports" } } },
                    { "id": "t2", "type": "tag", "attributes": { "name": { "en": "Drama" } } }
                ]
            },
            "relationships": [
                { "id": "au1", "type": "author", "attributes": { "name": "Kaneshiro Muneyuki" } },
                { "id": "ar1", "type": "artist", "attributes": { "name": "Nomura Yusuke" } },
                { "id": "cv2", "type": "cover_art", "attributes": { "fileName": "cover.png" } }
            ]
        }
    })
}
