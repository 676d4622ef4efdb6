use std::collections::HashMap;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::formats::SCANLATION_GROUP;
use crate::model::ChapterRecord;

pub const PAGE_SIZE: u32 = 100;

/// Label used when the catalog lists a chapter without a number.
pub const MISSING_CHAPTER_NUMBER: &str = "0";

#[derive(Debug, Clone, Default)]
pub struct ChapterPage {
    pub records: Vec<ChapterRecord>,
    /// `(group id, name)` pairs the server already expanded for this page.
    pub groups: Vec<(String, String)>,
    pub total: u64,
}

#[async_trait]
pub trait ChapterSource: Send + Sync {
    async fn fetch_page(
        &self,
        manga_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<ChapterPage, ApiError>;
}

#[derive(Debug, Clone, Default)]
pub struct FetchedChapters {
    pub records: Vec<ChapterRecord>,
    pub included_groups: HashMap<String, String>,
}

/// Walk the listing until an empty page or the reported total. One failed
/// page fails the whole fetch.
pub async fn fetch_all_pages(
    source: &dyn ChapterSource,
    manga_id: &str,
) -> Result<FetchedChapters, ApiError> {
    let mut fetched = FetchedChapters::default();
    let mut offset = 0_u64;

    loop {
        let page = source.fetch_page(manga_id, PAGE_SIZE, offset).await?;
        if page.records.is_empty() {
            break;
        }
        tracing::debug!(
            manga_id,
            offset,
            count = page.records.len(),
            total = page.total,
            "fetched chapter page"
        );

        fetched.records.extend(page.records);
        fetched.included_groups.extend(page.groups);

        offset += u64::from(PAGE_SIZE);
        if offset >= page.total {
            break;
        }
    }

    Ok(fetched)
}

#[async_trait]
impl ChapterSource for ApiClient {
    async fn fetch_page(
        &self,
        manga_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<ChapterPage, ApiError> {
        let response = self.chapter_page(manga_id, limit, offset).await?;

        let mut groups = response
            .included
            .iter()
            .filter(|item| item.kind == SCANLATION_GROUP)
            .filter_map(|item| Some((item.id.clone(), item.name()?.to_owned())))
            .collect::<Vec<_>>();

        let mut records = Vec::with_capacity(response.data.len());
        for chapter in response.data {
            let group_id = match chapter.first_related(SCANLATION_GROUP) {
                Some(group) => {
                    if let Some(name) = group.name() {
                        groups.push((group.id.clone(), name.to_owned()));
                    }
                    Some(group.id.clone())
                }
                None => None,
            };
            let number = chapter
                .attributes
                .chapter
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| MISSING_CHAPTER_NUMBER.to_owned());
            records.push(ChapterRecord {
                id: chapter.id,
                number,
                group_id,
            });
        }

        Ok(ChapterPage {
            records,
            groups,
            total: response.total,
        })
    }
}
