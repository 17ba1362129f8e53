use crate::features::vip::types::PlanId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PER_PAGE: u32 = 12;

/// Ratings are whole stars.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// `/api/videos/status`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct VideoStatus {
    #[serde(default)]
    pub limite_diario: Option<i64>,
    #[serde(default)]
    pub planes: Vec<PlanQuota>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PlanQuota {
    #[serde(default)]
    pub plan_id: Option<PlanId>,
    #[serde(default)]
    pub puede_ver: Option<bool>,
}

impl VideoStatus {
    pub fn has_daily_limit(&self) -> bool {
        self.limite_diario.is_some_and(|limit| limit > 0)
    }

    /// The quota for `selected`, falling back to the first plan.
    pub fn plan(&self, selected: Option<PlanId>) -> Option<&PlanQuota> {
        selected
            .and_then(|id| self.planes.iter().find(|plan| plan.plan_id == Some(id)))
            .or_else(|| self.planes.first())
    }

    /// False only when the backend explicitly says today's view is used up.
    pub fn can_watch(&self, selected: Option<PlanId>) -> bool {
        self.plan(selected)
            .map_or(true, |plan| plan.puede_ver != Some(false))
    }
}

/// Body of `/api/videos/ver`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewRequest {
    pub video_id: String,
    pub calificacion: Option<u8>,
    pub plan_id: Option<PlanId>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct RawCatalogPage {
    #[serde(default)]
    pub videos: Vec<RawVideo>,
    #[serde(default)]
    pub next_page: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct RawVideo {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
    #[serde(default)]
    pub video_pictures: Vec<VideoPicture>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct VideoFile {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub width: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct VideoPicture {
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub width: Option<u64>,
}

/// A playable catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Trailer {
    pub id: String,
    pub url: String,
    pub poster: Option<String>,
    pub duration: Option<u64>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub user: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<Trailer>,
    pub has_next_page: bool,
}

impl From<RawCatalogPage> for CatalogPage {
    fn from(page: RawCatalogPage) -> Self {
        let has_next_page = match &page.next_page {
            None | Some(Value::Null | Value::Bool(false)) => false,
            Some(Value::String(next)) => !next.is_empty(),
            Some(_) => true,
        };
        let items = page.videos.into_iter().filter_map(Trailer::from_raw).collect();
        Self {
            items,
            has_next_page,
        }
    }
}

impl Trailer {
    /// Entries without an MP4 file are dropped.
    pub(crate) fn from_raw(video: RawVideo) -> Option<Self> {
        let url = best_mp4(&video.video_files)?.to_string();
        let id = match video.id {
            Value::String(id) => id,
            other => other.to_string(),
        };
        Some(Self {
            id,
            url,
            poster: poster(&video.video_pictures).map(str::to_string),
            duration: video.duration,
            width: video.width,
            height: video.height,
            user: video.user,
        })
    }
}

/// The middle MP4 by width, which avoids both the tiny and the huge renditions.
pub fn best_mp4(files: &[VideoFile]) -> Option<&str> {
    let mut mp4s: Vec<&VideoFile> = files
        .iter()
        .filter(|file| {
            file.file_type
                .as_deref()
                .is_some_and(|kind| kind.eq_ignore_ascii_case("video/mp4"))
        })
        .collect();
    mp4s.sort_by_key(|file| file.width.unwrap_or(0));

    let middle: &VideoFile = *mp4s.get(mp4s.len() / 2)?;
    middle
        .link
        .as_deref()
        .or_else(|| mp4s.first().copied().and_then(|file| file.link.as_deref()))
        .filter(|link| !link.is_empty())
}

/// The widest picture; on equal widths the last one wins.
pub fn poster(pictures: &[VideoPicture]) -> Option<&str> {
    pictures
        .iter()
        .max_by_key(|picture| picture.width.unwrap_or(0))
        .and_then(|picture| picture.picture.as_deref())
        .filter(|picture| !picture.is_empty())
}
