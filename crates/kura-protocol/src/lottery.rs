//! Lottery (kura) read models, preference decisions and notifications.

use serde::{Deserialize, Serialize};

use crate::RecordId;

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// A physician's decision on an offered position ("tercih durumu").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreferenceStatus {
    #[serde(rename = "kabul")]
    Accept,
    #[serde(rename = "red")]
    Reject,
    #[serde(rename = "pas")]
    Pass,
    #[serde(rename = "beklemede")]
    Pending,
}

impl PreferenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "kabul",
            Self::Reject => "red",
            Self::Pass => "pas",
            Self::Pending => "beklemede",
        }
    }
}

impl std::fmt::Display for PreferenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/kura/tercih`.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub kura_id: String,
    pub tercih_durumu: PreferenceStatus,
}

/// Body of `POST /api/kura/bos-pozisyon-basvuru`.
#[derive(Debug, Clone, Serialize)]
pub struct EmptyPositionApplication {
    pub pozisyon_id: String,
}

// ---------------------------------------------------------------------------
// Lottery list
// ---------------------------------------------------------------------------

/// Sort order understood by `GET /api/kura/liste`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KuraOrder {
    /// Highest service points first. The server's default.
    #[default]
    ServicePoints,
    RankNumber,
    Name,
}

impl KuraOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServicePoints => "hizmet_puani",
            Self::RankNumber => "sira_no",
            Self::Name => "ad",
        }
    }
}

/// Query parameters for the lottery list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KuraFilter {
    pub district: Option<String>,
    pub title: Option<String>,
    pub order: KuraOrder,
}

impl KuraFilter {
    /// Query pairs in the order the server documents them. Empty filters
    /// are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(district) = self.district.as_deref().filter(|d| !d.is_empty()) {
            pairs.push(("ilce", district.to_string()));
        }
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            pairs.push(("unvan", title.to_string()));
        }
        pairs.push(("orderBy", self.order.as_str().to_string()));
        pairs
    }
}

/// One row of the lottery list. Also used for empty positions and for the
/// user's own preferences, which are projections of the same record; every
/// field outside the id is therefore optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KuraEntry {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "il_kodu", default, skip_serializing_if = "Option::is_none")]
    pub province_code: Option<String>,
    #[serde(rename = "il_adi", default, skip_serializing_if = "Option::is_none")]
    pub province_name: Option<String>,
    #[serde(rename = "sira_no", default, skip_serializing_if = "Option::is_none")]
    pub rank_number: Option<u32>,
    #[serde(rename = "ad", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "soyad", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "ilce", default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(rename = "aile_sagligi_merkezi", default, skip_serializing_if = "Option::is_none")]
    pub health_center: Option<String>,
    #[serde(rename = "aile_hekimligi_birimi", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "unvan", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "hizmet_puani", default)]
    pub service_points: f64,
    #[serde(rename = "tercih_durumu", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PreferenceStatus>,
    #[serde(rename = "tercih_tarihi", default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<String>,
    #[serde(rename = "sira_bekleme_suresi", default, skip_serializing_if = "Option::is_none")]
    pub waiting_time: Option<f64>,
    #[serde(rename = "nufus", default, skip_serializing_if = "Option::is_none")]
    pub population: Option<String>,
    #[serde(rename = "ciro", default, skip_serializing_if = "Option::is_none")]
    pub turnover: Option<String>,
}

impl KuraEntry {
    /// An entry is open while nobody has decided on it.
    pub fn is_open(&self) -> bool {
        matches!(self.status, None | Some(PreferenceStatus::Pending))
    }
}

/// `{success, count, data}` list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `GET /api/kura/ilce-listesi` response.
#[derive(Debug, Clone, Deserialize)]
pub struct DistrictsResponse {
    #[serde(rename = "ilceler", default)]
    pub districts: Vec<String>,
}

/// `GET /api/user/tercihler` response.
#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesResponse {
    #[serde(rename = "tercihler", default)]
    pub preferences: Vec<KuraEntry>,
}

// ---------------------------------------------------------------------------
// Rank & statistics
// ---------------------------------------------------------------------------

/// The signed-in user's place in their district's queue.
#[derive(Debug, Clone, PartialEq)]
pub struct RankInfo {
    pub rank: u32,
    pub service_points: f64,
    pub district: Option<String>,
    pub title: Option<String>,
    pub health_center: Option<String>,
}

/// Raw `GET /api/kura/siram` response. When the user has no lottery record
/// the server answers 200 with `success: false` and a message.
#[derive(Debug, Clone, Deserialize)]
pub struct RankResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "sira", default)]
    pub rank: Option<u32>,
    #[serde(rename = "hizmet_puani", default)]
    pub service_points: Option<f64>,
    #[serde(rename = "ilce", default)]
    pub district: Option<String>,
    #[serde(rename = "unvan", default)]
    pub title: Option<String>,
    #[serde(rename = "aile_sagligi_merkezi", default)]
    pub health_center: Option<String>,
}

impl RankResponse {
    /// `None` when the server reported no lottery record.
    pub fn into_rank(self) -> Option<RankInfo> {
        if !self.success {
            return None;
        }
        Some(RankInfo {
            rank: self.rank?,
            service_points: self.service_points.unwrap_or_default(),
            district: self.district,
            title: self.title,
            health_center: self.health_center,
        })
    }
}

/// Dashboard counters from `GET /api/kura/istatistikler`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Statistics {
    #[serde(rename = "totalPositions")]
    pub total_positions: u64,
    #[serde(rename = "emptyPositions")]
    pub empty_positions: u64,
    #[serde(rename = "ilceCount")]
    pub district_count: u64,
    /// Sent as a fixed-point string ("42.50"), or "NaN" on an empty table.
    #[serde(rename = "fillRate", default)]
    pub fill_rate: Option<String>,
}

impl Statistics {
    pub fn fill_rate_percent(&self) -> Option<f64> {
        self.fill_rate
            .as_deref()
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

/// `{success, data: Statistics}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsResponse {
    pub data: Statistics,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// An in-app notification ("bildirim").
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    #[serde(rename = "baslik")]
    pub title: String,
    #[serde(rename = "mesaj")]
    pub message: String,
    #[serde(rename = "tip", default)]
    pub kind: Option<String>,
    #[serde(rename = "okundu", default)]
    pub read: bool,
    #[serde(rename = "gonderim_tarihi", default)]
    pub sent_at: Option<String>,
}

/// `GET /api/user/bildirimler` response.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsResponse {
    #[serde(rename = "bildirimler", default)]
    pub notifications: Vec<Notification>,
}
