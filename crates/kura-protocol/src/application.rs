//! Lottery application forms ("başvuru formu") and the records the server
//! keeps for them.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{RecordId, User};

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Body of `POST /api/pdf/basvuru-formu`.
///
/// National id, phone and e-mail are not sent: the server copies them from
/// the account so a form can't claim someone else's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationFormRequest {
    #[serde(rename = "ad")]
    pub first_name: String,
    #[serde(rename = "soyad")]
    pub last_name: String,
    #[serde(rename = "unvan")]
    pub title: String,
    #[serde(rename = "dogum_tarihi", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(rename = "dogum_yeri", skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(rename = "sicil_no", skip_serializing_if = "Option::is_none")]
    pub registry_number: Option<String>,
    #[serde(rename = "mezun_universite", skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(rename = "uyum_egitimi_sertifika", skip_serializing_if = "Option::is_none")]
    pub orientation_certificate: Option<String>,
    /// Sent as one comma-separated string, the way the form field holds it.
    #[serde(
        rename = "tercih_ilceler",
        serialize_with = "comma_separated",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub preferred_districts: Vec<String>,
    #[serde(rename = "aciklama", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ApplicationFormRequest {
    /// A form pre-filled from the profile. Fields the profile doesn't model
    /// directly are looked up among its extra fields.
    pub fn from_user(user: &User) -> Self {
        let extra = |key: &str| {
            user.extra
                .get(key)
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone().unwrap_or_default(),
            title: user.title.clone().unwrap_or_default(),
            birth_date: extra("dogum_tarihi"),
            birth_place: extra("dogum_yeri"),
            registry_number: extra("sicil_no"),
            university: extra("mezun_universite"),
            orientation_certificate: extra("uyum_egitimi_sertifika"),
            preferred_districts: Vec::new(),
            note: None,
        }
    }

    /// Names of the required fields that are still blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("ad", &self.first_name),
            ("soyad", &self.last_name),
            ("unvan", &self.title),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn comma_separated<S: Serializer>(
    districts: &[String],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&districts.join(", "))
}

/// Answer to a form submission. `pdf_path` is relative to the API origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationFormResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "pdfPath", default)]
    pub pdf_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Withdrawn,
    /// A status this client doesn't know yet.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::Unknown => "unknown",
        })
    }
}

/// One submitted form, as listed by `GET /api/pdf/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<RecordId>,
    /// The submitted fields, verbatim.
    #[serde(rename = "form_data", default)]
    pub form: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// `GET /api/pdf/list` response, newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationsResponse {
    #[serde(default)]
    pub applications: Vec<Application>,
}
