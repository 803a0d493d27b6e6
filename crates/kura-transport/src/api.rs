//! Typed endpoints of the portal backend.

use kura_protocol::{
    Ack, Application, ApplicationFormRequest, ApplicationFormResponse, ApplicationsResponse,
    AuthResponse, Codec, DistrictsResponse, EmptyPositionApplication, KuraEntry,
    KuraFilter, ListResponse, LoginRequest, Notification, NotificationsResponse,
    PreferenceRequest, PreferenceStatus, PreferencesResponse, ProfileResponse, ProfileUpdate,
    RankInfo, RankResponse, RecordId, RegisterRequest, Statistics, StatisticsResponse, User,
};
use reqwest::Method;

use crate::{ApiClient, CredentialProvider, Navigator, TransportError};

/// Endpoint paths, relative to the API origin.
pub mod paths {
    pub const LOGIN: &str = "/api/auth/login";
    pub const REGISTER: &str = "/api/auth/register";
    pub const PROFILE: &str = "/api/user/profile";
    pub const PREFERENCES: &str = "/api/user/tercihler";
    pub const NOTIFICATIONS: &str = "/api/user/bildirimler";
    pub const KURA_LIST: &str = "/api/kura/liste";
    pub const KURA_RANK: &str = "/api/kura/siram";
    pub const KURA_DISTRICTS: &str = "/api/kura/ilce-listesi";
    pub const KURA_EMPTY_POSITIONS: &str = "/api/kura/bos-pozisyonlar";
    pub const KURA_PREFERENCE: &str = "/api/kura/tercih";
    pub const KURA_EMPTY_POSITION_APPLY: &str = "/api/kura/bos-pozisyon-basvuru";
    pub const KURA_STATISTICS: &str = "/api/kura/istatistikler";
    pub const APPLICATION_FORM: &str = "/api/pdf/basvuru-formu";
    pub const APPLICATIONS: &str = "/api/pdf/list";
    pub const HEALTH: &str = "/health";

    /// `PUT` target that marks one notification as read.
    pub fn notification_read(id: &str) -> String {
        format!("{NOTIFICATIONS}/{id}/okundu")
    }
}

impl<C, N, K> ApiClient<C, N, K>
where
    C: CredentialProvider,
    N: Navigator,
    K: Codec,
{
    // -- Account ----------------------------------------------------------

    /// `POST /api/auth/login`.
    ///
    /// # Errors
    /// Transport errors as-is; a blank token is a [`TransportError::Decode`].
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, TransportError> {
        let response: AuthResponse = self.post(paths::LOGIN, request).await?;
        Ok(response.validate()?)
    }

    /// `POST /api/auth/register`.
    ///
    /// # Errors
    /// Same as [`ApiClient::login`].
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<AuthResponse, TransportError> {
        let response: AuthResponse = self.post(paths::REGISTER, request).await?;
        Ok(response.validate()?)
    }

    /// `GET /api/user/profile`. Needs a bearer credential.
    ///
    /// # Errors
    /// 401/403 when the credential is missing or expired.
    pub async fn fetch_profile(&self) -> Result<User, TransportError> {
        let response: ProfileResponse = self.get(paths::PROFILE).await?;
        Ok(response.user)
    }

    /// `PUT /api/user/profile`; returns the server's updated profile.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, TransportError> {
        let response: ProfileResponse = self.put(paths::PROFILE, update).await?;
        Ok(response.user)
    }

    /// The user's own lottery rows and the decisions on them.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn my_preferences(&self) -> Result<Vec<KuraEntry>, TransportError> {
        let response: PreferencesResponse = self.get(paths::PREFERENCES).await?;
        Ok(response.preferences)
    }

    /// # Errors
    /// Transport errors as-is.
    pub async fn notifications(&self) -> Result<Vec<Notification>, TransportError> {
        let response: NotificationsResponse = self.get(paths::NOTIFICATIONS).await?;
        Ok(response.notifications)
    }

    /// # Errors
    /// Transport errors as-is.
    pub async fn mark_notification_read(&self, id: &RecordId) -> Result<Ack, TransportError> {
        self.put(&paths::notification_read(&id.to_string()), &empty_body())
            .await
    }

    // -- Lottery ----------------------------------------------------------

    /// `GET /api/kura/liste` with the given filter.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn kura_list(&self, filter: &KuraFilter) -> Result<Vec<KuraEntry>, TransportError> {
        let response: ListResponse<KuraEntry> = self
            .get_with_query(paths::KURA_LIST, &filter.query_pairs())
            .await?;
        Ok(response.data)
    }

    /// Distinct district names, sorted by the server.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn districts(&self) -> Result<Vec<String>, TransportError> {
        let response: DistrictsResponse = self.get(paths::KURA_DISTRICTS).await?;
        Ok(response.districts)
    }

    /// Open positions, optionally limited to one district.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn empty_positions(
        &self,
        district: Option<&str>,
    ) -> Result<Vec<KuraEntry>, TransportError> {
        let query: Vec<(&str, String)> = district
            .filter(|d| !d.is_empty())
            .map(|d| vec![("ilce", d.to_string())])
            .unwrap_or_default();
        let response: ListResponse<KuraEntry> = self
            .get_with_query(paths::KURA_EMPTY_POSITIONS, &query)
            .await?;
        Ok(response.data)
    }

    /// The signed-in user's rank, `None` if they have no lottery record.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn my_rank(&self) -> Result<Option<RankInfo>, TransportError> {
        let response: RankResponse = self.get(paths::KURA_RANK).await?;
        Ok(response.into_rank())
    }

    /// # Errors
    /// Transport errors as-is.
    pub async fn statistics(&self) -> Result<Statistics, TransportError> {
        let response: StatisticsResponse = self.get(paths::KURA_STATISTICS).await?;
        Ok(response.data)
    }

    /// Records a decision on a lottery row.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn submit_preference(
        &self,
        kura_id: &str,
        status: PreferenceStatus,
    ) -> Result<Ack, TransportError> {
        let request = PreferenceRequest {
            kura_id: kura_id.to_string(),
            tercih_durumu: status,
        };
        self.post(paths::KURA_PREFERENCE, &request).await
    }

    /// Applies for an empty position. The server answers 400 when the
    /// position has been taken in the meantime.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn apply_empty_position(&self, position_id: &str) -> Result<Ack, TransportError> {
        let request = EmptyPositionApplication {
            pozisyon_id: position_id.to_string(),
        };
        self.post(paths::KURA_EMPTY_POSITION_APPLY, &request).await
    }

    // -- Applications -----------------------------------------------------

    /// Submits the lottery application form; the server renders it to a
    /// PDF. Callers are expected to check the phone-verification gate
    /// first, the server doesn't.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn submit_application_form(
        &self,
        form: &ApplicationFormRequest,
    ) -> Result<ApplicationFormResponse, TransportError> {
        self.post(paths::APPLICATION_FORM, form).await
    }

    /// The user's most recent submitted forms, newest first.
    ///
    /// # Errors
    /// Transport errors as-is.
    pub async fn my_applications(&self) -> Result<Vec<Application>, TransportError> {
        let response: ApplicationsResponse = self.get(paths::APPLICATIONS).await?;
        Ok(response.applications)
    }

    /// `true` only when `GET /health` answers 200.
    pub async fn health(&self) -> bool {
        match self.status_of(Method::GET, paths::HEALTH).await {
            Ok(status) => status == 200,
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                false
            }
        }
    }
}

/// The read-marker endpoint takes no fields, so the body is `{}`.
fn empty_body() -> std::collections::BTreeMap<String, String> {
    std::collections::BTreeMap::new()
}
