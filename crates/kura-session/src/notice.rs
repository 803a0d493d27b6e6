//! User-facing notices.
//!
//! Every state-changing operation produces exactly one [`Notice`]. The
//! store doesn't render anything itself: notices go out on a
//! `tokio::sync::broadcast` channel and whatever UI is attached decides
//! how to show them (toast, status line, log).

use std::fmt;

use tokio::sync::broadcast;

/// Notice texts, in the portal's language.
pub mod messages {
    pub const LOGIN_SUCCEEDED: &str = "Giriş başarılı!";
    pub const LOGIN_FAILED: &str = "Giriş başarısız";
    pub const REGISTER_SUCCEEDED: &str = "Kayıt başarılı!";
    pub const REGISTER_FAILED: &str = "Kayıt başarısız";
    pub const LOGGED_OUT: &str = "Çıkış yapıldı";
    pub const PROFILE_UPDATED: &str = "Profil güncellendi";
    pub const PROFILE_UPDATE_FAILED: &str = "Profil güncellenemedi";
    pub const PROFILE_UNAVAILABLE: &str = "Profil bilgileri alınamadı";
    pub const APPLICATION_SUBMITTED: &str = "Başvuru formu oluşturuldu";
    pub const APPLICATION_FAILED: &str = "Form oluşturulamadı";
    pub const SESSION_EXPIRED: &str = "Oturumunuzun süresi doldu, lütfen tekrar giriş yapın";
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Info => f.write_str("info"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Fan-out of notices to any number of subscribers.
#[derive(Debug)]
pub(crate) struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, notice: Notice) {
        tracing::debug!(level = %notice.level, message = %notice.message, "notice");
        // No subscribers is fine.
        let _ = self.tx.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_every_subscriber() {
        let notifier = Notifier::new(4);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.emit(Notice::info(messages::LOGGED_OUT));

        assert_eq!(a.recv().await.unwrap(), Notice::info("Çıkış yapıldı"));
        assert_eq!(b.recv().await.unwrap().level, NoticeLevel::Info);
    }

    #[test]
    fn test_emit_without_subscribers_does_not_fail() {
        let notifier = Notifier::new(0);
        notifier.emit(Notice::success(messages::LOGIN_SUCCEEDED));
    }

    #[test]
    fn test_notice_display() {
        assert_eq!(Notice::error("Hata").to_string(), "[error] Hata");
    }
}
