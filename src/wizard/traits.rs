// Collaborator interfaces - injected into sessions so tests can observe them

use async_trait::async_trait;

use super::definition::WizardVariant;
use super::types::{Fields, Notification, Route, VerificationOutcome};

/// Screen navigation, owned by the host application
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Toast-style notifications
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// What the verification backend gets to see
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub session_id: String,
    pub variant: WizardVariant,
    pub transaction_id: String,
    pub fields: Fields,
}

/// Decides the outcome of a verification once its delay has elapsed
#[async_trait]
pub trait VerificationOutcomeProvider: Send + Sync {
    async fn verify(&self, request: &VerificationRequest) -> VerificationOutcome;
}

/// Default navigator: records the request in the logs only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &Route) {
        tracing::info!(route = %route, "Navigation requested");
    }
}

/// Default notifier: logs at a level matching the notification
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.level {
            super::types::NotificationLevel::Error => tracing::warn!(
                title = %notification.title,
                description = %notification.description,
                "Notification"
            ),
            _ => tracing::info!(
                title = %notification.title,
                description = %notification.description,
                "Notification"
            ),
        }
    }
}
