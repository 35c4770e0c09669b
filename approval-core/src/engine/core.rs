use std::sync::Arc;

use crate::models::application::Application;
use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::route::ApplicationType;
use crate::models::ApplicationId;
use crate::store::{ApplicationStore, RouteRepository, UserDirectory};

use super::notify::NotificationPort;
use super::resolver::ApproverResolver;

/// Drives applications through the approval state machine.
///
/// Each operation loads the aggregate, computes all changes in memory and
/// writes them with one version-checked commit. Notifications go out only
/// after the commit succeeded and never influence its outcome.
pub struct WorkflowEngine {
    pub(crate) applications: Arc<dyn ApplicationStore>,
    pub(crate) routes: Arc<dyn RouteRepository>,
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) notifier: Arc<dyn NotificationPort>,
}

impl WorkflowEngine {
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        routes: Arc<dyn RouteRepository>,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            applications,
            routes,
            directory,
            notifier,
        }
    }

    /// Engine over a single store that implements every persistence port.
    pub fn with_store<S>(store: Arc<S>, notifier: Arc<dyn NotificationPort>) -> Self
    where
        S: ApplicationStore + RouteRepository + UserDirectory + 'static,
    {
        Self::new(store.clone(), store.clone(), store, notifier)
    }

    pub(crate) fn resolver(&self) -> ApproverResolver<'_> {
        ApproverResolver::new(self.directory.as_ref())
    }

    pub(crate) fn load(&self, application_id: ApplicationId) -> WorkflowResult<Application> {
        self.applications
            .application(application_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("application {}", application_id)))
    }

    pub(crate) fn load_type(&self, application: &Application) -> WorkflowResult<ApplicationType> {
        let type_id = application.application_type_id();
        self.routes
            .application_type(type_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("application type {}", type_id)))
    }
}
