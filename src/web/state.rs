use std::sync::Arc;

use crate::{
    Config,
    model::ModelManager,
    services::{ServiceError, mail::Mailer, video::VideoHost},
};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    config: &'static Config,
    mailer: Arc<dyn Mailer>,
    video: Option<Arc<dyn VideoHost>>,
}

impl AppState {
    pub fn new(
        mm: ModelManager,
        config: &'static Config,
        mailer: Arc<dyn Mailer>,
        video: Option<Arc<dyn VideoHost>>,
    ) -> Self {
        Self {
            mm,
            config,
            mailer,
            video,
        }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub fn video_host(&self) -> Result<&dyn VideoHost, ServiceError> {
        self.video
            .as_deref()
            .ok_or(ServiceError::NotConfigured("video hosting"))
    }
}
