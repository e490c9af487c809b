use std::sync::Arc;

use axum::extract::FromRef;
use scubaclub_auth::token::ActivationTokens;
use scubaclub_dal::Pool;
use url::Url;

use crate::mailer::Mailer;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(
        app_config: AppConfig,
        pool: Pool,
        tokens: ActivationTokens,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                app_config,
                pool,
                tokens,
                mailer,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn build_url(&self, relative_url: &str) -> Result<Url, url::ParseError> {
        self.config().base_url.join(relative_url)
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn tokens(&self) -> &ActivationTokens {
        &self.state.tokens
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.state.mailer.as_ref()
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
    tokens: ActivationTokens,
    mailer: Arc<dyn Mailer>,
}

pub struct AppConfig {
    pub base_url: Url,
    pub default_from_email: String,
}

impl AppConfig {
    /// Cookies are marked secure only when the site is served over https
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// unit validation context for garde extractors
impl FromRef<AppState> for () {
    fn from_ref(_state: &AppState) -> Self {}
}
