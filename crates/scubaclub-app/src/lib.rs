pub mod auth;
pub mod club;
pub mod country;
pub mod error;
pub mod event;
pub mod lang;
pub mod location;
pub mod mailer;
pub mod pages;
pub mod state;
pub mod suggestion;

use state::AppState;

#[macro_export]
macro_rules! repository_from_request {
    ($repo:ty) => {
        impl axum::extract::FromRequestParts<$crate::state::AppState> for $repo {
            type Rejection = http::StatusCode;

            fn from_request_parts(
                _parts: &mut http::request::Parts,
                state: &$crate::state::AppState,
            ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>>
                   + core::marker::Send {
                futures::future::ready(std::result::Result::Ok(<$repo>::new(state.pool().clone())))
            }
        }
    };
}

/// All site routes, session layer is added by the server
pub fn site_router() -> axum::Router<AppState> {
    axum::Router::new()
        .merge(pages::router())
        .merge(auth::router())
        .merge(club::router())
        .merge(event::router())
        .merge(location::router())
        .merge(suggestion::router())
        .merge(country::router())
}
