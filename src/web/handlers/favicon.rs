//! `/favicon` endpoints
//!
//! Once the query validates, the answer is always `200` with an image body:
//! every network failure is absorbed by the resolver and turns into a
//! generated avatar at worst. `/favicon/preview` resolves the same way but
//! answers with JSON: the icon inlined as a `data:` URL plus the shareable API
//! URL for the request.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::AvatarConfig;
use crate::errors::{AppError, AppResult, RenderResult};
use crate::models::{
    AvatarFormat, FallbackMode, HexColor, IconOrigin, ResolutionRequest, ResolvedIcon,
};
use crate::utils::FaviconUrlBuilder;
use crate::web::AppState;
use crate::web::responses::{handle_error, method_not_allowed, ok};

pub static FAVICON_ORIGIN_HEADER: HeaderName = HeaderName::from_static("x-favicon-origin");

/// Raw query parameters; everything is validated by [`FaviconQuery::into_request`]
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaviconQuery {
    pub domain: Option<String>,
    pub size: Option<String>,
    pub fallback: Option<String>,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub fallback_url: Option<String>,
    pub format: Option<String>,
}

impl FaviconQuery {
    /// Validate against the avatar limits; blank optional values mean "default"
    pub fn into_request(self, avatar: &AvatarConfig) -> AppResult<ResolutionRequest> {
        let domain = non_blank(self.domain)
            .ok_or_else(|| AppError::validation("Domain parameter is required"))?;

        let mut builder = ResolutionRequest::builder(domain).format(avatar.default_format);

        if let Some(size) = non_blank(self.size) {
            builder = builder.size(parse_size(&size, avatar.max_size)?);
        }
        if let Some(fallback) = non_blank(self.fallback) {
            builder = builder.fallback(fallback.parse::<FallbackMode>()?);
        }
        if let Some(color) = non_blank(self.bg_color) {
            builder = builder.background(color.parse::<HexColor>()?);
        }
        if let Some(color) = non_blank(self.text_color) {
            builder = builder.text_color(color.parse::<HexColor>()?);
        }
        if let Some(format) = non_blank(self.format) {
            builder = builder.format(format.parse::<AvatarFormat>()?);
        }

        builder.fallback_url(non_blank(self.fallback_url)).build()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_size(raw: &str, max_size: u32) -> AppResult<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|size| (1..=max_size).contains(size))
        .ok_or_else(|| {
            AppError::validation(format!(
                "Invalid size '{raw}': expected an integer between 1 and {max_size}"
            ))
        })
}

/// Result of `/favicon/preview`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaviconPreview {
    pub api_url: String,
    pub data_url: String,
    pub media_type: String,
    pub origin: IconOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

fn parse_query(
    query: Result<Query<FaviconQuery>, QueryRejection>,
    avatar: &AvatarConfig,
) -> AppResult<ResolutionRequest> {
    match query {
        Ok(Query(query)) => query.into_request(avatar),
        Err(rejection) => Err(AppError::validation(rejection.body_text())),
    }
}

/// Resolve under the configured request deadline
///
/// Past the deadline the resolver abandons remote sources.
async fn resolve_within_deadline(
    state: &AppState,
    request: &ResolutionRequest,
) -> RenderResult<ResolvedIcon> {
    let deadline = CancellationToken::new();
    let timer = {
        let token = deadline.clone();
        let budget = state.config.web.request_deadline;
        tokio::spawn(async move {
            tokio::time::sleep(budget).await;
            token.cancel();
        })
    };

    let result = state
        .resolver
        .resolve_with_cancellation(request, deadline)
        .await;
    timer.abort();
    result
}

/// GET /favicon
pub async fn get_favicon(
    State(state): State<AppState>,
    query: Result<Query<FaviconQuery>, QueryRejection>,
) -> Response {
    let request = match parse_query(query, &state.config.avatar) {
        Ok(request) => request,
        Err(e) => return handle_error(e),
    };

    match resolve_within_deadline(&state, &request).await {
        Ok(icon) => {
            debug!(
                "Serving {} favicon for {} ({} bytes)",
                icon.origin().as_str(),
                request.key(),
                icon.bytes().len()
            );
            icon_response(icon, state.config.web.cache_max_age.as_secs())
        }
        Err(e) => handle_error(e.into()),
    }
}

/// GET /favicon/preview
pub async fn preview_favicon(
    State(state): State<AppState>,
    query: Result<Query<FaviconQuery>, QueryRejection>,
) -> Response {
    let request = match parse_query(query, &state.config.avatar) {
        Ok(request) => request,
        Err(e) => return handle_error(e),
    };

    match resolve_within_deadline(&state, &request).await {
        Ok(icon) => ok(FaviconPreview {
            api_url: FaviconUrlBuilder::from_request(
                state.config.web.favicon_endpoint(),
                &request,
            )
            .build(),
            data_url: icon.to_data_url(),
            media_type: icon.media_type().to_string(),
            origin: icon.origin(),
            source_url: icon.source_url().map(str::to_string),
        }),
        Err(e) => handle_error(e.into()),
    }
}

/// OPTIONS /favicon
pub async fn favicon_preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on /favicon
pub async fn favicon_method_not_allowed() -> Response {
    method_not_allowed()
}

fn icon_response(icon: ResolvedIcon, max_age_secs: u64) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, icon.media_type().to_string()),
            (header::CACHE_CONTROL, format!("public, max-age={max_age_secs}")),
            (FAVICON_ORIGIN_HEADER.clone(), icon.origin().as_str().to_string()),
        ],
        icon.bytes().clone(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn query(pairs: &[(&str, &str)]) -> FaviconQuery {
        let encoded = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/favicon?{encoded}").parse().unwrap();
        Query::<FaviconQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_full_query_maps_onto_request() {
        let request = query(&[
            ("domain", "https://GitHub.com/rust-lang"),
            ("size", "64"),
            ("fallback", "url"),
            ("bgColor", "#ff6b6b"),
            ("textColor", "000"),
            ("fallbackUrl", "https://cdn.example.net/x.png"),
            ("format", "png"),
        ])
        .into_request(&AvatarConfig::default())
        .unwrap();

        assert_eq!(request.domain(), "github.com");
        assert_eq!(request.size(), 64);
        assert_eq!(request.fallback_mode(), FallbackMode::Url);
        assert_eq!(request.background(), HexColor::new(0xff, 0x6b, 0x6b));
        assert_eq!(request.text_color(), HexColor::new(0, 0, 0));
        assert_eq!(request.fallback_target(), Some("https://cdn.example.net/x.png"));
        assert_eq!(request.format(), AvatarFormat::Png);
    }

    #[test]
    fn test_defaults_apply_to_missing_and_blank_values() {
        let request = query(&[("domain", "example.com"), ("size", ""), ("bgColor", " ")])
            .into_request(&AvatarConfig::default())
            .unwrap();

        assert_eq!(request.size(), 32);
        assert_eq!(request.background().to_string(), "#6366f1");
        assert_eq!(request.text_color().to_string(), "#ffffff");
        assert_eq!(request.fallback_mode(), FallbackMode::Letter);
        assert_eq!(request.format(), AvatarFormat::Svg);
    }

    #[test]
    fn test_configured_default_format_is_used() {
        let avatar = AvatarConfig {
            default_format: AvatarFormat::Png,
            ..AvatarConfig::default()
        };
        let request = query(&[("domain", "example.com")])
            .into_request(&avatar)
            .unwrap();
        assert_eq!(request.format(), AvatarFormat::Png);
    }

    #[rstest]
    #[case::missing_domain(&[])]
    #[case::blank_domain(&[("domain", "   ")])]
    #[case::scheme_only(&[("domain", "https://")])]
    #[case::zero_size(&[("domain", "a.com"), ("size", "0")])]
    #[case::negative_size(&[("domain", "a.com"), ("size", "-4")])]
    #[case::oversized(&[("domain", "a.com"), ("size", "4096")])]
    #[case::non_numeric_size(&[("domain", "a.com"), ("size", "big")])]
    #[case::bad_color(&[("domain", "a.com"), ("bgColor", "purple")])]
    #[case::bad_text_color(&[("domain", "a.com"), ("textColor", "#12345")])]
    #[case::bad_fallback(&[("domain", "a.com"), ("fallback", "emoji")])]
    #[case::bad_format(&[("domain", "a.com"), ("format", "gif")])]
    fn test_invalid_queries_are_rejected(#[case] pairs: &[(&str, &str)]) {
        let result = query(pairs).into_request(&AvatarConfig::default());
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_size_bounds_are_inclusive() {
        let avatar = AvatarConfig::default();
        assert_eq!(parse_size("1", avatar.max_size).unwrap(), 1);
        assert_eq!(parse_size("512", avatar.max_size).unwrap(), 512);
        assert!(parse_size("513", avatar.max_size).is_err());
    }
}
