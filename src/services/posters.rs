//! Poster image lookup.
//!
//! A failed or empty lookup leaves the recommendation without an image and
//! never fails the request.

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::RecommendedMovie,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinSet;

const POSTER_CACHE_TTL: u64 = 604800; // 1 week
const MISSING_POSTER: &str = "N/A";

/// Source of poster image URLs for catalog titles
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// Looks up a poster URL; `Ok(None)` when the service knows no poster
    async fn fetch_poster(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// OMDb-style poster API (`GET /?apikey=..&t=..&y=..`)
#[derive(Clone)]
pub struct OmdbPosterProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl OmdbPosterProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    async fn request_poster(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>> {
        let mut query = vec![("apikey", self.api_key.clone()), ("t", title.to_string())];
        if let Some(year) = year {
            query.push(("y", year.to_string()));
        }

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Poster API returned status {}: {}",
                status, body
            )));
        }

        let body: OmdbResponse = response.json().await?;
        let poster = poster_url(body);

        tracing::debug!(
            title = %title,
            found = poster.is_some(),
            provider = self.name(),
            "Poster lookup completed"
        );

        Ok(poster)
    }
}

fn poster_url(body: OmdbResponse) -> Option<String> {
    if body.response != "True" {
        if let Some(error) = body.error {
            tracing::debug!(error = %error, "Poster API reported no match");
        }
        return None;
    }
    body.poster
        .filter(|url| !url.is_empty() && url != MISSING_POSTER)
}

#[async_trait::async_trait]
impl PosterProvider for OmdbPosterProvider {
    async fn fetch_poster(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>> {
        let search = search_title(title);

        cached!(
            self.cache,
            CacheKey::Poster {
                title: search.clone(),
                year,
            },
            POSTER_CACHE_TTL,
            async { self.request_poster(&search, year).await }
        )
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}

/// Turns a MovieLens title into a search title.
///
/// Drops the trailing `(YYYY)` and moves a trailing article back to the front:
/// `"Matrix, The (1999)"` becomes `"The Matrix"`.
pub fn search_title(title: &str) -> String {
    let mut title = title.trim();
    if let Some(open) = title.rfind(" (") {
        if title.ends_with(')') {
            title = title[..open].trim_end();
        }
    }

    for article in ["The", "A", "An"] {
        let suffix = format!(", {}", article);
        if let Some(stem) = title.strip_suffix(suffix.as_str()) {
            return format!("{} {}", article, stem);
        }
    }
    title.to_string()
}

/// Looks up a poster, treating any failure as "no poster"
pub async fn lookup_poster(
    provider: &dyn PosterProvider,
    title: &str,
    year: Option<i32>,
) -> Option<String> {
    match provider.fetch_poster(title, year).await {
        Ok(poster) => poster,
        Err(e) => {
            tracing::warn!(
                error = %e,
                title = %title,
                provider = provider.name(),
                "Poster lookup failed"
            );
            None
        }
    }
}

/// Fills `poster_url` on every movie, looking posters up concurrently
pub async fn attach_posters(provider: Arc<dyn PosterProvider>, movies: &mut [RecommendedMovie]) {
    let mut tasks = JoinSet::new();

    for (position, movie) in movies.iter().enumerate() {
        let provider = provider.clone();
        let title = movie.title.clone();
        let year = movie.year;
        tasks.spawn(async move {
            let poster = lookup_poster(provider.as_ref(), &title, year).await;
            (position, poster)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, poster)) => movies[position].poster_url = poster,
            Err(e) => tracing::error!(error = %e, "Poster task join error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CatalogItem;

    fn movie(id: i64, title: &str) -> RecommendedMovie {
        RecommendedMovie::from(CatalogItem::new(id, title))
    }

    #[test]
    fn test_search_title_strips_year() {
        assert_eq!(search_title("Toy Story (1995)"), "Toy Story");
    }

    #[test]
    fn test_search_title_moves_article() {
        assert_eq!(search_title("Matrix, The (1999)"), "The Matrix");
        assert_eq!(search_title("Few Good Men, A (1992)"), "A Few Good Men");
    }

    #[test]
    fn test_search_title_without_year() {
        assert_eq!(search_title("  Heat "), "Heat");
    }

    #[test]
    fn test_poster_url_found() {
        let body: OmdbResponse = serde_json::from_str(
            r#"{"Title": "Heat", "Poster": "https://img.example/heat.jpg", "Response": "True"}"#,
        )
        .unwrap();
        assert_eq!(
            poster_url(body),
            Some("https://img.example/heat.jpg".to_string())
        );
    }

    #[test]
    fn test_poster_url_missing_marker() {
        let body: OmdbResponse =
            serde_json::from_str(r#"{"Poster": "N/A", "Response": "True"}"#).unwrap();
        assert_eq!(poster_url(body), None);
    }

    #[test]
    fn test_poster_url_not_found() {
        let body: OmdbResponse =
            serde_json::from_str(r#"{"Response": "False", "Error": "Movie not found!"}"#).unwrap();
        assert_eq!(poster_url(body), None);
    }

    #[tokio::test]
    async fn test_lookup_poster_absorbs_errors() {
        let mut provider = MockPosterProvider::new();
        provider
            .expect_fetch_poster()
            .returning(|_, _| Err(AppError::ExternalApi("quota exceeded".to_string())));
        provider.expect_name().return_const("mock");

        assert_eq!(lookup_poster(&provider, "Heat (1995)", Some(1995)).await, None);
    }

    #[tokio::test]
    async fn test_attach_posters_fills_each_movie() {
        let mut provider = MockPosterProvider::new();
        provider
            .expect_fetch_poster()
            .returning(|title, _| match title {
                "Heat (1995)" => Ok(Some("https://img.example/heat.jpg".to_string())),
                _ => Ok(None),
            });
        provider.expect_name().return_const("mock");

        let mut movies = vec![movie(6, "Heat (1995)"), movie(2, "Jumanji (1995)")];
        attach_posters(Arc::new(provider), &mut movies).await;

        assert_eq!(
            movies[0].poster_url.as_deref(),
            Some("https://img.example/heat.jpg")
        );
        assert_eq!(movies[1].poster_url, None);
    }
}
