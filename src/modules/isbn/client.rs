//! Open Library client and ISBN normalisation.
//!
//! See: https://openlibrary.org/dev/docs/api/books

use std::fmt;
use std::time::Duration;

use localreads_kernel::settings::IsbnSettings;
use localreads_scanner::UNKNOWN_AUTHOR;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const USER_AGENT: &str = concat!("Localreads/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IsbnError {
    #[error("'{0}' is not 10 or 13 characters long")]
    WrongLength(String),
    #[error("'{0}' has an invalid check digit")]
    BadCheckDigit(String),
}

/// A checksum-valid ISBN-10 or ISBN-13 without separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isbn(String);

impl Isbn {
    /// Strip spaces and hyphens, then validate length and check digit.
    pub fn parse(raw: &str) -> Result<Self, IsbnError> {
        let digits: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let valid = match digits.len() {
            10 => isbn10_valid(&digits),
            13 => isbn13_valid(&digits),
            _ => return Err(IsbnError::WrongLength(raw.to_string())),
        };
        if valid {
            Ok(Self(digits))
        } else {
            Err(IsbnError::BadCheckDigit(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn isbn10_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (idx, c) in digits.chars().enumerate() {
        let value = match (idx, c) {
            (9, 'X') => 10,
            (_, c) => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        sum += value * (10 - idx as u32);
    }
    sum % 11 == 0
}

fn isbn13_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (idx, c) in digits.chars().enumerate() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        sum += if idx % 2 == 0 { d } else { d * 3 };
    }
    sum % 10 == 0
}

/// Book metadata resolved from Open Library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsbnMetadata {
    pub isbn: String,
    pub title: Option<String>,
    pub author: String,
    pub pages: Option<i64>,
    pub cover_url: String,
}

#[derive(Debug, Deserialize)]
struct EditionDto {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<KeyRef>,
    number_of_pages: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct KeyRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct AuthorDto {
    name: Option<String>,
}

/// Open Library API client
#[derive(Debug, Clone)]
pub struct OpenLibraryClient {
    http_client: reqwest::Client,
    base_url: String,
    covers_url: String,
}

impl OpenLibraryClient {
    pub fn new(settings: &IsbnSettings) -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            covers_url: settings.covers_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up an edition. `Ok(None)` when Open Library has no record or
    /// answers with a non-success status.
    pub async fn lookup(&self, isbn: &Isbn) -> reqwest::Result<Option<IsbnMetadata>> {
        let url = format!("{}/isbn/{}.json", self.base_url, isbn);
        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(isbn = %isbn, status = %status, "edition lookup unsuccessful");
            return Ok(None);
        }

        let edition: EditionDto = response.json().await?;
        let author = self.author_names(&edition.authors).await;

        Ok(Some(IsbnMetadata {
            isbn: isbn.to_string(),
            title: edition.title,
            author,
            pages: edition.number_of_pages,
            cover_url: format!("{}/b/isbn/{}-L.jpg", self.covers_url, isbn),
        }))
    }

    /// Resolve author keys to names; unresolvable keys are skipped.
    async fn author_names(&self, authors: &[KeyRef]) -> String {
        let mut names = Vec::new();
        for author in authors {
            let url = format!("{}{}.json", self.base_url, author.key);
            let resolved = match self.http_client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    response.json::<AuthorDto>().await.ok().and_then(|a| a.name)
                }
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!(key = %author.key, error = %err, "author lookup failed");
                    None
                }
            };
            names.extend(resolved);
        }

        if names.is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            names.join(", ")
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    /// A stand-in Open Library serving one edition and its author.
    pub(crate) async fn fake_open_library() -> String {
        async fn edition(Path(file): Path<String>) -> Result<Json<serde_json::Value>, StatusCode> {
            if file == "9780140328721.json" {
                Ok(Json(json!({
                    "title": "Fantastic Mr Fox",
                    "authors": [{ "key": "/authors/OL34184A" }, { "key": "/authors/missing" }],
                    "number_of_pages": 96
                })))
            } else {
                Err(StatusCode::NOT_FOUND)
            }
        }

        async fn author(Path(file): Path<String>) -> Result<Json<serde_json::Value>, StatusCode> {
            if file == "OL34184A.json" {
                Ok(Json(json!({ "name": "Roald Dahl" })))
            } else {
                Err(StatusCode::NOT_FOUND)
            }
        }

        let app = Router::new()
            .route("/isbn/{file}", get(edition))
            .route("/authors/{file}", get(author));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{address}")
    }

    pub(crate) fn settings_for(base_url: &str) -> IsbnSettings {
        IsbnSettings {
            base_url: base_url.to_string(),
            covers_url: "https://covers.example".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn normalises_and_validates() {
        assert_eq!(Isbn::parse("978-0-14-032872-1").unwrap().as_str(), "9780140328721");
        assert_eq!(Isbn::parse(" 0 14 032872 6 ").unwrap().as_str(), "0140328726");
        assert_eq!(Isbn::parse("080442957x").unwrap().as_str(), "080442957X");
        assert_eq!(
            Isbn::parse("9780140328722"),
            Err(IsbnError::BadCheckDigit("9780140328722".into()))
        );
        assert_eq!(Isbn::parse("12345"), Err(IsbnError::WrongLength("12345".into())));
        assert!(matches!(
            Isbn::parse("X804429570"),
            Err(IsbnError::BadCheckDigit(_))
        ));
    }

    #[tokio::test]
    async fn looks_up_edition_and_authors() {
        let base = fake_open_library().await;
        let client = OpenLibraryClient::new(&settings_for(&base)).unwrap();

        let isbn = Isbn::parse("9780140328721").unwrap();
        let meta = client.lookup(&isbn).await.unwrap().unwrap();
        assert_eq!(meta.title.as_deref(), Some("Fantastic Mr Fox"));
        assert_eq!(meta.author, "Roald Dahl");
        assert_eq!(meta.pages, Some(96));
        assert_eq!(meta.cover_url, "https://covers.example/b/isbn/9780140328721-L.jpg");

        let unknown = Isbn::parse("0140328726").unwrap();
        assert!(client.lookup(&unknown).await.unwrap().is_none());
    }
}
