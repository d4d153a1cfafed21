pub mod client;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use localreads_http::error::AppError;
use localreads_kernel::Module;
use serde_json::json;

use client::{Isbn, IsbnMetadata, OpenLibraryClient};

/// ISBN: metadata lookup against Open Library.
pub struct IsbnModule {
    client: OpenLibraryClient,
}

impl IsbnModule {
    pub fn new(client: OpenLibraryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Module for IsbnModule {
    fn name(&self) -> &'static str {
        "isbn"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/{isbn}", get(lookup_isbn))
            .with_state(self.client.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        });
        Some(json!({
            "paths": {
                "/{isbn}": {
                    "get": {
                        "summary": "Look up book metadata by ISBN",
                        "tags": ["ISBN"],
                        "parameters": [
                            { "name": "isbn", "in": "path", "required": true, "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Metadata",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/IsbnMetadata" } }
                                }
                            },
                            "400": { "description": "Malformed ISBN", "content": error.clone() },
                            "404": { "description": "No record for this ISBN", "content": error.clone() },
                            "502": { "description": "Open Library unreachable", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "IsbnMetadata": {
                        "type": "object",
                        "properties": {
                            "isbn": { "type": "string" },
                            "title": { "type": "string", "nullable": true },
                            "author": { "type": "string" },
                            "pages": { "type": "integer", "nullable": true },
                            "cover_url": { "type": "string", "format": "uri" }
                        },
                        "required": ["isbn", "author", "cover_url"]
                    }
                }
            }
        }))
    }
}

async fn lookup_isbn(
    State(client): State<OpenLibraryClient>,
    Path(raw): Path<String>,
) -> Result<Json<IsbnMetadata>, AppError> {
    let isbn = Isbn::parse(&raw).map_err(|err| AppError::bad_request(err.to_string()))?;

    match client.lookup(&isbn).await {
        Ok(Some(metadata)) => {
            tracing::info!(isbn = %isbn, title = ?metadata.title, "ISBN resolved");
            Ok(Json(metadata))
        }
        Ok(None) => Err(AppError::not_found(format!("no book found for ISBN {isbn}"))),
        Err(err) => {
            tracing::warn!(isbn = %isbn, error = %err, "Open Library request failed");
            Err(AppError::upstream(format!("ISBN lookup failed: {err}")))
        }
    }
}

/// Create a new instance of the ISBN module
pub fn create_module(client: OpenLibraryClient) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(IsbnModule::new(client))
}
