pub mod models;
pub mod repo;
mod routes;

use async_trait::async_trait;
use axum::{
    routing::{get, patch},
    Router,
};
use localreads_kernel::{InitCtx, Migration, Module};
use serde_json::json;
use sqlx::SqlitePool;

/// Books: listing, the categorized library view, and reading-state updates.
pub struct BooksModule {
    pool: SqlitePool,
}

impl BooksModule {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(ctx.db)
            .await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = count.0,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_books).post(routes::create_book))
            .route("/health", get(routes::health_check))
            .route("/view", get(routes::view_books))
            .route("/finished", get(routes::finished_books))
            .route("/{id}", get(routes::get_book).patch(routes::update_book))
            .route("/{id}/progress", patch(routes::update_progress))
            .route("/{id}/rating", patch(routes::update_rating))
            .route("/{id}/review", patch(routes::update_review))
            .route("/{id}/visibility", patch(routes::update_visibility))
            .with_state(self.pool.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_books",
            up: repo::MIGRATION,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn patch_operation(summary: &str, schema: &str) -> serde_json::Value {
    json!({
        "patch": {
            "summary": summary,
            "tags": ["Books"],
            "parameters": [id_parameter()],
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": format!("#/components/schemas/{schema}") }
                    }
                }
            },
            "responses": {
                "200": book_response("Updated book"),
                "404": error_response("Book not found"),
                "422": error_response("Validation error")
            }
        }
    })
}

fn openapi() -> serde_json::Value {
    let mut item = patch_operation("Update reading state", "BookUpdate");
    item["get"] = json!({
        "summary": "Get a book",
        "tags": ["Books"],
        "parameters": [id_parameter()],
        "responses": {
            "200": book_response("The book"),
            "404": error_response("Book not found")
        }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "skip", "in": "query", "schema": { "type": "integer", "minimum": 0 } },
                        { "name": "limit", "in": "query", "schema": { "type": "integer", "minimum": 0, "maximum": 1000 } }
                    ],
                    "responses": {
                        "200": {
                            "description": "Books in id order",
                            "content": {
                                "application/json": {
                                    "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                                }
                            }
                        },
                        "422": error_response("Invalid paging")
                    }
                },
                "post": {
                    "summary": "Add a book by hand",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": { "schema": { "$ref": "#/components/schemas/CreateBook" } }
                        }
                    },
                    "responses": {
                        "201": book_response("Created book"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            },
            "/view": {
                "get": {
                    "summary": "Categorized library view",
                    "description": "Filters the library, groups it into Currently Reading / Unread / Finished sections and orders each by title. `layout=flat` returns one sequence in the same order.",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "filter", "in": "query", "schema": { "type": "string" }, "description": "`all` (default), `hidden`, or a collection id" },
                        { "name": "layout", "in": "query", "schema": { "type": "string", "enum": ["sections", "flat"] } }
                    ],
                    "responses": {
                        "200": {
                            "description": "The view",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/LibraryView" } } }
                        },
                        "422": error_response("Invalid filter")
                    }
                }
            },
            "/finished": {
                "get": {
                    "summary": "Books finished in a year",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "year", "in": "query", "schema": { "type": "integer" } }
                    ],
                    "responses": {
                        "200": {
                            "description": "Finished books ordered by title",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "year": { "type": "integer" },
                                            "count": { "type": "integer" },
                                            "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/{id}": item,
            "/{id}/progress": patch_operation("Update progress", "ProgressUpdate"),
            "/{id}/rating": patch_operation("Update rating", "RatingRequest"),
            "/{id}/review": patch_operation("Update review", "ReviewRequest"),
            "/{id}/visibility": patch_operation("Hide or unhide", "VisibilityRequest")
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string", "nullable": true },
                        "author": { "type": "string" },
                        "file_path": { "type": "string" },
                        "file_type": { "type": "string", "enum": ["epub", "pdf", "manual"] },
                        "file_size": { "type": "integer" },
                        "pages": { "type": "integer", "nullable": true },
                        "current_page": { "type": "integer" },
                        "progress": { "type": "number", "minimum": 0, "maximum": 1 },
                        "status": { "type": "string", "enum": ["reading", "unread", "finished"] },
                        "visibility": { "type": "string", "enum": ["visible", "hidden"] },
                        "collections": { "type": "array", "items": { "type": "integer" } },
                        "rating_stars": { "type": "integer", "minimum": 0, "maximum": 5 },
                        "review": { "type": "string", "nullable": true },
                        "cover_path": { "type": "string", "nullable": true },
                        "isbn": { "type": "string", "nullable": true },
                        "created_at": { "type": "string", "format": "date-time" },
                        "last_updated": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "author", "progress", "status", "visibility", "rating_stars"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "pages": { "type": "integer" },
                        "isbn": { "type": "string" },
                        "cover_path": { "type": "string" }
                    },
                    "required": ["title"]
                },
                "BookUpdate": {
                    "type": "object",
                    "properties": {
                        "progress": { "type": "number" },
                        "current_page": { "type": "integer", "minimum": 0 },
                        "rating_stars": { "type": "integer", "minimum": 0, "maximum": 5 },
                        "review": { "type": "string", "nullable": true }
                    }
                },
                "ProgressUpdate": {
                    "type": "object",
                    "properties": {
                        "progress": { "type": "number" },
                        "current_page": { "type": "integer", "minimum": 0 }
                    }
                },
                "RatingRequest": {
                    "type": "object",
                    "properties": { "rating_stars": { "type": "integer", "minimum": 0, "maximum": 5 } },
                    "required": ["rating_stars"]
                },
                "ReviewRequest": {
                    "type": "object",
                    "properties": { "review": { "type": "string", "nullable": true } }
                },
                "VisibilityRequest": {
                    "type": "object",
                    "properties": { "visibility": { "type": "string", "enum": ["visible", "hidden"] } },
                    "required": ["visibility"]
                },
                "LibraryView": {
                    "type": "object",
                    "properties": {
                        "layout": { "type": "string", "enum": ["sections", "flat"] },
                        "filter": { "type": "string" },
                        "total": { "type": "integer" },
                        "sections": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "bucket": { "type": "string" },
                                    "label": { "type": "string" },
                                    "count": { "type": "integer" },
                                    "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                                }
                            }
                        },
                        "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                    }
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(pool: SqlitePool) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(pool))
}
