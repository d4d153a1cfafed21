pub mod repo;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use localreads_http::error::AppError;
use localreads_kernel::{InitCtx, Migration, Module};
use localreads_library::{BookId, Collection, CollectionId};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::modules::books::repo as books;

use repo::CollectionSummary;

/// Collections: named, many-to-many groupings of books.
pub struct CollectionsModule {
    pool: SqlitePool,
}

impl CollectionsModule {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollection {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[async_trait]
impl Module for CollectionsModule {
    fn name(&self) -> &'static str {
        "collections"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_collections).post(create_collection))
            .route("/{id}", delete(delete_collection))
            .route(
                "/{id}/books/{book_id}",
                put(add_membership).delete(remove_membership),
            )
            .with_state(self.pool.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let no_content = json!({ "description": "Done" });
        let not_found = json!({
            "description": "Collection or book not found",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
            }
        });
        let path_ids = json!([
            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } },
            { "name": "book_id", "in": "path", "required": true, "schema": { "type": "integer" } }
        ]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List collections",
                        "tags": ["Collections"],
                        "responses": {
                            "200": {
                                "description": "Collections ordered by name",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Collection" } }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a collection",
                        "tags": ["Collections"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/CreateCollection" } }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Collection" } }
                                }
                            },
                            "409": { "description": "Name already taken", "content": not_found["content"].clone() },
                            "422": { "description": "Empty name", "content": not_found["content"].clone() }
                        }
                    }
                },
                "/{id}": {
                    "delete": {
                        "summary": "Delete a collection (its books are kept)",
                        "tags": ["Collections"],
                        "parameters": [path_ids[0].clone()],
                        "responses": { "204": no_content.clone(), "404": not_found.clone() }
                    }
                },
                "/{id}/books/{book_id}": {
                    "put": {
                        "summary": "Add a book to a collection",
                        "tags": ["Collections"],
                        "parameters": path_ids.clone(),
                        "responses": { "204": no_content.clone(), "404": not_found.clone() }
                    },
                    "delete": {
                        "summary": "Remove a book from a collection",
                        "tags": ["Collections"],
                        "parameters": path_ids,
                        "responses": { "204": no_content, "404": not_found }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Collection": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "name": { "type": "string" },
                            "description": { "type": "string", "nullable": true },
                            "created_at": { "type": "string", "format": "date-time" },
                            "book_count": { "type": "integer" }
                        },
                        "required": ["id", "name", "created_at"]
                    },
                    "CreateCollection": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "description": { "type": "string" }
                        },
                        "required": ["name"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_collections",
            up: repo::MIGRATION,
        }]
    }
}

async fn list_collections(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<CollectionSummary>>, AppError> {
    Ok(Json(repo::list(&pool).await?))
}

async fn create_collection(
    State(pool): State<SqlitePool>,
    Json(request): Json<CreateCollection>,
) -> Result<(StatusCode, Json<Collection>), AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_field("name", "name must not be empty"));
    }
    if let Some(existing) = repo::find_by_name(&pool, name).await? {
        return Err(AppError::conflict(
            vec![json!({ "field": "name", "existing_id": existing })],
            format!("a collection named '{name}' already exists"),
        ));
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());
    let collection = repo::create(&pool, name, description).await?;
    tracing::info!(collection_id = collection.id, name = %collection.name, "collection created");
    Ok((StatusCode::CREATED, Json(collection)))
}

async fn delete_collection(
    State(pool): State<SqlitePool>,
    Path(id): Path<CollectionId>,
) -> Result<StatusCode, AppError> {
    if !repo::delete(&pool, id).await? {
        return Err(collection_not_found(id));
    }
    tracing::info!(collection_id = id, "collection deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn add_membership(
    State(pool): State<SqlitePool>,
    Path((id, book_id)): Path<(CollectionId, BookId)>,
) -> Result<StatusCode, AppError> {
    ensure_both_exist(&pool, id, book_id).await?;
    repo::add_book(&pool, id, book_id).await?;
    tracing::info!(collection_id = id, book_id, "book added to collection");
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_membership(
    State(pool): State<SqlitePool>,
    Path((id, book_id)): Path<(CollectionId, BookId)>,
) -> Result<StatusCode, AppError> {
    ensure_both_exist(&pool, id, book_id).await?;
    let removed = repo::remove_book(&pool, id, book_id).await?;
    tracing::info!(collection_id = id, book_id, removed, "book removed from collection");
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_both_exist(
    pool: &SqlitePool,
    id: CollectionId,
    book_id: BookId,
) -> Result<(), AppError> {
    if !repo::exists(pool, id).await? {
        return Err(collection_not_found(id));
    }
    if !books::exists(pool, book_id).await? {
        return Err(AppError::not_found(format!("book {book_id} not found")));
    }
    Ok(())
}

fn collection_not_found(id: CollectionId) -> AppError {
    AppError::not_found(format!("collection {id} not found"))
}

/// Create a new instance of the collections module
pub fn create_module(pool: SqlitePool) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(CollectionsModule::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::{body_json, send, TestApp};
    use axum::response::IntoResponse;

    async fn create(app: &TestApp, name: &str) -> axum::response::Response {
        send(&app.router, "POST", "/api/collections", Some(json!({ "name": name }))).await
    }

    #[tokio::test]
    async fn racing_duplicate_insert_is_a_conflict() {
        let app = TestApp::new().await;
        repo::create(&app.pool, "Sci-Fi", None).await.unwrap();

        // skips the name lookup the handler does, as a concurrent request would
        let err = repo::create(&app.pool, "sci-fi", None).await.unwrap_err();
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"]["code"], "conflict");
    }

    #[tokio::test]
    async fn collection_lifecycle() {
        let app = TestApp::new().await;
        let book = books::insert(&app.pool, &books::tests::new_book("Member", ""))
            .await
            .unwrap();

        let created = create(&app, "  Favourites ").await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let collection = body_json(created).await;
        assert_eq!(collection["name"], "Favourites");
        let id = collection["id"].as_i64().unwrap();

        let membership = format!("/api/collections/{id}/books/{}", book.id);
        for _ in 0..2 {
            let added = send(&app.router, "PUT", &membership, None).await;
            assert_eq!(added.status(), StatusCode::NO_CONTENT);
        }

        let view = body_json(
            send(&app.router, "GET", &format!("/api/books/view?filter={id}&layout=flat"), None).await,
        )
        .await;
        assert_eq!(view["total"], 1);

        let listed = body_json(send(&app.router, "GET", "/api/collections", None).await).await;
        assert_eq!(listed[0]["book_count"], 1);

        let removed = send(&app.router, "DELETE", &membership, None).await;
        assert_eq!(removed.status(), StatusCode::NO_CONTENT);

        let deleted = send(&app.router, "DELETE", &format!("/api/collections/{id}"), None).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        let again = send(&app.router, "DELETE", &format!("/api/collections/{id}"), None).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);

        let kept = send(&app.router, "GET", &format!("/api/books/{}", book.id), None).await;
        assert_eq!(kept.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_validates_names() {
        let app = TestApp::new().await;
        assert_eq!(create(&app, "   ").await.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(create(&app, "Sci-Fi").await.status(), StatusCode::CREATED);
        assert_eq!(create(&app, "sci-fi").await.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn membership_requires_existing_rows() {
        let app = TestApp::new().await;
        let missing = send(&app.router, "PUT", "/api/collections/5/books/1", None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let created = body_json(create(&app, "Shelf").await).await;
        let id = created["id"].as_i64().unwrap();
        let no_book = send(&app.router, "PUT", &format!("/api/collections/{id}/books/77"), None).await;
        assert_eq!(no_book.status(), StatusCode::NOT_FOUND);
    }
}
