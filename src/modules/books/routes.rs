use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, Utc};
use localreads_http::error::AppError;
use localreads_library::{
    finished_in_year, flat_view, Book, BookId, BookUpdate, FilterSelector, LibraryView,
    ProgressUpdate, Rating,
};
use serde_json::json;
use sqlx::SqlitePool;

use super::models::{
    CreateBook, FinishedBooks, FinishedQuery, FlatView, Layout, Pagination, RatingRequest,
    ReviewRequest, ViewQuery, ViewResponse, VisibilityRequest,
};
use super::repo;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 1000;

pub(crate) async fn health_check() -> &'static str {
    "books module is healthy"
}

pub(crate) async fn list_books(
    State(pool): State<SqlitePool>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Book>>, AppError> {
    let skip = page.skip.unwrap_or(0);
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if skip < 0 {
        return Err(AppError::invalid_field("skip", "skip must not be negative"));
    }
    if !(0..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::invalid_field(
            "limit",
            format!("limit must be between 0 and {MAX_PAGE_SIZE}"),
        ));
    }

    Ok(Json(repo::list_page(&pool, skip, limit).await?))
}

pub(crate) async fn create_book(
    State(pool): State<SqlitePool>,
    Json(request): Json<CreateBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::invalid_field("title", "title must not be empty"));
    }
    if let Some(pages) = request.pages {
        if pages < 0 {
            return Err(AppError::invalid_field("pages", "pages must not be negative"));
        }
    }

    let book = repo::insert(&pool, &request.into_new_book()).await?;
    tracing::info!(book_id = book.id, title = ?book.title, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

pub(crate) async fn get_book(
    State(pool): State<SqlitePool>,
    Path(id): Path<BookId>,
) -> Result<Json<Book>, AppError> {
    match repo::get(&pool, id).await {
        Ok(book) => Ok(Json(book)),
        Err(sqlx::Error::RowNotFound) => Err(book_not_found(id)),
        Err(err) => Err(err.into()),
    }
}

/// The view engine over the current snapshot.
pub(crate) async fn view_books(
    State(pool): State<SqlitePool>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, AppError> {
    let filter: FilterSelector = query.filter.as_deref().unwrap_or_default().parse()?;
    let books = repo::list_all(&pool).await?;

    let response = match query.layout.unwrap_or_default() {
        Layout::Sections => ViewResponse::Sections(LibraryView::build(&books, filter)),
        Layout::Flat => {
            let ordered = flat_view(&books, filter);
            ViewResponse::Flat(FlatView {
                filter: filter.to_string(),
                total: ordered.len(),
                books: ordered,
            })
        }
    };

    Ok(Json(response).into_response())
}

pub(crate) async fn finished_books(
    State(pool): State<SqlitePool>,
    Query(query): Query<FinishedQuery>,
) -> Result<Response, AppError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let books = repo::list_all(&pool).await?;
    let finished = finished_in_year(&books, year);

    Ok(Json(FinishedBooks {
        year,
        count: finished.len(),
        books: finished,
    })
    .into_response())
}

pub(crate) async fn update_book(
    State(pool): State<SqlitePool>,
    Path(id): Path<BookId>,
    Json(update): Json<BookUpdate>,
) -> Result<Json<Book>, AppError> {
    apply_update(&pool, id, update).await
}

pub(crate) async fn update_progress(
    State(pool): State<SqlitePool>,
    Path(id): Path<BookId>,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<Book>, AppError> {
    apply_update(&pool, id, update.into()).await
}

pub(crate) async fn update_rating(
    State(pool): State<SqlitePool>,
    Path(id): Path<BookId>,
    Json(request): Json<RatingRequest>,
) -> Result<Json<Book>, AppError> {
    let rating = Rating::new(request.rating_stars)?;
    apply_update(&pool, id, BookUpdate::rating(rating)).await
}

pub(crate) async fn update_review(
    State(pool): State<SqlitePool>,
    Path(id): Path<BookId>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Book>, AppError> {
    apply_update(&pool, id, BookUpdate::review(request.review)).await
}

pub(crate) async fn update_visibility(
    State(pool): State<SqlitePool>,
    Path(id): Path<BookId>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<Book>, AppError> {
    let book = match repo::set_visibility(&pool, id, request.visibility).await {
        Ok(book) => book,
        Err(sqlx::Error::RowNotFound) => return Err(book_not_found(id)),
        Err(err) => return Err(err.into()),
    };
    tracing::info!(book_id = id, visibility = request.visibility.as_str(), "visibility changed");
    Ok(Json(book))
}

async fn apply_update(pool: &SqlitePool, id: BookId, update: BookUpdate) -> Result<Json<Book>, AppError> {
    if update.is_empty() {
        return Err(AppError::validation(
            vec![json!({ "field": "body", "error": "no updatable fields given" })],
            "update contains no fields",
        ));
    }

    let book = match repo::get(pool, id).await {
        Ok(book) => book,
        Err(sqlx::Error::RowNotFound) => return Err(book_not_found(id)),
        Err(err) => return Err(err.into()),
    };
    let updated = update.apply(&book, Utc::now())?;
    repo::save_reading_state(pool, &updated).await?;

    tracing::info!(
        book_id = id,
        progress = updated.progress,
        current_page = updated.current_page,
        status = %updated.status,
        "book updated"
    );
    Ok(Json(updated))
}

fn book_not_found(id: BookId) -> AppError {
    AppError::not_found(format!("book {id} not found"))
}
