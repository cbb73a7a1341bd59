pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use folio_auth::Caller;
use folio_db::{BookFilter, BookRecord, BookStore, NewBook};
use folio_http::error::AppError;
use folio_kernel::{AppState, InitCtx, Migration, Module};

use crate::modules::reviews::service::ReviewEngine;
use crate::utils::{self, DEFAULT_LIST_LIMIT, DEFAULT_REVIEW_LIMIT};

use models::{BookDetail, BookList, CreateBook, DetailQuery, ListQuery, SearchQuery};

/// Books module: catalog listing, search, and the per-book aggregate view.
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route("/search", get(search_books))
            .route("/{id}", get(get_book))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books with pagination and filters",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "page",
                                "in": "query",
                                "schema": {"type": "integer", "minimum": 1, "default": 1}
                            },
                            {
                                "name": "limit",
                                "in": "query",
                                "schema": {"type": "integer", "minimum": 1, "default": 10}
                            },
                            {
                                "name": "author",
                                "in": "query",
                                "schema": {"type": "string"}
                            },
                            {
                                "name": "genre",
                                "in": "query",
                                "schema": {"type": "string"}
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Paginated book listing",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/BookList"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "security": [{"bearerAuth": []}],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/CreateBook"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Book created",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "400": {
                                "description": "Invalid payload",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/search": {
                    "get": {
                        "summary": "Search books by title or author",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "query",
                                "in": "query",
                                "required": true,
                                "schema": {"type": "string"}
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            },
                            "400": {
                                "description": "Missing search query",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch a book with its aggregate rating and a page of reviews",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": {"type": "string", "format": "uuid"}
                            },
                            {
                                "name": "page",
                                "in": "query",
                                "schema": {"type": "integer", "minimum": 1, "default": 1}
                            },
                            {
                                "name": "limit",
                                "in": "query",
                                "schema": {"type": "integer", "minimum": 1, "default": 5}
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Book detail with reviews",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/BookDetail"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "title": {
                                "type": "string"
                            },
                            "author": {
                                "type": "string"
                            },
                            "genre": {
                                "type": "string"
                            },
                            "created_at": {
                                "type": "string",
                                "format": "date-time"
                            }
                        },
                        "required": ["id", "title", "author", "created_at"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string"
                            },
                            "author": {
                                "type": "string"
                            },
                            "genre": {
                                "type": "string"
                            }
                        },
                        "required": ["title", "author"]
                    },
                    "BookList": {
                        "type": "object",
                        "properties": {
                            "total": {
                                "type": "integer"
                            },
                            "page": {
                                "type": "integer"
                            },
                            "limit": {
                                "type": "integer"
                            },
                            "books": {
                                "type": "array",
                                "items": {
                                    "$ref": "#/components/schemas/Book"
                                }
                            }
                        },
                        "required": ["total", "page", "limit", "books"]
                    },
                    "BookDetail": {
                        "allOf": [
                            {"$ref": "#/components/schemas/Book"},
                            {
                                "type": "object",
                                "properties": {
                                    "average_rating": {
                                        "type": "string",
                                        "nullable": true
                                    },
                                    "reviews": {
                                        "type": "array",
                                        "items": {
                                            "$ref": "#/components/schemas/Review"
                                        }
                                    }
                                }
                            }
                        ]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                DEFINE TABLE book SCHEMAFULL;
                DEFINE FIELD title      ON book TYPE string ASSERT $value != "";
                DEFINE FIELD author     ON book TYPE string ASSERT $value != "";
                DEFINE FIELD genre      ON book TYPE string;
                DEFINE FIELD created_at ON book TYPE datetime;
                "#,
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

/// List books with pagination and optional author/genre filters
async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookList>, AppError> {
    let filter = BookFilter {
        author: query.author,
        genre: query.genre,
    };
    let (page, window) = utils::page_window(query.page, query.limit, DEFAULT_LIST_LIMIT);

    let books = state
        .stores
        .books
        .list(&filter, window)
        .await
        .map_err(utils::store_failure)?;
    let total = state
        .stores
        .books
        .count(&filter)
        .await
        .map_err(utils::store_failure)?;

    Ok(Json(BookList {
        total,
        page,
        limit: window.limit,
        books,
    }))
}

/// Search books by title or author substring
async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<BookRecord>>, AppError> {
    let Some(term) = query.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Err(AppError::bad_request("missing search query"));
    };

    let books = state
        .stores
        .books
        .search(term)
        .await
        .map_err(utils::store_failure)?;

    Ok(Json(books))
}

/// Fetch a book together with its aggregate rating and a page of reviews
async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<BookDetail>, AppError> {
    let Some(book) = state
        .stores
        .books
        .find_by_id(id)
        .await
        .map_err(utils::store_failure)?
    else {
        return Err(AppError::not_found("book not found"));
    };

    let (_, window) = utils::page_window(query.page, query.limit, DEFAULT_REVIEW_LIMIT);
    let aggregate = ReviewEngine::new(&state.stores)
        .book_aggregate(id, window)
        .await?;

    Ok(Json(BookDetail {
        book,
        average_rating: aggregate.average_rating,
        reviews: aggregate.reviews,
    }))
}

/// Create a book in the catalog
async fn create_book(
    State(state): State<AppState>,
    _caller: Caller,
    Json(body): Json<CreateBook>,
) -> Result<(StatusCode, Json<BookRecord>), AppError> {
    let mut details = Vec::new();
    if body.title.trim().is_empty() {
        details.push(json!({"field": "title", "error": "required"}));
    }
    if body.author.trim().is_empty() {
        details.push(json!({"field": "author", "error": "required"}));
    }
    if !details.is_empty() {
        return Err(AppError::validation(details, "invalid book payload"));
    }

    let record = state
        .stores
        .books
        .insert(NewBook {
            title: body.title,
            author: body.author,
            genre: body.genre,
        })
        .await
        .map_err(utils::store_failure)?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_declare_the_book_table() {
        let module = BooksModule::new();
        let migrations = module.migrations();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].id, "001_init");
        assert!(migrations[0].up.contains("DEFINE TABLE book"));
    }

    #[test]
    fn openapi_covers_every_route() {
        let module = BooksModule::new();
        let spec = module.openapi().unwrap();
        let paths = spec["paths"].as_object().unwrap();
        assert!(paths.contains_key("/"));
        assert!(paths.contains_key("/search"));
        assert!(paths.contains_key("/{id}"));
    }
}
