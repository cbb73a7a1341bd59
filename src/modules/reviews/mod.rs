pub mod models;
pub mod service;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use folio_auth::Caller;
use folio_db::{ReviewPatch, ReviewRecord};
use folio_http::error::AppError;
use folio_kernel::{AppState, InitCtx, Migration, Module};

use models::CreateReview;
use service::ReviewEngine;

/// Reviews module: create/update/delete of user reviews.
pub struct ReviewsModule;

impl ReviewsModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "reviews module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/book/{book_id}", post(create_review))
            .route("/{id}", put(update_review).delete(delete_review))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/book/{book_id}": {
                    "post": {
                        "summary": "Create a review for a book",
                        "tags": ["Reviews"],
                        "security": [{"bearerAuth": []}],
                        "parameters": [
                            {
                                "name": "book_id",
                                "in": "path",
                                "required": true,
                                "schema": {"type": "string", "format": "uuid"}
                            }
                        ],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/CreateReview"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Review created",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Review"
                                        }
                                    }
                                }
                            },
                            "400": {
                                "description": "Invalid payload or already reviewed",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            },
                            "401": {
                                "description": "Authentication required",
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
                    "put": {
                        "summary": "Update own review",
                        "tags": ["Reviews"],
                        "security": [{"bearerAuth": []}],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": {"type": "string", "format": "uuid"}
                            }
                        ],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/UpdateReview"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Updated review",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Review"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Review not found or unauthorized",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "delete": {
                        "summary": "Delete own review",
                        "tags": ["Reviews"],
                        "security": [{"bearerAuth": []}],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": {"type": "string", "format": "uuid"}
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Deletion confirmation"
                            },
                            "404": {
                                "description": "Review not found or unauthorized",
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
                    "Review": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "book": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "user": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "rating": {
                                "type": "integer",
                                "minimum": 1,
                                "maximum": 5
                            },
                            "comment": {
                                "type": "string"
                            },
                            "created_at": {
                                "type": "string",
                                "format": "date-time"
                            }
                        },
                        "required": ["id", "book", "user", "rating", "created_at"]
                    },
                    "CreateReview": {
                        "type": "object",
                        "properties": {
                            "rating": {
                                "type": "integer",
                                "minimum": 1,
                                "maximum": 5
                            },
                            "comment": {
                                "type": "string"
                            }
                        },
                        "required": ["rating"]
                    },
                    "UpdateReview": {
                        "type": "object",
                        "properties": {
                            "rating": {
                                "type": "integer",
                                "minimum": 1,
                                "maximum": 5
                            },
                            "comment": {
                                "type": "string"
                            }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                DEFINE TABLE review SCHEMAFULL;
                DEFINE FIELD book       ON review TYPE record<book>;
                DEFINE FIELD user       ON review TYPE record<user>;
                DEFINE FIELD rating     ON review TYPE int ASSERT $value >= 1 AND $value <= 5;
                DEFINE FIELD comment    ON review TYPE string;
                DEFINE FIELD created_at ON review TYPE datetime;
                DEFINE INDEX review_user_book_unique ON review FIELDS user, book UNIQUE;
                DEFINE TABLE user SCHEMAFULL;
                DEFINE FIELD name ON user TYPE string;
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module stopped");
        Ok(())
    }
}

fn validate_rating(rating: u8) -> Result<(), AppError> {
    if (1..=5).contains(&rating) {
        return Ok(());
    }
    Err(AppError::validation(
        vec![json!({"field": "rating", "error": "must be between 1 and 5"})],
        "invalid review payload",
    ))
}

/// Create a review for a book on behalf of the caller
async fn create_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(book_id): Path<Uuid>,
    Json(body): Json<CreateReview>,
) -> Result<(StatusCode, Json<ReviewRecord>), AppError> {
    validate_rating(body.rating)?;

    let engine = ReviewEngine::new(&state.stores);
    let record = engine
        .create(caller.user_id, book_id, body.rating, body.comment)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Update the caller's own review
async fn update_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(patch): Json<ReviewPatch>,
) -> Result<Json<ReviewRecord>, AppError> {
    if let Some(rating) = patch.rating {
        validate_rating(rating)?;
    }

    let engine = ReviewEngine::new(&state.stores);
    let record = engine.update(caller.user_id, id, patch).await?;

    Ok(Json(record))
}

/// Delete the caller's own review
async fn delete_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = ReviewEngine::new(&state.stores);
    engine.delete(caller.user_id, id).await?;

    Ok(Json(json!({"message": "review deleted"})))
}

/// Create a new instance of the reviews module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ReviewsModule::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        for rating in 1..=5 {
            assert!(validate_rating(rating).is_ok());
        }
    }

    #[test]
    fn migrations_declare_the_user_book_unique_index() {
        let module = ReviewsModule::new();
        let migrations = module.migrations();
        assert_eq!(migrations.len(), 1);
        assert!(migrations[0].up.contains("review_user_book_unique"));
        assert!(migrations[0].up.contains("UNIQUE"));
    }
}
