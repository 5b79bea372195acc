//! User resource handlers
//!
//! Thin adapters between the validated HTTP input and
//! [`application::UserService`].

use application::ListUsers;
use axum::{extract::State, http::StatusCode};
use domain::{User, UserId};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    envelope::{ApiResponse, success},
    error::ApiError,
    middleware::validation::{
        ValidatedJson, ValidatedPath, ValidatedQuery, validate_positive_integer, validate_uuid,
    },
    state::AppState,
};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;

/// A user as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "a@b.com")]
    pub email: String,
    #[schema(example = "A")]
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_uuid(),
            email: user.email.as_str().to_string(),
            name: user.name,
        }
    }
}

/// Pagination metadata of a user listing
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PageMeta {
    /// Users matching the filter, across all pages
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

/// Body of `POST /users`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(
        required(message = "Required"),
        email(message = "Invalid email")
    )]
    #[schema(value_type = String, example = "a@b.com")]
    pub email: Option<String>,

    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Name must not be empty")
    )]
    #[schema(value_type = String, example = "A")]
    pub name: Option<String>,
}

/// Query of `GET /users`
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// 1-based page number (default "1")
    #[validate(custom(function = "validate_positive_integer"))]
    pub page: Option<String>,
    /// Page size (default "10")
    #[validate(custom(function = "validate_positive_integer"))]
    pub limit: Option<String>,
    /// Case-insensitive filter over every field
    pub q: Option<String>,
}

impl ListUsersQuery {
    fn into_params(self) -> ListUsers {
        let number = |value: Option<String>, default: u32| {
            value
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(default)
        };

        ListUsers {
            page: number(self.page, DEFAULT_PAGE),
            limit: number(self.limit, DEFAULT_LIMIT),
            query: self.q,
        }
    }
}

/// Path of `GET /users/{id}`
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct UserPath {
    /// User id (UUID)
    #[validate(custom(function = "validate_uuid"))]
    pub id: String,
}

/// List users
///
/// Filtered by `q`, then paginated. `meta` carries the filtered total.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "One page of users", body = crate::openapi::UserListEnvelope),
        (status = 422, description = "Invalid query", body = crate::openapi::ErrorEnvelope)
    )
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> Result<ApiResponse<Vec<UserResponse>, PageMeta>, ApiError> {
    let page = state.users.list(&query.into_params()).await?;

    let meta = PageMeta {
        total: page.total,
        page: page.page,
        limit: page.limit,
    };
    let items = page.items.into_iter().map(UserResponse::from).collect();

    Ok(success(items).with_meta(meta))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(UserPath),
    responses(
        (status = 200, description = "The user", body = crate::openapi::UserEnvelope),
        (status = 404, description = "No user with that id", body = crate::openapi::ErrorEnvelope),
        (status = 422, description = "Id is not a UUID", body = crate::openapi::ErrorEnvelope)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ValidatedPath(path): ValidatedPath<UserPath>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let id = UserId::parse(&path.id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let user = state.users.get(id).await?;
    Ok(success(user.into()))
}

/// Create a user
///
/// The email is stored exactly as submitted.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = crate::openapi::UserEnvelope),
        (status = 400, description = "Malformed JSON", body = crate::openapi::ErrorEnvelope),
        (status = 422, description = "Invalid body", body = crate::openapi::ErrorEnvelope)
    )
)]
#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateUserRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let email = body.email.unwrap_or_default();
    let name = body.name.unwrap_or_default();

    let user = state.users.create(&email, &name).await?;
    Ok(success(user.into()).with_status(StatusCode::CREATED))
}
