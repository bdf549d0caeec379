use axum::Router;

pub mod users;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper, so users are
/// served at `/api/users` and `/api/users/{id}`, not at a bare `/users`.
pub fn routes() -> Router {
    Router::new().nest("/users", users::router())
}
