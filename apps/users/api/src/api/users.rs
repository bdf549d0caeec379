use axum::Router;
use domain_users::{InMemoryUserRepository, UserService, handlers};

pub fn router() -> Router {
    let repository = InMemoryUserRepository::new();
    let service = UserService::new(repository);
    handlers::router(service)
}
