#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
pub fn create_admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "test-admin".to_string(),
        email: Some("admin@example.com".to_string()),
        roles: vec!["admin".to_string()],
    }
}

#[cfg(test)]
pub fn create_editor_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "test-editor".to_string(),
        email: None,
        roles: vec!["editor".to_string()],
    }
}

#[cfg(test)]
async fn inject_admin_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_admin_user());
    next.run(request).await
}

#[cfg(test)]
async fn inject_editor_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_editor_user());
    next.run(request).await
}

/// Wrap a router so every request is authenticated as an admin
#[cfg(test)]
pub fn with_admin_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_admin_middleware))
}

/// Wrap a router so every request is authenticated as an editor
#[cfg(test)]
pub fn with_editor_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_editor_middleware))
}
