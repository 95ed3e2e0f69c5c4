use actix_web::HttpRequest;

use crate::api::error::ApiError;
use crate::api::token_store::SharedTokenStore;
use crate::config::schema::Role;

/// Extracts the bearer token from `Authorization: Bearer <token>`, looks it
/// up, and enforces that its role is at least `required` per §4.8's role
/// matrix (`Admin > Operator > Viewer`, each level inheriting the ones
/// below it).
pub fn authenticate(req: &HttpRequest, store: &SharedTokenStore, required: Role) -> Result<Role, ApiError> {
    let token = bearer_token(req).ok_or(ApiError::Unauthenticated)?;
    let role = store
        .read()
        .expect("token store poisoned")
        .role_for(token)
        .ok_or(ApiError::Unauthenticated)?;

    if role < required {
        return Err(ApiError::Forbidden);
    }
    Ok(role)
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
