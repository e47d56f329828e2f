//! Usuario que actúa en la request
//!
//! El token JWT del header Authorization identifica al usuario que registra
//! la situación. La autorización queda fuera de este servicio.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{user_id_from_claims, verify_token, JwtConfig},
    },
};

/// Usuario autenticado que se inyecta en los handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser {
    pub user_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for ActingUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|auth_str| auth_str.to_str().ok())
            .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Bearer token required".to_string()))?;

        let claims = verify_token(token, &JwtConfig::from(&state.config))?;
        let user_id = user_id_from_claims(&claims)?;

        Ok(ActingUser { user_id })
    }
}
