// src/services/auth.rs

use bcrypt::verify;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, LoginUserPayload, User},
};

pub const TOKEN_LIFETIME_DAYS: i64 = 7;

/// Emite um JWT HS256 para `user_id`, válido por 7 dias a partir de `now`.
pub fn create_token(secret: &str, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
    let expires_at = now + Duration::days(TOKEN_LIFETIME_DAYS);

    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

/// Valida assinatura e expiração. Qualquer falha vira `InvalidToken`.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self {
            user_repo,
            jwt_secret,
        }
    }

    pub async fn login(&self, payload: LoginUserPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = payload.password;
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!(user_id = %user.id, "Tentativa de login com senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        let token = create_token(&self.jwt_secret, user.id, Utc::now())?;
        Ok(AuthResponse { token })
    }

    /// Token → usuário ativo. Usuário removido depois da emissão também é `InvalidToken`.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        self.user_repo
            .find_by_id(self.user_repo.pool(), claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "segredo-de-teste";

    #[test]
    fn token_round_trip_keeps_subject() {
        let user_id = Uuid::new_v4();
        let token = create_token(SECRET, user_id, Utc::now()).unwrap();

        let claims = decode_token(SECRET, &token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(
            claims.exp - claims.iat,
            (TOKEN_LIFETIME_DAYS * 24 * 60 * 60) as usize
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token("outro", Uuid::new_v4(), Utc::now()).unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = Utc::now() - Duration::days(TOKEN_LIFETIME_DAYS + 1);
        let token = create_token(SECRET, Uuid::new_v4(), issued).unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode_token(SECRET, "não-é-jwt"), Err(AppError::InvalidToken)));
    }
}
