// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::application::use_cases::account_use_case::AccountUseCase;
use crate::domain::models::user::Identity;
use crate::presentation::errors::AppError;

/// 匿名会话请求头
pub const SESSION_HEADER: &str = "x-session-id";

/// 认证状态
#[derive(Clone)]
pub struct AuthState {
    pub accounts: Arc<AccountUseCase>,
}

/// 认证中间件
///
/// 解析调用者身份并以 `Identity` 扩展注入请求：
/// 携带 bearer 令牌时必须有效，否则返回 401；`X-Session-Id` 为可选的匿名会话。
/// 没有任何凭证的请求也会放行，由用例决定是否需要身份。
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    debug!("AuthMiddleware processing path: {}", req.uri().path());

    let token = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AppError::status(StatusCode::UNAUTHORIZED, "Malformed Authorization header"))?;
            match value.strip_prefix("Bearer ") {
                Some(token) => Some(token.trim().to_string()),
                None => {
                    return Err(AppError::status(
                        StatusCode::UNAUTHORIZED,
                        "Authorization header must use the Bearer scheme",
                    ))
                }
            }
        }
        None => None,
    };

    let user = match token {
        Some(token) => match state.accounts.authenticate(&token).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                warn!("Rejected unknown API key");
                return Err(AppError::status(StatusCode::UNAUTHORIZED, "Invalid API key"));
            }
            Err(e) => {
                error!("Failed to check API key: {}", e);
                return Err(AppError::status(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to check API key",
                ));
            }
        },
        None => None,
    };

    let session_id = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    req.extensions_mut().insert(Identity { user, session_id });
    Ok(next.run(req).await)
}

#[cfg(test)]
#[path = "auth_middleware_test.rs"]
mod tests;
