// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

use crate::app::AppDependencies;
use crate::presentation::handlers::{account_handler, payment_handler, roast_handler};
use crate::presentation::middleware::auth_middleware::{auth_middleware, AuthState};

/// 创建应用路由
///
/// 所有路由都经过认证中间件，它只解析身份，不强制登录
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(deps: AppDependencies) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route(
            "/v1/roasts",
            post(roast_handler::create_roast).get(roast_handler::list_roasts),
        )
        .route("/v1/roasts/claim", post(roast_handler::claim_roast))
        .route(
            "/v1/roasts/{id}",
            get(roast_handler::get_roast).delete(roast_handler::delete_roast),
        )
        .route("/v1/roasts/{id}/retry", post(roast_handler::retry_roast))
        .route("/v1/roasts/{id}/share", post(roast_handler::share_roast))
        .route("/v1/share/{share_id}", get(roast_handler::get_shared))
        .route("/v1/analyze", post(roast_handler::analyze))
        .route("/v1/auth/signup", post(account_handler::signup))
        .route("/v1/me", get(account_handler::me))
        .route(
            "/v1/me/upgrade-banner/dismiss",
            post(account_handler::dismiss_upgrade_banner),
        )
        .route("/v1/checkout", post(payment_handler::checkout))
        .route(
            "/v1/webhooks/payments",
            post(payment_handler::payment_webhook),
        )
        .layer(middleware::from_fn_with_state(
            AuthState {
                accounts: deps.accounts.clone(),
            },
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(Extension(deps.roasts))
        .layer(Extension(deps.accounts))
        .layer(Extension(deps.payments))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
