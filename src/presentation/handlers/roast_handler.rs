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
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::roast_request::{
    AnalyzeRequestDto, AnalyzeResponseDto, ClaimRoastRequestDto, CreateRoastRequestDto,
    ListRoastsQuery, ShareResponseDto,
};
use crate::application::use_cases::roast_use_case::RoastUseCase;
use crate::presentation::errors::AppError;
use crate::presentation::extractors::current_user::Caller;
use crate::presentation::view::RoastResponse;

/// 创建 roast
pub async fn create_roast(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Caller(identity): Caller,
    Json(payload): Json<CreateRoastRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    let roast = use_case.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(RoastResponse::from(roast))))
}

/// 触发分析，完成后返回总分
///
/// 分析在请求内同步执行；失败时返回非 2xx 和 `{error}`
pub async fn analyze(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Json(payload): Json<AnalyzeRequestDto>,
) -> Result<Json<AnalyzeResponseDto>, AppError> {
    let roast = use_case.trigger(payload.request_id).await?;
    Ok(Json(AnalyzeResponseDto {
        success: true,
        id: roast.id,
        score: roast.score,
    }))
}

/// 重试失败的 roast
pub async fn retry_roast(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Caller(identity): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<RoastResponse>, AppError> {
    let roast = use_case.retry(&identity, id).await?;
    Ok(Json(roast.into()))
}

/// 轮询 roast 状态
pub async fn get_roast(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Caller(identity): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<RoastResponse>, AppError> {
    let roast = use_case.get(&identity, id).await?;
    Ok(Json(roast.into()))
}

/// 当前用户的 roast 列表
pub async fn list_roasts(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Caller(identity): Caller,
    Query(query): Query<ListRoastsQuery>,
) -> Result<Json<Vec<RoastResponse>>, AppError> {
    let roasts = use_case.list(&identity, query).await?;
    Ok(Json(roasts.into_iter().map(RoastResponse::from).collect()))
}

/// 删除 roast
pub async fn delete_roast(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Caller(identity): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    use_case.delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 创建（或返回已有的）分享链接
pub async fn share_roast(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Caller(identity): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<ShareResponseDto>, AppError> {
    let link = use_case.share(&identity, id).await?;
    Ok(Json(ShareResponseDto {
        share_id: link.share_id,
    }))
}

/// 公开读取分享的结果
pub async fn get_shared(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Path(share_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = use_case.get_shared(&share_id).await?;
    Ok(Json(record))
}

/// 认领匿名 roast
pub async fn claim_roast(
    Extension(use_case): Extension<Arc<RoastUseCase>>,
    Caller(identity): Caller,
    Json(payload): Json<ClaimRoastRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    let roast = use_case.claim(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(RoastResponse::from(roast))))
}
