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

use crate::{
    application::dto::roast_request::{ClaimRoastRequestDto, CreateRoastRequestDto, ListRoastsQuery},
    domain::{
        models::{
            roast::{Roast, RoastStatus},
            roast_result::RoastResultRecord,
            share_link::ShareLink,
            user::Identity,
        },
        repositories::{
            roast_repository::{RepositoryError, RoastRepository},
            roast_result_repository::RoastResultRepository,
            share_link_repository::ShareLinkRepository,
        },
        services::{analysis_service::AnalysisService, screenshot_service::ScreenshotService},
    },
    engines::validators,
    utils::errors::RoastError,
};
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u64 = 20;

/// Roast 用例
///
/// 创建、触发、查询、删除、分享和认领 roast。
/// 所有权检查在这里完成：登录用户按 `user_id`，匿名调用者按会话ID。
pub struct RoastUseCase {
    roast_repo: Arc<dyn RoastRepository>,
    result_repo: Arc<dyn RoastResultRepository>,
    share_repo: Arc<dyn ShareLinkRepository>,
    analysis: Arc<AnalysisService>,
    screenshots: Arc<ScreenshotService>,
    max_anonymous_roasts: u64,
    allow_private_hosts: bool,
}

impl RoastUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        roast_repo: Arc<dyn RoastRepository>,
        result_repo: Arc<dyn RoastResultRepository>,
        share_repo: Arc<dyn ShareLinkRepository>,
        analysis: Arc<AnalysisService>,
        screenshots: Arc<ScreenshotService>,
        max_anonymous_roasts: u64,
        allow_private_hosts: bool,
    ) -> Self {
        Self {
            roast_repo,
            result_repo,
            share_repo,
            analysis,
            screenshots,
            max_anonymous_roasts,
            allow_private_hosts,
        }
    }

    /// 创建 pending 状态的 roast
    ///
    /// 登录用户直接归属用户；匿名调用者必须提供会话ID，且受试用次数限制
    pub async fn create(
        &self,
        identity: &Identity,
        dto: CreateRoastRequestDto,
    ) -> Result<Roast, RoastError> {
        dto.validate()
            .map_err(|e| RoastError::Validation(e.to_string()))?;
        let url = self.normalize_url(&dto.url)?;

        let roast = match identity.user_id() {
            Some(user_id) => Roast::new_for_user(url, user_id),
            None => {
                let session_id = dto
                    .session_id
                    .or_else(|| identity.session_id.clone())
                    .ok_or_else(|| {
                        RoastError::Unauthorized(
                            "sign in or provide a session id to create a roast".to_string(),
                        )
                    })?;

                let used = self.roast_repo.count_by_session(&session_id).await?;
                if used >= self.max_anonymous_roasts {
                    return Err(RoastError::Forbidden(
                        "free roast already used, sign up to roast more sites".to_string(),
                    ));
                }
                Roast::new_anonymous(url, session_id)
            }
        };

        let created = self.roast_repo.create(&roast).await?;
        let owner = if created.is_anonymous() { "anonymous" } else { "user" };
        counter!("roasts_created_total", "owner" => owner).increment(1);
        info!("Created roast {} for {}", created.id, created.url);
        Ok(created)
    }

    /// 触发分析
    pub async fn trigger(&self, id: Uuid) -> Result<Roast, RoastError> {
        self.analysis.run(id).await
    }

    /// 失败的 roast 重置为 pending 后重新分析
    pub async fn retry(&self, identity: &Identity, id: Uuid) -> Result<Roast, RoastError> {
        self.analysis.ensure_configured()?;

        let roast = self.load_owned(identity, id).await?;
        if roast.status != RoastStatus::Failed {
            return Err(RoastError::Conflict(format!(
                "only failed roasts can be retried (status: {})",
                roast.status
            )));
        }

        // 条件更新 failed → pending，并发重试只有一个能成功
        self.roast_repo
            .reset_failed(id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => RoastError::Conflict(msg),
                RepositoryError::NotFound => RoastError::NotFound(format!("Roast {}", id)),
                other => other.into(),
            })?;
        info!("Retrying roast {}", id);

        self.analysis.run(id).await
    }

    /// 查询 roast
    pub async fn get(&self, identity: &Identity, id: Uuid) -> Result<Roast, RoastError> {
        let roast = self.find(id).await?;
        if !can_read(identity, &roast) {
            return Err(RoastError::Forbidden(
                "you do not have access to this roast".to_string(),
            ));
        }
        Ok(roast)
    }

    /// 列出当前用户的 roast
    pub async fn list(
        &self,
        identity: &Identity,
        query: ListRoastsQuery,
    ) -> Result<Vec<Roast>, RoastError> {
        query
            .validate()
            .map_err(|e| RoastError::Validation(e.to_string()))?;
        let user_id = identity
            .user_id()
            .ok_or_else(|| RoastError::Unauthorized("sign in to see your roasts".to_string()))?;

        Ok(self
            .roast_repo
            .list_by_user(
                user_id,
                query.sort,
                query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
                query.offset.unwrap_or(0),
            )
            .await?)
    }

    /// 删除 roast 及其分享链接、结果快照和截图
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), RoastError> {
        self.load_owned(identity, id).await?;

        self.share_repo.delete_by_roast_id(id).await?;
        self.result_repo.delete_by_roast_id(id).await?;
        if !self.roast_repo.delete(id).await? {
            return Err(RoastError::NotFound(format!("Roast {}", id)));
        }

        if let Err(e) = self.screenshots.remove(id).await {
            warn!("Roast {} deleted but screenshot removal failed: {}", id, e);
        }
        info!("Deleted roast {}", id);
        Ok(())
    }

    /// 创建分享链接，同一 roast 重复调用返回同一个链接
    pub async fn share(&self, identity: &Identity, id: Uuid) -> Result<ShareLink, RoastError> {
        let roast = self.load_owned(identity, id).await?;
        if roast.status != RoastStatus::Completed {
            return Err(RoastError::Conflict(
                "only completed roasts can be shared".to_string(),
            ));
        }

        if let Some(existing) = self.share_repo.find_by_roast_id(id).await? {
            return Ok(existing);
        }

        match self.share_repo.create(&ShareLink::new(id)).await {
            Ok(link) => Ok(link),
            // 并发创建时读取已存在的链接
            Err(RepositoryError::Conflict(_)) => self
                .share_repo
                .find_by_roast_id(id)
                .await?
                .ok_or_else(|| RoastError::Conflict("share link could not be created".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// 公开读取分享的结果，不做所有权检查
    pub async fn get_shared(&self, share_id: &str) -> Result<RoastResultRecord, RoastError> {
        let link = self
            .share_repo
            .find_by_share_id(share_id)
            .await?
            .ok_or_else(|| RoastError::NotFound(format!("Share {}", share_id)))?;

        if let Some(record) = self.result_repo.find_by_roast_id(link.roast_id).await? {
            return Ok(record);
        }

        let roast = self.find(link.roast_id).await?;
        RoastResultRecord::from_completed(&roast)
            .ok_or_else(|| RoastError::NotFound(format!("Result for share {}", share_id)))
    }

    /// 认领匿名 roast
    ///
    /// 为登录用户创建一条内容相同的新记录，并把匿名记录标记为已认领
    pub async fn claim(
        &self,
        identity: &Identity,
        dto: ClaimRoastRequestDto,
    ) -> Result<Roast, RoastError> {
        dto.validate()
            .map_err(|e| RoastError::Validation(e.to_string()))?;
        let user_id = identity
            .user_id()
            .ok_or_else(|| RoastError::Unauthorized("sign in to claim a roast".to_string()))?;

        let anonymous = self.find(dto.request_id).await?;
        if !anonymous.is_anonymous() || anonymous.session_id.as_deref() != Some(dto.session_id.as_str()) {
            return Err(RoastError::Forbidden(
                "session does not own this roast".to_string(),
            ));
        }
        if anonymous.is_claimed() {
            return Err(RoastError::Conflict(
                "roast has already been claimed".to_string(),
            ));
        }
        if anonymous.status != RoastStatus::Completed {
            return Err(RoastError::Conflict(format!(
                "only completed roasts can be claimed (status: {})",
                anonymous.status
            )));
        }

        let owned = anonymous.claim_copy(user_id)?;
        self.roast_repo
            .mark_claimed(anonymous.id, user_id, Utc::now())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => RoastError::Conflict(msg),
                other => other.into(),
            })?;

        let owned = match self.roast_repo.create(&owned).await {
            Ok(owned) => owned,
            Err(e) => {
                // 副本未写入时撤销认领，匿名记录可以再次认领
                match self.roast_repo.release_claim(anonymous.id, user_id).await {
                    Ok(_) => warn!("Claim of roast {} rolled back: {}", anonymous.id, e),
                    Err(release_err) => error!(
                        "Claim of roast {} failed ({}) and could not be released: {}",
                        anonymous.id, e, release_err
                    ),
                }
                return Err(e.into());
            }
        };
        if let Some(record) = RoastResultRecord::from_completed(&owned) {
            if let Err(e) = self.result_repo.upsert(&record).await {
                warn!(
                    "Claimed roast {} has no result snapshot: {}",
                    owned.id, e
                );
            }
        }

        info!(
            "User {} claimed roast {} as {}",
            user_id, anonymous.id, owned.id
        );
        Ok(owned)
    }

    async fn find(&self, id: Uuid) -> Result<Roast, RoastError> {
        self.roast_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| RoastError::NotFound(format!("Roast {}", id)))
    }

    async fn load_owned(&self, identity: &Identity, id: Uuid) -> Result<Roast, RoastError> {
        let roast = self.find(id).await?;
        if !is_owner(identity, &roast) {
            return Err(RoastError::Forbidden(
                "only the owner can modify this roast".to_string(),
            ));
        }
        Ok(roast)
    }

    fn normalize_url(&self, raw: &str) -> Result<String, RoastError> {
        if !self.allow_private_hosts {
            return validators::validate_target_url(raw)
                .map_err(|e| RoastError::Validation(e.to_string()));
        }

        let url = Url::parse(raw.trim()).map_err(|e| RoastError::Validation(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
            return Err(RoastError::Validation(format!(
                "Unsupported URL: {}",
                raw
            )));
        }
        Ok(url.to_string())
    }
}

fn is_owner(identity: &Identity, roast: &Roast) -> bool {
    if let Some(user_id) = identity.user_id() {
        if roast.is_owned_by_user(user_id) {
            return true;
        }
    }
    identity
        .session_id
        .as_deref()
        .is_some_and(|session| roast.is_owned_by_session(session))
}

/// 所有者可读；认领者仍可读取被认领的匿名原件
fn can_read(identity: &Identity, roast: &Roast) -> bool {
    is_owner(identity, roast)
        || identity
            .user_id()
            .is_some_and(|user_id| roast.claimed_by_user_id == Some(user_id))
}

#[cfg(test)]
#[path = "roast_use_case_test.rs"]
mod tests;
