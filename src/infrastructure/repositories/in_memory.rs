// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内存仓库实现
//!
//! 与数据库实现保持相同的条件更新和唯一约束语义，用于服务层测试和本地开发

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::models::purchase::{Purchase, PurchaseStatus};
use crate::domain::models::roast::{Roast, RoastStatus};
use crate::domain::models::roast_result::RoastResultRecord;
use crate::domain::models::share_link::ShareLink;
use crate::domain::models::user::User;
use crate::domain::repositories::purchase_repository::PurchaseRepository;
use crate::domain::repositories::roast_repository::{RepositoryError, RoastRepository, RoastSort};
use crate::domain::repositories::roast_result_repository::RoastResultRepository;
use crate::domain::repositories::share_link_repository::ShareLinkRepository;
use crate::domain::repositories::user_repository::UserRepository;

/// 内存 roast 仓库
#[derive(Default)]
pub struct InMemoryRoastRepository {
    roasts: RwLock<HashMap<Uuid, Roast>>,
}

impl InMemoryRoastRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前记录数
    pub fn len(&self) -> usize {
        self.roasts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roasts.read().is_empty()
    }
}

#[async_trait]
impl RoastRepository for InMemoryRoastRepository {
    async fn create(&self, roast: &Roast) -> Result<Roast, RepositoryError> {
        let mut roasts = self.roasts.write();
        if roasts.contains_key(&roast.id) {
            return Err(RepositoryError::Conflict(format!(
                "roast {} already exists",
                roast.id
            )));
        }
        roasts.insert(roast.id, roast.clone());
        Ok(roast.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Roast>, RepositoryError> {
        Ok(self.roasts.read().get(&id).cloned())
    }

    async fn update(&self, roast: &Roast) -> Result<Roast, RepositoryError> {
        let mut roasts = self.roasts.write();
        let slot = roasts.get_mut(&roast.id).ok_or(RepositoryError::NotFound)?;
        *slot = roast.clone();
        Ok(roast.clone())
    }

    async fn start_processing(&self, id: Uuid) -> Result<Roast, RepositoryError> {
        let mut roasts = self.roasts.write();
        let roast = roasts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if roast.status != RoastStatus::Pending {
            return Err(RepositoryError::Conflict(format!(
                "roast is not pending (status: {})",
                roast.status
            )));
        }
        roast.status = RoastStatus::Processing;
        roast.attempt_count += 1;
        roast.updated_at = Utc::now();
        Ok(roast.clone())
    }

    async fn reset_failed(&self, id: Uuid) -> Result<Roast, RepositoryError> {
        let mut roasts = self.roasts.write();
        let roast = roasts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        let reset = roast.clone().reset_for_retry().map_err(|_| {
            RepositoryError::Conflict(format!("roast is not failed (status: {})", roast.status))
        })?;
        *roast = reset.clone();
        Ok(reset)
    }

    async fn set_screenshot_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError> {
        let mut roasts = self.roasts.write();
        let roast = roasts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        roast.screenshot_url = Some(url.to_string());
        roast.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_claimed(
        &self,
        id: Uuid,
        user_id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut roasts = self.roasts.write();
        let roast = roasts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if roast.claimed_by_user_id.is_some() {
            return Err(RepositoryError::Conflict(
                "roast has already been claimed".to_string(),
            ));
        }
        roast.claimed_by_user_id = Some(user_id);
        roast.claimed_at = Some(claimed_at);
        roast.updated_at = claimed_at;
        Ok(())
    }

    async fn release_claim(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        let mut roasts = self.roasts.write();
        match roasts.get_mut(&id) {
            Some(roast) if roast.claimed_by_user_id == Some(user_id) => {
                roast.claimed_by_user_id = None;
                roast.claimed_at = None;
                roast.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        sort: RoastSort,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Roast>, RepositoryError> {
        let mut owned: Vec<Roast> = self
            .roasts
            .read()
            .values()
            .filter(|r| r.user_id == Some(user_id))
            .cloned()
            .collect();

        owned.sort_by(|a, b| match sort {
            RoastSort::Newest => b.created_at.cmp(&a.created_at),
            RoastSort::Score => b
                .score
                .cmp(&a.score)
                .then_with(|| b.created_at.cmp(&a.created_at)),
        });

        Ok(owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        Ok(self
            .roasts
            .read()
            .values()
            .filter(|r| r.session_id.as_deref() == Some(session_id))
            .count() as u64)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.roasts.write().remove(&id).is_some())
    }
}

/// 内存结果快照仓库
#[derive(Default)]
pub struct InMemoryRoastResultRepository {
    records: RwLock<HashMap<Uuid, RoastResultRecord>>,
}

impl InMemoryRoastResultRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoastResultRepository for InMemoryRoastResultRepository {
    async fn upsert(&self, record: &RoastResultRecord) -> Result<(), RepositoryError> {
        self.records.write().insert(record.roast_id, record.clone());
        Ok(())
    }

    async fn find_by_roast_id(
        &self,
        roast_id: Uuid,
    ) -> Result<Option<RoastResultRecord>, RepositoryError> {
        Ok(self.records.read().get(&roast_id).cloned())
    }

    async fn delete_by_roast_id(&self, roast_id: Uuid) -> Result<(), RepositoryError> {
        self.records.write().remove(&roast_id);
        Ok(())
    }
}

/// 内存分享链接仓库
#[derive(Default)]
pub struct InMemoryShareLinkRepository {
    links: RwLock<HashMap<String, ShareLink>>,
}

impl InMemoryShareLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前链接数
    pub fn len(&self) -> usize {
        self.links.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.read().is_empty()
    }
}

#[async_trait]
impl ShareLinkRepository for InMemoryShareLinkRepository {
    async fn create(&self, link: &ShareLink) -> Result<ShareLink, RepositoryError> {
        let mut links = self.links.write();
        if links.contains_key(&link.share_id)
            || links.values().any(|l| l.roast_id == link.roast_id)
        {
            return Err(RepositoryError::Conflict(
                "share link already exists".to_string(),
            ));
        }
        links.insert(link.share_id.clone(), link.clone());
        Ok(link.clone())
    }

    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<ShareLink>, RepositoryError> {
        Ok(self.links.read().get(share_id).cloned())
    }

    async fn find_by_roast_id(&self, roast_id: Uuid) -> Result<Option<ShareLink>, RepositoryError> {
        Ok(self
            .links
            .read()
            .values()
            .find(|l| l.roast_id == roast_id)
            .cloned())
    }

    async fn delete_by_roast_id(&self, roast_id: Uuid) -> Result<(), RepositoryError> {
        self.links.write().retain(|_, l| l.roast_id != roast_id);
        Ok(())
    }
}

/// 内存用户仓库
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
    api_keys: RwLock<HashMap<String, Uuid>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(
                "email is already registered".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_pro(&self, id: Uuid, is_pro: bool) -> Result<(), RepositoryError> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.is_pro = is_pro;
        Ok(())
    }

    async fn dismiss_upgrade_banner(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.upgrade_banner_dismissed = true;
        Ok(())
    }

    async fn create_api_key(&self, key: &str, user_id: Uuid) -> Result<(), RepositoryError> {
        let mut keys = self.api_keys.write();
        if keys.contains_key(key) {
            return Err(RepositoryError::Conflict("api key already exists".to_string()));
        }
        keys.insert(key.to_string(), user_id);
        Ok(())
    }

    async fn find_by_api_key(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        let user_id = self.api_keys.read().get(key).copied();
        Ok(user_id.and_then(|id| self.users.read().get(&id).cloned()))
    }
}

/// 内存购买记录仓库
#[derive(Default)]
pub struct InMemoryPurchaseRepository {
    purchases: RwLock<HashMap<String, Purchase>>,
}

impl InMemoryPurchaseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn create(&self, purchase: &Purchase) -> Result<Purchase, RepositoryError> {
        let mut purchases = self.purchases.write();
        if purchases.contains_key(&purchase.provider_session_id) {
            return Err(RepositoryError::Conflict(
                "checkout session already recorded".to_string(),
            ));
        }
        purchases.insert(purchase.provider_session_id.clone(), purchase.clone());
        Ok(purchase.clone())
    }

    async fn find_by_provider_session(
        &self,
        provider_session_id: &str,
    ) -> Result<Option<Purchase>, RepositoryError> {
        Ok(self.purchases.read().get(provider_session_id).cloned())
    }

    async fn mark_completed(
        &self,
        provider_session_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut purchases = self.purchases.write();
        match purchases.get_mut(provider_session_id) {
            Some(p) if p.status == PurchaseStatus::Pending => {
                p.status = PurchaseStatus::Completed;
                p.completed_at = Some(completed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Purchase>, RepositoryError> {
        let mut purchases: Vec<_> = self
            .purchases
            .read()
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(purchases)
    }
}
