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

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::use_cases::{
    account_use_case::AccountUseCase, payment_use_case::PaymentUseCase,
    roast_use_case::RoastUseCase,
};
use crate::config::settings::Settings;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::services::{
    analysis_service::AnalysisService, llm_service::LLMService,
    screenshot_service::ScreenshotService,
};
use crate::engines::{scraper_engine::HttpScraper, screenshot_engine::ScreenshotApiRenderer};
use crate::infrastructure::repositories::{
    purchase_repo_impl::PurchaseRepositoryImpl, roast_repo_impl::RoastRepositoryImpl,
    roast_result_repo_impl::RoastResultRepositoryImpl,
    share_link_repo_impl::ShareLinkRepositoryImpl, user_repo_impl::UserRepositoryImpl,
};
use crate::infrastructure::services::payment_service_impl::StripeGateway;

/// 路由层需要的全部用例
#[derive(Clone)]
pub struct AppDependencies {
    pub roasts: Arc<RoastUseCase>,
    pub accounts: Arc<AccountUseCase>,
    pub payments: Arc<PaymentUseCase>,
}

impl AppDependencies {
    /// 根据配置组装仓库、引擎、领域服务和用例
    ///
    /// 外部密钥缺失不会阻止启动，对应操作会在调用时返回配置错误
    pub fn from_settings(
        settings: &Settings,
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageRepository>,
    ) -> anyhow::Result<Self> {
        let roast_repo = Arc::new(RoastRepositoryImpl::new(db.clone()));
        let result_repo = Arc::new(RoastResultRepositoryImpl::new(db.clone()));
        let share_repo = Arc::new(ShareLinkRepositoryImpl::new(db.clone()));
        let user_repo = Arc::new(UserRepositoryImpl::new(db.clone()));
        let purchase_repo = Arc::new(PurchaseRepositoryImpl::new(db));

        let renderer = Arc::new(ScreenshotApiRenderer::new(&settings.screenshot)?);
        let scraper = Arc::new(HttpScraper::new(&settings.scraper)?);
        let llm = Arc::new(LLMService::new(&settings.llm)?);
        let gateway = Arc::new(StripeGateway::new(&settings.payments)?);

        if settings.screenshot.api_key.is_none() {
            warn!("Screenshot API key not configured, analysis requests will fail");
        }
        if settings.llm.api_key.is_none() {
            warn!("LLM API key not configured, analysis requests will fail");
        }

        let screenshots = Arc::new(ScreenshotService::new(renderer, storage));
        let analysis = Arc::new(AnalysisService::new(
            roast_repo.clone(),
            result_repo.clone(),
            screenshots.clone(),
            scraper,
            llm,
        ));

        let roasts = Arc::new(RoastUseCase::new(
            roast_repo.clone(),
            result_repo,
            share_repo,
            analysis,
            screenshots,
            settings.anonymous.max_roasts_per_session,
            settings.scraper.allow_private_hosts,
        ));
        let accounts = Arc::new(AccountUseCase::new(user_repo.clone()));
        let payments = Arc::new(PaymentUseCase::new(
            gateway,
            purchase_repo,
            user_repo,
            roast_repo,
            settings.payments.clone(),
        ));

        info!("Application services initialized");
        Ok(Self {
            roasts,
            accounts,
            payments,
        })
    }
}
