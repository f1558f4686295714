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

use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::dto::account_request::CheckoutRequestDto;
use crate::config::settings::PaymentSettings;
use crate::domain::models::purchase::Purchase;
use crate::domain::models::user::Identity;
use crate::domain::repositories::purchase_repository::PurchaseRepository;
use crate::domain::repositories::roast_repository::{RepositoryError, RoastRepository};
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::services::payment_service::{
    CheckoutRequest, CheckoutSession, PaymentEvent, PaymentGateway,
};
use crate::utils::errors::RoastError;

/// 支付用例
///
/// 创建结账会话，并在服务商回调后把用户升级为 Pro
pub struct PaymentUseCase {
    gateway: Arc<dyn PaymentGateway>,
    purchase_repo: Arc<dyn PurchaseRepository>,
    user_repo: Arc<dyn UserRepository>,
    roast_repo: Arc<dyn RoastRepository>,
    settings: PaymentSettings,
}

impl PaymentUseCase {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        purchase_repo: Arc<dyn PurchaseRepository>,
        user_repo: Arc<dyn UserRepository>,
        roast_repo: Arc<dyn RoastRepository>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            gateway,
            purchase_repo,
            user_repo,
            roast_repo,
            settings,
        }
    }

    /// 为当前用户创建结账会话并记录 pending 购买
    pub async fn checkout(
        &self,
        identity: &Identity,
        dto: CheckoutRequestDto,
    ) -> Result<CheckoutSession, RoastError> {
        let user = identity
            .user
            .as_ref()
            .ok_or_else(|| RoastError::Unauthorized("sign in to upgrade".to_string()))?;
        if user.is_pro {
            return Err(RoastError::Conflict("account is already pro".to_string()));
        }
        if !self.gateway.is_configured() {
            return Err(RoastError::Configuration(
                "Payment provider not configured".to_string(),
            ));
        }

        if let Some(roast_id) = dto.request_id {
            let roast = self
                .roast_repo
                .find_by_id(roast_id)
                .await?
                .ok_or_else(|| RoastError::NotFound(format!("Roast {}", roast_id)))?;
            if !roast.is_owned_by_user(user.id) {
                return Err(RoastError::Forbidden(
                    "only the owner can upgrade from this roast".to_string(),
                ));
            }
        }

        let request = CheckoutRequest {
            user_id: user.id,
            email: user.email.clone(),
            roast_id: dto.request_id,
            amount_cents: self.settings.price_cents,
            currency: self.settings.currency.clone(),
            product_name: self.settings.product_name.clone(),
            success_url: self.settings.success_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
        };
        let session = self.gateway.create_checkout_session(&request).await?;

        let purchase = Purchase::new(
            user.id,
            dto.request_id,
            session.id.clone(),
            request.amount_cents,
            request.currency,
        );
        self.purchase_repo.create(&purchase).await?;
        info!("Checkout session {} created for user {}", session.id, user.id);

        Ok(session)
    }

    /// 处理服务商回调
    ///
    /// 验签失败返回 `Validation`；同一会话重复回调不会重复计数
    pub async fn handle_webhook(&self, signature: &str, payload: &[u8]) -> Result<(), RoastError> {
        let event = self.gateway.parse_webhook(signature, payload)?;

        let (session_id, event_user) = match event {
            PaymentEvent::CheckoutCompleted {
                session_id,
                user_id,
            } => (session_id, user_id),
            PaymentEvent::Ignored { event_type } => {
                info!("Ignoring payment event {}", event_type);
                return Ok(());
            }
        };

        let purchase = self.purchase_repo.find_by_provider_session(&session_id).await?;
        let user_id = match (purchase.as_ref().map(|p| p.user_id), event_user) {
            (Some(id), _) | (None, Some(id)) => id,
            (None, None) => {
                warn!("Checkout {} completed for an unknown user", session_id);
                return Ok(());
            }
        };

        let newly_completed = if purchase.is_some() {
            self.purchase_repo
                .mark_completed(&session_id, Utc::now())
                .await?
        } else {
            warn!("No purchase recorded for checkout {}", session_id);
            true
        };

        self.user_repo
            .set_pro(user_id, true)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => RoastError::NotFound(format!("User {}", user_id)),
                other => other.into(),
            })?;

        if newly_completed {
            counter!("payments_completed_total").increment(1);
            info!("User {} upgraded to pro via {}", user_id, session_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::purchase::PurchaseStatus;
    use crate::domain::models::roast::Roast;
    use crate::domain::models::user::User;
    use crate::domain::services::payment_service::PaymentError;
    use crate::infrastructure::repositories::in_memory::{
        InMemoryPurchaseRepository, InMemoryRoastRepository, InMemoryUserRepository,
    };
    use crate::infrastructure::services::payment_service_impl::{
        generate_signature, StripeGateway,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    const WEBHOOK_SECRET: &str = "whsec_test";

    fn settings() -> PaymentSettings {
        PaymentSettings {
            secret_key: Some("sk_test".to_string()),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            api_base_url: "http://127.0.0.1:9".to_string(),
            price_cents: 2900,
            currency: "usd".to_string(),
            product_name: "Web3 Roast Pro".to_string(),
            success_url: "https://app.test/success".to_string(),
            cancel_url: "https://app.test/cancel".to_string(),
            signature_tolerance_secs: 300,
        }
    }

    /// 结账走桩，验签走真实实现
    struct StubGateway {
        inner: StripeGateway,
        configured: bool,
        requests: Mutex<Vec<CheckoutRequest>>,
    }

    impl StubGateway {
        fn new(configured: bool) -> Self {
            Self {
                inner: StripeGateway::new(&settings()).unwrap(),
                configured,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_checkout_session(
            &self,
            request: &CheckoutRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            self.requests.lock().push(request.clone());
            Ok(CheckoutSession {
                id: "cs_test_1".to_string(),
                url: "https://checkout.test/cs_test_1".to_string(),
            })
        }

        fn parse_webhook(
            &self,
            signature_header: &str,
            payload: &[u8],
        ) -> Result<PaymentEvent, PaymentError> {
            self.inner.parse_webhook(signature_header, payload)
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    struct Fixture {
        gateway: Arc<StubGateway>,
        purchases: Arc<InMemoryPurchaseRepository>,
        users: Arc<InMemoryUserRepository>,
        roasts: Arc<InMemoryRoastRepository>,
        use_case: PaymentUseCase,
    }

    fn fixture(configured: bool) -> Fixture {
        let gateway = Arc::new(StubGateway::new(configured));
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let roasts = Arc::new(InMemoryRoastRepository::new());
        let use_case = PaymentUseCase::new(
            gateway.clone(),
            purchases.clone(),
            users.clone(),
            roasts.clone(),
            settings(),
        );
        Fixture {
            gateway,
            purchases,
            users,
            roasts,
            use_case,
        }
    }

    async fn registered(f: &Fixture) -> Identity {
        let user = f
            .users
            .create(&User::new("founder@protocol.xyz".to_string()))
            .await
            .unwrap();
        Identity {
            user: Some(user),
            session_id: None,
        }
    }

    fn signed(payload: &[u8]) -> String {
        let ts = Utc::now().timestamp();
        format!("t={},v1={}", ts, generate_signature(WEBHOOK_SECRET, ts, payload))
    }

    fn completed_event(session_id: &str) -> Vec<u8> {
        json!({
            "type": "checkout.session.completed",
            "data": { "object": { "id": session_id } }
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_checkout_records_pending_purchase() {
        let f = fixture(true);
        let identity = registered(&f).await;

        let session = f
            .use_case
            .checkout(&identity, CheckoutRequestDto::default())
            .await
            .unwrap();

        assert_eq!(session.id, "cs_test_1");
        let purchase = f
            .purchases
            .find_by_provider_session("cs_test_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Pending);
        assert_eq!(purchase.amount_cents, 2900);
        assert_eq!(Some(purchase.user_id), identity.user_id());

        let requests = f.gateway.requests.lock();
        assert_eq!(requests[0].email, "founder@protocol.xyz");
    }

    #[tokio::test]
    async fn test_checkout_requires_configured_gateway() {
        let f = fixture(false);
        let identity = registered(&f).await;

        let err = f
            .use_case
            .checkout(&identity, CheckoutRequestDto::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RoastError::Configuration(_)));
        assert!(f.gateway.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_rejects_foreign_roast() {
        let f = fixture(true);
        let identity = registered(&f).await;
        let foreign = f
            .roasts
            .create(&Roast::new_for_user(
                "https://example.com".to_string(),
                uuid::Uuid::new_v4(),
            ))
            .await
            .unwrap();

        let err = f
            .use_case
            .checkout(
                &identity,
                CheckoutRequestDto {
                    request_id: Some(foreign.id),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RoastError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_anonymous_checkout_is_unauthorized() {
        let f = fixture(true);
        let err = f
            .use_case
            .checkout(&Identity::default(), CheckoutRequestDto::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RoastError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_webhook_upgrades_user_once() {
        let f = fixture(true);
        let identity = registered(&f).await;
        f.use_case
            .checkout(&identity, CheckoutRequestDto::default())
            .await
            .unwrap();

        let payload = completed_event("cs_test_1");
        f.use_case
            .handle_webhook(&signed(&payload), &payload)
            .await
            .unwrap();
        f.use_case
            .handle_webhook(&signed(&payload), &payload)
            .await
            .unwrap();

        let user_id = identity.user_id().unwrap();
        assert!(f.users.find_by_id(user_id).await.unwrap().unwrap().is_pro);
        let purchase = f
            .purchases
            .find_by_provider_session("cs_test_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert!(purchase.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_webhook_with_bad_signature_changes_nothing() {
        let f = fixture(true);
        let identity = registered(&f).await;
        f.use_case
            .checkout(&identity, CheckoutRequestDto::default())
            .await
            .unwrap();

        let payload = completed_event("cs_test_1");
        let err = f
            .use_case
            .handle_webhook("t=1,v1=deadbeef", &payload)
            .await
            .unwrap_err();

        assert!(matches!(err, RoastError::Validation(_)));
        let user_id = identity.user_id().unwrap();
        assert!(!f.users.find_by_id(user_id).await.unwrap().unwrap().is_pro);
    }

    #[tokio::test]
    async fn test_already_pro_cannot_checkout() {
        let f = fixture(true);
        let mut identity = registered(&f).await;
        if let Some(user) = identity.user.as_mut() {
            user.is_pro = true;
        }

        let err = f
            .use_case
            .checkout(&identity, CheckoutRequestDto::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RoastError::Conflict(_)));
    }
}
