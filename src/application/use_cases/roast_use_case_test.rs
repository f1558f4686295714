// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::domain::models::analysis::tests::sample_result;
use crate::domain::models::user::User;
use crate::domain::repositories::roast_repository::RoastSort;
use crate::domain::services::analysis_service::tests::{
    scraped, MockScraper, StubLlm, StubRenderer,
};
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::services::llm_service::LLMServiceTrait;
use crate::domain::services::screenshot_service::screenshot_key;
use crate::engines::traits::WebsiteScraper;
use crate::infrastructure::repositories::in_memory::{
    InMemoryRoastRepository, InMemoryRoastResultRepository, InMemoryShareLinkRepository,
};
use crate::infrastructure::storage::InMemoryStorage;
use crate::utils::errors::RoastError;
use async_trait::async_trait;
use chrono::DateTime;
use mockall::mock;
use sea_orm::DbErr;

const SESSION: &str = "session-1";

struct Fixture {
    roasts: Arc<InMemoryRoastRepository>,
    results: Arc<InMemoryRoastResultRepository>,
    shares: Arc<InMemoryShareLinkRepository>,
    storage: Arc<InMemoryStorage>,
    use_case: RoastUseCase,
}

fn scraper() -> MockScraper {
    let mut scraper = MockScraper::new();
    scraper.expect_scrape().returning(|_| scraped());
    scraper.expect_name().return_const("mock");
    scraper
}

fn fixture_with(renderer: StubRenderer, llm: StubLlm, max_anonymous_roasts: u64) -> Fixture {
    let roasts = Arc::new(InMemoryRoastRepository::new());
    let results = Arc::new(InMemoryRoastResultRepository::new());
    let shares = Arc::new(InMemoryShareLinkRepository::new());
    let storage = Arc::new(InMemoryStorage::new());
    let screenshots = Arc::new(ScreenshotService::new(
        Arc::new(renderer),
        storage.clone(),
    ));
    let scraper: Arc<dyn WebsiteScraper> = Arc::new(scraper());
    let llm: Arc<dyn LLMServiceTrait> = Arc::new(llm);
    let analysis = Arc::new(AnalysisService::new(
        roasts.clone(),
        results.clone(),
        screenshots.clone(),
        scraper,
        llm,
    ));
    let use_case = RoastUseCase::new(
        roasts.clone(),
        results.clone(),
        shares.clone(),
        analysis,
        screenshots,
        max_anonymous_roasts,
        true,
    );
    Fixture {
        roasts,
        results,
        shares,
        storage,
        use_case,
    }
}

fn fixture() -> Fixture {
    fixture_with(
        StubRenderer::ok(),
        StubLlm::new(vec![Ok(sample_result(72))]),
        1,
    )
}

fn anonymous() -> Identity {
    Identity {
        user: None,
        session_id: Some(SESSION.to_string()),
    }
}

fn signed_in() -> Identity {
    Identity {
        user: Some(User::new("founder@protocol.xyz".to_string())),
        session_id: None,
    }
}

fn create_dto(url: &str) -> CreateRoastRequestDto {
    CreateRoastRequestDto {
        url: url.to_string(),
        session_id: None,
    }
}

async fn completed_anonymous(f: &Fixture) -> Roast {
    let roast = f
        .use_case
        .create(&anonymous(), create_dto("https://example.com"))
        .await
        .unwrap();
    f.use_case.trigger(roast.id).await.unwrap()
}

#[tokio::test]
async fn test_anonymous_create_uses_session() {
    let f = fixture();

    let roast = f
        .use_case
        .create(&anonymous(), create_dto("https://example.com"))
        .await
        .unwrap();

    assert_eq!(roast.status, RoastStatus::Pending);
    assert_eq!(roast.session_id.as_deref(), Some(SESSION));
    assert!(roast.user_id.is_none());
    assert_eq!(f.roasts.len(), 1);
}

#[tokio::test]
async fn test_anonymous_trial_limit_is_enforced() {
    let f = fixture();
    f.use_case
        .create(&anonymous(), create_dto("https://example.com"))
        .await
        .unwrap();

    let err = f
        .use_case
        .create(&anonymous(), create_dto("https://example.org"))
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::Forbidden(_)));
    assert_eq!(f.roasts.len(), 1);
}

#[tokio::test]
async fn test_create_without_identity_is_unauthorized() {
    let f = fixture();

    let err = f
        .use_case
        .create(&Identity::default(), create_dto("https://example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::Unauthorized(_)));
    assert!(f.roasts.is_empty());
}

#[tokio::test]
async fn test_create_rejects_invalid_url() {
    let f = fixture();

    let err = f
        .use_case
        .create(&signed_in(), create_dto("not a url"))
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::Validation(_)));
    assert!(f.roasts.is_empty());
}

#[tokio::test]
async fn test_signed_in_user_is_not_limited() {
    let f = fixture();
    let identity = signed_in();

    for url in ["https://a.example", "https://b.example", "https://c.example"] {
        let roast = f.use_case.create(&identity, create_dto(url)).await.unwrap();
        assert_eq!(roast.user_id, identity.user_id());
    }
    assert_eq!(f.roasts.len(), 3);
}

#[tokio::test]
async fn test_get_enforces_ownership() {
    let f = fixture();
    let roast = f
        .use_case
        .create(&anonymous(), create_dto("https://example.com"))
        .await
        .unwrap();

    assert!(f.use_case.get(&anonymous(), roast.id).await.is_ok());

    let stranger = Identity {
        user: None,
        session_id: Some("other-session".to_string()),
    };
    let err = f.use_case.get(&stranger, roast.id).await.unwrap_err();
    assert!(matches!(err, RoastError::Forbidden(_)));

    let err = f
        .use_case
        .get(&anonymous(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RoastError::NotFound(_)));
}

#[tokio::test]
async fn test_claim_copies_result_to_user() {
    let f = fixture();
    let original = completed_anonymous(&f).await;
    let user = signed_in();

    let owned = f
        .use_case
        .claim(
            &user,
            ClaimRoastRequestDto {
                request_id: original.id,
                session_id: SESSION.to_string(),
            },
        )
        .await
        .unwrap();

    assert_ne!(owned.id, original.id);
    assert_eq!(owned.user_id, user.user_id());
    assert_eq!(owned.claimed_from, Some(original.id));
    assert_eq!(owned.result, original.result);
    assert_eq!(owned.score, original.score);
    assert_eq!(owned.status, RoastStatus::Completed);

    let source = f.roasts.find_by_id(original.id).await.unwrap().unwrap();
    assert_eq!(source.claimed_by_user_id, user.user_id());
    assert!(source.claimed_at.is_some());

    let record = f.results.find_by_roast_id(owned.id).await.unwrap().unwrap();
    assert_eq!(Some(record.result), original.result);

    // 认领者仍可读取原件，原会话失去所有权
    assert!(f.use_case.get(&user, original.id).await.is_ok());
    assert!(f.use_case.get(&anonymous(), original.id).await.is_err());
}

#[tokio::test]
async fn test_claim_with_wrong_session_is_forbidden() {
    let f = fixture();
    let original = completed_anonymous(&f).await;

    let err = f
        .use_case
        .claim(
            &signed_in(),
            ClaimRoastRequestDto {
                request_id: original.id,
                session_id: "someone-else".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::Forbidden(_)));
    assert_eq!(f.roasts.len(), 1);
    let source = f.roasts.find_by_id(original.id).await.unwrap().unwrap();
    assert!(!source.is_claimed());
}

#[tokio::test]
async fn test_second_claim_conflicts() {
    let f = fixture();
    let original = completed_anonymous(&f).await;
    let dto = || ClaimRoastRequestDto {
        request_id: original.id,
        session_id: SESSION.to_string(),
    };

    f.use_case.claim(&signed_in(), dto()).await.unwrap();
    let err = f.use_case.claim(&signed_in(), dto()).await.unwrap_err();

    assert!(matches!(err, RoastError::Conflict(_)));
    assert_eq!(f.roasts.len(), 2);
}

#[tokio::test]
async fn test_claim_requires_sign_in() {
    let f = fixture();
    let original = completed_anonymous(&f).await;

    let err = f
        .use_case
        .claim(
            &anonymous(),
            ClaimRoastRequestDto {
                request_id: original.id,
                session_id: SESSION.to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::Unauthorized(_)));
}

#[tokio::test]
async fn test_claim_of_pending_roast_conflicts() {
    let f = fixture();
    let roast = f
        .use_case
        .create(&anonymous(), create_dto("https://example.com"))
        .await
        .unwrap();

    let err = f
        .use_case
        .claim(
            &signed_in(),
            ClaimRoastRequestDto {
                request_id: roast.id,
                session_id: SESSION.to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::Conflict(_)));
    assert_eq!(f.roasts.len(), 1);
}

#[tokio::test]
async fn test_share_is_idempotent() {
    let f = fixture();
    let roast = completed_anonymous(&f).await;

    let first = f.use_case.share(&anonymous(), roast.id).await.unwrap();
    let second = f.use_case.share(&anonymous(), roast.id).await.unwrap();

    assert_eq!(first.share_id, second.share_id);
    assert_eq!(f.shares.len(), 1);

    let shared = f.use_case.get_shared(&first.share_id).await.unwrap();
    assert_eq!(shared.roast_id, roast.id);
    assert_eq!(Some(shared.score), roast.score);
}

#[tokio::test]
async fn test_share_unknown_roast_creates_nothing() {
    let f = fixture();

    let err = f
        .use_case
        .share(&anonymous(), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::NotFound(_)));
    assert!(f.shares.is_empty());
}

#[tokio::test]
async fn test_share_pending_roast_conflicts() {
    let f = fixture();
    let roast = f
        .use_case
        .create(&anonymous(), create_dto("https://example.com"))
        .await
        .unwrap();

    let err = f.use_case.share(&anonymous(), roast.id).await.unwrap_err();

    assert!(matches!(err, RoastError::Conflict(_)));
    assert!(f.shares.is_empty());
}

#[tokio::test]
async fn test_unknown_share_is_not_found() {
    let f = fixture();
    let err = f.use_case.get_shared("missing").await.unwrap_err();
    assert!(matches!(err, RoastError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_removes_share_result_and_screenshot() {
    let f = fixture();
    let roast = completed_anonymous(&f).await;
    f.use_case.share(&anonymous(), roast.id).await.unwrap();
    assert_eq!(f.storage.len(), 1);

    f.use_case.delete(&anonymous(), roast.id).await.unwrap();

    assert!(f.roasts.is_empty());
    assert!(f.shares.is_empty());
    assert!(f.results.find_by_roast_id(roast.id).await.unwrap().is_none());
    assert!(f
        .storage
        .get(&screenshot_key(roast.id))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_by_stranger_is_forbidden() {
    let f = fixture();
    let roast = completed_anonymous(&f).await;

    let err = f
        .use_case
        .delete(&signed_in(), roast.id)
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::Forbidden(_)));
    assert_eq!(f.roasts.len(), 1);
}

#[tokio::test]
async fn test_retry_reruns_failed_roast() {
    let f = fixture_with(
        StubRenderer::new(vec![
            Err(crate::engines::traits::EngineError::HttpStatus {
                status: 500,
                body: "boom".to_string(),
            }),
            Ok(crate::domain::services::analysis_service::tests::jpeg()),
        ]),
        StubLlm::new(vec![Ok(sample_result(64))]),
        1,
    );
    let roast = f
        .use_case
        .create(&anonymous(), create_dto("https://example.com"))
        .await
        .unwrap();
    assert!(f.use_case.trigger(roast.id).await.is_err());

    let completed = f.use_case.retry(&anonymous(), roast.id).await.unwrap();

    assert_eq!(completed.status, RoastStatus::Completed);
    assert_eq!(completed.score, Some(64));
    assert_eq!(completed.attempt_count, 2);
    assert!(completed.error_message.is_none());
}

#[tokio::test]
async fn test_retry_of_completed_roast_conflicts() {
    let f = fixture();
    let roast = completed_anonymous(&f).await;

    let err = f.use_case.retry(&anonymous(), roast.id).await.unwrap_err();

    assert!(matches!(err, RoastError::Conflict(_)));
}

#[tokio::test]
async fn test_list_requires_user_and_sorts_by_score() {
    let f = fixture_with(
        StubRenderer::new(vec![
            Ok(crate::domain::services::analysis_service::tests::jpeg()),
            Ok(crate::domain::services::analysis_service::tests::jpeg()),
        ]),
        StubLlm::new(vec![Ok(sample_result(40)), Ok(sample_result(90))]),
        1,
    );
    let user = signed_in();
    for url in ["https://low.example", "https://high.example"] {
        let roast = f.use_case.create(&user, create_dto(url)).await.unwrap();
        f.use_case.trigger(roast.id).await.unwrap();
    }

    let by_score = f
        .use_case
        .list(
            &user,
            ListRoastsQuery {
                sort: RoastSort::Score,
                limit: None,
                offset: None,
            },
        )
        .await
        .unwrap();
    let scores: Vec<_> = by_score.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![Some(90), Some(40)]);

    let err = f
        .use_case
        .list(
            &anonymous(),
            ListRoastsQuery {
                sort: RoastSort::Newest,
                limit: None,
                offset: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoastError::Unauthorized(_)));
}

mock! {
    pub RoastRepo {}
    #[async_trait]
    impl RoastRepository for RoastRepo {
        async fn create(&self, roast: &Roast) -> Result<Roast, RepositoryError>;
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Roast>, RepositoryError>;
        async fn update(&self, roast: &Roast) -> Result<Roast, RepositoryError>;
        async fn start_processing(&self, id: Uuid) -> Result<Roast, RepositoryError>;
        async fn reset_failed(&self, id: Uuid) -> Result<Roast, RepositoryError>;
        async fn set_screenshot_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError>;
        async fn mark_claimed(
            &self,
            id: Uuid,
            user_id: Uuid,
            claimed_at: DateTime<Utc>,
        ) -> Result<(), RepositoryError>;
        async fn release_claim(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError>;
        async fn list_by_user(
            &self,
            user_id: Uuid,
            sort: RoastSort,
            limit: u64,
            offset: u64,
        ) -> Result<Vec<Roast>, RepositoryError>;
        async fn count_by_session(&self, session_id: &str) -> Result<u64, RepositoryError>;
        async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
    }
}

fn use_case_over(roasts: MockRoastRepo) -> (RoastUseCase, Arc<InMemoryRoastResultRepository>) {
    let roasts: Arc<dyn RoastRepository> = Arc::new(roasts);
    let results = Arc::new(InMemoryRoastResultRepository::new());
    let screenshots = Arc::new(ScreenshotService::new(
        Arc::new(StubRenderer::ok()),
        Arc::new(InMemoryStorage::new()),
    ));
    let analysis = Arc::new(AnalysisService::new(
        roasts.clone(),
        results.clone(),
        screenshots.clone(),
        Arc::new(scraper()),
        Arc::new(StubLlm::new(vec![])),
    ));
    let use_case = RoastUseCase::new(
        roasts,
        results.clone(),
        Arc::new(InMemoryShareLinkRepository::new()),
        analysis,
        screenshots,
        1,
        true,
    );
    (use_case, results)
}

#[tokio::test]
async fn test_create_surfaces_repository_failure() {
    let mut roasts = MockRoastRepo::new();
    roasts
        .expect_count_by_session()
        .times(1)
        .returning(|_| {
            Err(RepositoryError::Database(DbErr::Custom(
                "connection reset".to_string(),
            )))
        });
    roasts.expect_create().times(0);
    let (use_case, _) = use_case_over(roasts);

    let err = use_case
        .create(&anonymous(), create_dto("https://example.com"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RoastError::Repository(RepositoryError::Database(_))
    ));
}

fn completed_anonymous_roast() -> Roast {
    Roast::new_anonymous("https://example.com".to_string(), SESSION.to_string())
        .start()
        .unwrap()
        .complete("https://cdn.test/shot.jpg".to_string(), sample_result(80))
        .unwrap()
}

#[tokio::test]
async fn test_claim_race_lost_creates_nothing() {
    let completed = completed_anonymous_roast();
    let id = completed.id;

    let mut roasts = MockRoastRepo::new();
    roasts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(completed.clone())));
    roasts
        .expect_mark_claimed()
        .times(1)
        .returning(|_, _, _| Err(RepositoryError::Conflict("already claimed".to_string())));
    roasts.expect_create().times(0);
    let (use_case, results) = use_case_over(roasts);

    let err = use_case
        .claim(
            &signed_in(),
            ClaimRoastRequestDto {
                request_id: id,
                session_id: SESSION.to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RoastError::Conflict(_)));
    assert!(results.find_by_roast_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_released_when_copy_cannot_be_written() {
    let completed = completed_anonymous_roast();
    let id = completed.id;
    let identity = signed_in();
    let user_id = identity.user_id().unwrap();

    let mut roasts = MockRoastRepo::new();
    roasts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(completed.clone())));
    roasts
        .expect_mark_claimed()
        .times(1)
        .returning(|_, _, _| Ok(()));
    roasts.expect_create().times(1).returning(|_| {
        Err(RepositoryError::Database(DbErr::Custom(
            "disk full".to_string(),
        )))
    });
    roasts
        .expect_release_claim()
        .withf(move |rid, uid| *rid == id && *uid == user_id)
        .times(1)
        .returning(|_, _| Ok(true));
    let (use_case, results) = use_case_over(roasts);

    let err = use_case
        .claim(
            &identity,
            ClaimRoastRequestDto {
                request_id: id,
                session_id: SESSION.to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RoastError::Repository(RepositoryError::Database(_))
    ));
    assert!(results.find_by_roast_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_retry_with_stale_snapshot_does_not_rerun() {
    let failed = Roast::new_anonymous("https://example.com".to_string(), SESSION.to_string())
        .start()
        .unwrap()
        .fail("rendering API returned HTTP 500")
        .unwrap();
    let id = failed.id;

    let mut roasts = MockRoastRepo::new();
    roasts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(failed.clone())));
    roasts.expect_reset_failed().times(1).returning(|_| {
        Err(RepositoryError::Conflict(
            "roast is not failed (status: processing)".to_string(),
        ))
    });
    roasts.expect_update().times(0);
    roasts.expect_start_processing().times(0);
    let (use_case, _) = use_case_over(roasts);

    let err = use_case.retry(&anonymous(), id).await.unwrap_err();

    assert!(matches!(err, RoastError::Conflict(_)));
}
