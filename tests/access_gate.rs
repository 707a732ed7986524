//! Access gate behaviour across a mount lifecycle.
//!
//! Runs on a paused Tokio clock so the redirect delay is observable
//! without waiting for it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use podcast_billing::adapters::InMemorySubscriptionStore;
use podcast_billing::application::handlers::subscription::SubscriptionStatusService;
use podcast_billing::application::{AccessGate, GuardOptions};
use podcast_billing::domain::access::{GateState, GateView};
use podcast_billing::domain::foundation::{DomainError, ErrorCode, UserId};
use podcast_billing::domain::subscription::{StatusSnapshot, SubscriptionStatus};
use podcast_billing::ports::{Notice, UserAccessRepository, ViewNavigator};

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Default)]
struct RecordingNavigator {
    notices: Mutex<Vec<Notice>>,
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn notice_count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }

    fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl ViewNavigator for RecordingNavigator {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// Repository whose reads never finish in time.
struct StalledUsers;

#[async_trait]
impl UserAccessRepository for StalledUsers {
    async fn update_status(&self, _: &UserId, _: StatusSnapshot) -> Result<(), DomainError> {
        Ok(())
    }

    async fn find_status(&self, _: &UserId) -> Result<Option<StatusSnapshot>, DomainError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Some(StatusSnapshot::for_status(SubscriptionStatus::Active)))
    }
}

fn user() -> UserId {
    UserId::new("5d0c6a8e-7f5b-4c43-9d8a-1b2c3d4e5f60").unwrap()
}

fn store_with(status: SubscriptionStatus) -> Arc<InMemorySubscriptionStore> {
    let store = Arc::new(InMemorySubscriptionStore::new());
    store.insert_user_with(&user(), StatusSnapshot::for_status(status));
    store
}

fn mount(
    options: GuardOptions,
    users: Arc<dyn UserAccessRepository>,
    navigator: &Arc<RecordingNavigator>,
) -> AccessGate {
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let status_service = SubscriptionStatusService::new(users, subscriptions);
    AccessGate::new(options, status_service, navigator.clone())
}

// =============================================================================
// Exactly-once side effects
// =============================================================================

#[tokio::test(start_paused = true)]
async fn many_renders_perform_one_check_and_one_redirect() {
    let store = store_with(SubscriptionStatus::Canceled);
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::default(), store.clone(), &navigator);
    let id = user();

    assert_eq!(gate.render(Some(&id)), GateView::Loading);
    for _ in 0..50 {
        gate.render(Some(&id));
    }

    assert_eq!(gate.settled().await, GateState::Redirecting);
    for _ in 0..50 {
        assert_eq!(gate.render(Some(&id)), GateView::Loading);
    }

    assert_eq!(store.user_read_count(), 1);
    assert_eq!(navigator.notice_count(), 1);
    assert!(navigator.routes().is_empty());

    tokio::time::sleep(Duration::from_millis(1_999)).await;
    assert!(navigator.routes().is_empty());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(navigator.routes(), vec!["/settings".to_string()]);

    tokio::time::sleep(Duration::from_secs(30)).await;
    gate.render(Some(&id));
    assert_eq!(store.user_read_count(), 1);
    assert_eq!(navigator.notice_count(), 1);
    assert_eq!(navigator.routes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn identity_arriving_late_still_checks_once() {
    let store = store_with(SubscriptionStatus::Unpaid);
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::default(), store.clone(), &navigator);

    for _ in 0..10 {
        assert_eq!(gate.render(None), GateView::Nothing);
    }
    assert_eq!(store.user_read_count(), 0);

    let id = user();
    gate.render(Some(&id));
    gate.render(Some(&id));

    assert_eq!(gate.settled().await, GateState::Redirecting);
    assert_eq!(store.user_read_count(), 1);
}

// =============================================================================
// Granting
// =============================================================================

#[tokio::test(start_paused = true)]
async fn active_and_trialing_are_granted_without_redirect() {
    for status in [SubscriptionStatus::Active, SubscriptionStatus::Trialing] {
        let store = store_with(status);
        let navigator = Arc::new(RecordingNavigator::default());
        let mut gate = mount(GuardOptions::default(), store.clone(), &navigator);
        let id = user();

        gate.render(Some(&id));
        assert_eq!(gate.settled().await, GateState::Granted);
        assert_eq!(gate.render(Some(&id)), GateView::Children);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(navigator.notice_count(), 0, "{}", status);
        assert!(navigator.routes().is_empty(), "{}", status);
    }
}

#[tokio::test(start_paused = true)]
async fn past_due_is_not_granted() {
    let store = store_with(SubscriptionStatus::PastDue);
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::default(), store, &navigator);

    gate.render(Some(&user()));

    assert_eq!(gate.settled().await, GateState::Redirecting);
}

#[tokio::test(start_paused = true)]
async fn view_without_requirement_never_reads_status() {
    let store = store_with(SubscriptionStatus::Canceled);
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::requiring_subscription(false), store.clone(), &navigator);

    assert_eq!(gate.render(Some(&user())), GateView::Children);
    assert_eq!(gate.state(), GateState::Granted);
    assert_eq!(store.user_read_count(), 0);
}

// =============================================================================
// Settings view exemption
// =============================================================================

#[tokio::test(start_paused = true)]
async fn settings_view_never_redirects() {
    let store = store_with(SubscriptionStatus::Canceled);
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::default().settings_view(), store, &navigator);
    let id = user();

    gate.render(Some(&id));
    assert_eq!(gate.settled().await, GateState::Exempt);
    assert_eq!(gate.render(Some(&id)), GateView::Children);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(navigator.notice_count(), 0);
    assert!(navigator.routes().is_empty());
}

// =============================================================================
// Degraded lookups
// =============================================================================

#[tokio::test(start_paused = true)]
async fn missing_row_degrades_to_redirect() {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::default(), store, &navigator);

    gate.render(Some(&user()));

    assert_eq!(gate.settled().await, GateState::Redirecting);
    assert_eq!(navigator.notice_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_lookup_degrades_to_redirect() {
    let store = store_with(SubscriptionStatus::Active);
    store.fail_user_reads(DomainError::new(ErrorCode::DatabaseError, "connection reset"));
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::default(), store, &navigator);

    gate.render(Some(&user()));

    assert_eq!(gate.settled().await, GateState::Redirecting);
}

#[tokio::test(start_paused = true)]
async fn stalled_lookup_times_out_to_redirect() {
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::default(), Arc::new(StalledUsers), &navigator);

    gate.render(Some(&user()));

    assert_eq!(gate.settled().await, GateState::Redirecting);
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(navigator.routes().len(), 1);
}

// =============================================================================
// Mount lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn unmount_before_delay_cancels_navigation() {
    let store = store_with(SubscriptionStatus::Canceled);
    let navigator = Arc::new(RecordingNavigator::default());
    let mut gate = mount(GuardOptions::default(), store, &navigator);

    gate.render(Some(&user()));
    gate.settled().await;
    gate.unmount();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(navigator.notice_count(), 1);
    assert!(navigator.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn remount_is_a_fresh_lifecycle() {
    let store = store_with(SubscriptionStatus::Canceled);
    let navigator = Arc::new(RecordingNavigator::default());
    let id = user();

    let mut first = mount(GuardOptions::default(), store.clone(), &navigator);
    first.render(Some(&id));
    first.settled().await;
    first.unmount();

    let mut second = mount(GuardOptions::default(), store.clone(), &navigator);
    for _ in 0..10 {
        second.render(Some(&id));
    }
    second.settled().await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(store.user_read_count(), 2);
    assert_eq!(navigator.notice_count(), 2);
    assert_eq!(navigator.routes().len(), 1);
}
