use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::assistant::script::{self, AssistantMessage, ChatNode};
use crate::features::auth::model::SessionContext;
use crate::modules::backend::{BackendClient, BackendSession, BookingBackend, Center, Service};

/// Choices made so far in one conversation
#[derive(Debug, Clone, Default)]
struct Choices {
    service: Option<Service>,
    center: Option<Center>,
    date: Option<NaiveDate>,
}

struct Conversation {
    choices: Choices,
    /// Bumped on every change, so a reply can tell it worked from stale choices
    revision: u64,
    last_touched: Instant,
}

/// A reply that keeps losing the race to concurrent replies gives up after this
const REPLY_ATTEMPTS: usize = 3;

/// Scripted booking helper, one conversation per portal session
pub struct AssistantService {
    client: BackendClient,
    conversations: RwLock<HashMap<Uuid, Conversation>>,
    idle_ttl: Duration,
}

/// Catalog lookups fail soft: the visitor gets an apology, not an error page
fn unavailable(what: &str, error: AppError) -> AssistantMessage {
    tracing::warn!("Assistant could not load {}: {}", what, error);
    script::unavailable()
}

impl AssistantService {
    pub fn new(client: BackendClient, idle_ttl: Duration) -> Self {
        Self {
            client,
            conversations: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    pub fn backend_for(&self, session: &SessionContext) -> BackendSession {
        self.client.session(session.credentials.clone())
    }

    /// Begin (or restart) the conversation
    pub async fn start(&self, session_id: Uuid) -> AssistantMessage {
        let mut conversations = self.conversations.write().await;
        match conversations.get_mut(&session_id) {
            Some(conversation) => {
                conversation.choices = Choices::default();
                conversation.revision += 1;
                conversation.last_touched = Instant::now();
            }
            None => {
                conversations.insert(
                    session_id,
                    Conversation {
                        choices: Choices::default(),
                        revision: 1,
                        last_touched: Instant::now(),
                    },
                );
            }
        }
        script::greeting()
    }

    /// Answer the option the visitor picked
    pub async fn reply(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
        option: &str,
    ) -> Result<AssistantMessage> {
        let node: ChatNode = option.parse().map_err(AppError::BadRequest)?;
        tracing::debug!("Assistant reply '{}' for session {}", node, session_id);

        if matches!(node, ChatNode::Start | ChatNode::Restart) {
            return Ok(self.start(session_id).await);
        }

        // Backend lookups run without the lock; the answer only counts if no
        // other reply changed the conversation in the meantime
        for attempt in 1..=REPLY_ATTEMPTS {
            let (choices, revision) = self.choices(session_id).await;
            let (message, choices) = answer(backend, node, choices).await;
            if self.save(session_id, revision, choices).await {
                return Ok(message);
            }
            tracing::debug!(
                "Conversation {} changed during reply '{}' (attempt {}/{})",
                session_id,
                node,
                attempt,
                REPLY_ATTEMPTS
            );
        }

        Err(AppError::Conflict(
            "The conversation changed while answering, please try again".to_string(),
        ))
    }

    /// Forget conversations idle for longer than the TTL
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.idle_ttl;
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|_, c| c.last_touched.elapsed() <= ttl);
        before - conversations.len()
    }

    async fn choices(&self, session_id: Uuid) -> (Choices, u64) {
        self.conversations
            .read()
            .await
            .get(&session_id)
            .map(|c| (c.choices.clone(), c.revision))
            .unwrap_or_default()
    }

    /// Store the new choices unless the conversation moved past `revision`
    async fn save(&self, session_id: Uuid, revision: u64, choices: Choices) -> bool {
        let mut conversations = self.conversations.write().await;
        match conversations.get_mut(&session_id) {
            Some(conversation) if conversation.revision != revision => false,
            Some(conversation) => {
                conversation.choices = choices;
                conversation.revision += 1;
                conversation.last_touched = Instant::now();
                true
            }
            // Purged mid-reply counts as a change too
            None if revision != 0 => false,
            None => {
                conversations.insert(
                    session_id,
                    Conversation {
                        choices,
                        revision: 1,
                        last_touched: Instant::now(),
                    },
                );
                true
            }
        }
    }
}

/// Next message for `node`, and the choices it leaves behind
async fn answer(
    backend: &dyn BookingBackend,
    node: ChatNode,
    mut choices: Choices,
) -> (AssistantMessage, Choices) {
    let message = match node {
        ChatNode::Start | ChatNode::Restart => script::greeting(),
        ChatNode::CheckAvailability => {
            choices = Choices::default();
            match backend.list_services().await {
                Ok(services) => script::choose_service(&active(services)),
                Err(e) => unavailable("services", e),
            }
        }
        ChatNode::ServiceInfo => match backend.list_services().await {
            Ok(services) => script::service_list(&active(services)),
            Err(e) => unavailable("services", e),
        },
        ChatNode::Info(id) => match find_service(backend, id).await {
            Ok(Some(service)) => script::service_details(&service),
            Ok(None) => script::lost_context(),
            Err(e) => unavailable("service", e),
        },
        ChatNode::Service(id) => match find_service(backend, id).await {
            Ok(Some(service)) => {
                let message = match backend.list_centers(service.id).await {
                    Ok(centers) => {
                        let centers: Vec<Center> =
                            centers.into_iter().filter(|c| c.is_active).collect();
                        script::choose_center(&service, &centers)
                    }
                    Err(e) => unavailable("centers", e),
                };
                choices = Choices {
                    service: Some(service),
                    ..Choices::default()
                };
                message
            }
            Ok(None) => script::lost_context(),
            Err(e) => unavailable("service", e),
        },
        ChatNode::Center(id) => match choices.service.clone() {
            None => script::lost_context(),
            Some(service) => match find_center(backend, service.id, id).await {
                Ok(Some(center)) => {
                    let message = match backend.available_dates(center.id, service.id).await {
                        Ok(dates) => script::choose_date(&service, &center, &dates),
                        Err(e) => unavailable("available dates", e),
                    };
                    choices.center = Some(center);
                    choices.date = None;
                    message
                }
                Ok(None) => script::lost_context(),
                Err(e) => unavailable("centers", e),
            },
        },
        ChatNode::Date(date) => match (choices.service.clone(), choices.center.clone()) {
            (Some(service), Some(center)) => {
                match backend.available_slots(center.id, service.id, date).await {
                    Ok(slots) => {
                        choices.date = Some(date);
                        script::show_slots(&service, &center, date, &slots)
                    }
                    Err(e) => unavailable("available times", e),
                }
            }
            _ => script::lost_context(),
        },
        ChatNode::Book => match (&choices.service, &choices.center, choices.date) {
            (Some(service), Some(center), Some(date)) => {
                script::open_booking(service.id, center.id, date)
            }
            _ => script::lost_context(),
        },
    };

    (message, choices)
}

fn active(services: Vec<Service>) -> Vec<Service> {
    services.into_iter().filter(|s| s.is_active).collect()
}

async fn find_service(backend: &dyn BookingBackend, id: i64) -> Result<Option<Service>> {
    Ok(backend
        .list_services()
        .await?
        .into_iter()
        .find(|s| s.id == id && s.is_active))
}

async fn find_center(
    backend: &dyn BookingBackend,
    service_id: i64,
    center_id: i64,
) -> Result<Option<Center>> {
    Ok(backend
        .list_centers(service_id)
        .await?
        .into_iter()
        .find(|c| c.id == center_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::backend::{
        AvailableDate, AvailableSlot, BookingConfirmation, BookingRequest, UserProfile,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Holds the first `available_dates` call until released
    #[derive(Default)]
    struct DatesGate {
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    struct FakeBackend {
        services: Vec<Service>,
        gate: Option<DatesGate>,
    }

    impl FakeBackend {
        fn with_passport_renewal() -> Self {
            Self {
                services: serde_json::from_value(json!([
                    {"id": 1, "title": "Passport Renewal"}
                ]))
                .unwrap(),
                gate: None,
            }
        }

        fn gated() -> Self {
            let gate = DatesGate::default();
            gate.armed.store(true, Ordering::SeqCst);
            Self {
                services: serde_json::from_value(json!([
                    {"id": 1, "title": "Passport Renewal"},
                    {"id": 2, "title": "Visa Application"}
                ]))
                .unwrap(),
                gate: Some(gate),
            }
        }
    }

    #[async_trait]
    impl BookingBackend for FakeBackend {
        async fn list_services(&self) -> Result<Vec<Service>> {
            Ok(self.services.clone())
        }

        async fn list_centers(&self, _service_id: i64) -> Result<Vec<Center>> {
            Ok(serde_json::from_value(json!([
                {"id": 5, "name": "Central Verification Center", "city": "Nairobi"}
            ]))
            .unwrap())
        }

        async fn available_dates(
            &self,
            _center_id: i64,
            _service_id: i64,
        ) -> Result<Vec<AvailableDate>> {
            if let Some(gate) = &self.gate {
                if gate.armed.swap(false, Ordering::SeqCst) {
                    gate.entered.notify_one();
                    gate.release.notified().await;
                }
            }
            Ok(vec![AvailableDate {
                date: NaiveDate::from_ymd_opt(2025, 12, 30).unwrap(),
                available_slots: Some(4),
            }])
        }

        async fn available_slots(
            &self,
            _center_id: i64,
            _service_id: i64,
            _date: NaiveDate,
        ) -> Result<Vec<AvailableSlot>> {
            Err(AppError::ExternalServiceError("timeout".to_string()))
        }

        async fn current_user(&self) -> Result<Option<UserProfile>> {
            Ok(None)
        }

        async fn create_booking(&self, _request: &BookingRequest) -> Result<BookingConfirmation> {
            unreachable!("the assistant never books")
        }
    }

    fn service() -> AssistantService {
        AssistantService::new(
            crate::shared::test_helpers::backend_client("http://127.0.0.1:9".to_string()),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_no_services_available() {
        let assistant = service();
        let backend = FakeBackend {
            services: Vec::new(),
            gate: None,
        };
        let sid = Uuid::new_v4();

        assistant.start(sid).await;
        let message = assistant
            .reply(&backend, sid, "check_availability")
            .await
            .unwrap();

        assert!(message.text.contains("no services available"));
        assert_eq!(message.options.len(), 1);
        assert_eq!(message.options[0].id, "restart");
    }

    #[tokio::test]
    async fn test_walk_to_dates() {
        let assistant = service();
        let backend = FakeBackend::with_passport_renewal();
        let sid = Uuid::new_v4();

        assistant.start(sid).await;
        let services = assistant
            .reply(&backend, sid, "check_availability")
            .await
            .unwrap();
        assert_eq!(services.options[0].id, "service:1");

        let centers = assistant.reply(&backend, sid, "service:1").await.unwrap();
        assert_eq!(centers.options[0].label, "Central Verification Center (Nairobi)");

        let dates = assistant.reply(&backend, sid, "center:5").await.unwrap();
        assert_eq!(dates.options[0].id, "date:2025-12-30");
    }

    #[tokio::test]
    async fn test_slot_failure_is_an_apology() {
        let assistant = service();
        let backend = FakeBackend::with_passport_renewal();
        let sid = Uuid::new_v4();

        assistant.reply(&backend, sid, "service:1").await.unwrap();
        assistant.reply(&backend, sid, "center:5").await.unwrap();
        let message = assistant
            .reply(&backend, sid, "date:2025-12-30")
            .await
            .unwrap();

        assert!(message.text.starts_with("Sorry"));
        let book = assistant.reply(&backend, sid, "book").await.unwrap();
        assert!(book.action.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_replies_do_not_overwrite_each_other() {
        let assistant = Arc::new(service());
        let backend = Arc::new(FakeBackend::gated());
        let sid = Uuid::new_v4();

        assistant.reply(backend.as_ref(), sid, "service:1").await.unwrap();

        // Picking a center stalls on the dates lookup...
        let pending = tokio::spawn({
            let assistant = Arc::clone(&assistant);
            let backend = Arc::clone(&backend);
            async move { assistant.reply(backend.as_ref(), sid, "center:5").await }
        });
        let gate = backend.gate.as_ref().unwrap();
        gate.entered.notified().await;

        // ...while the visitor switches service in another tab
        assistant.reply(backend.as_ref(), sid, "service:2").await.unwrap();
        gate.release.notify_one();
        pending.await.unwrap().unwrap();

        let (choices, _) = assistant.choices(sid).await;
        assert_eq!(choices.service.map(|s| s.id), Some(2));
        assert_eq!(choices.center.map(|c| c.id), Some(5));
    }

    #[tokio::test]
    async fn test_center_without_service_starts_over() {
        let assistant = service();
        let backend = FakeBackend::with_passport_renewal();

        let message = assistant
            .reply(&backend, Uuid::new_v4(), "center:5")
            .await
            .unwrap();
        assert_eq!(message.options[0].id, "check_availability");
    }

    #[tokio::test]
    async fn test_unknown_option_is_bad_request() {
        let assistant = service();
        let backend = FakeBackend::with_passport_renewal();

        let err = assistant
            .reply(&backend, Uuid::new_v4(), "launch")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_purge_drops_idle_conversations() {
        let assistant = AssistantService::new(
            crate::shared::test_helpers::backend_client("http://127.0.0.1:9".to_string()),
            Duration::ZERO,
        );
        assistant.start(Uuid::new_v4()).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(assistant.purge_expired().await, 1);
    }
}
