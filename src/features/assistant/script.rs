//! The assistant's decision tree.
//!
//! Every reply the visitor can pick is a [`ChatNode`], serialized as a short
//! option id (`service:3`, `date:2025-12-30`). Building the next message from
//! a node and the fetched catalog data is pure; the service layer does the
//! fetching and keeps the per-session choices.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::modules::backend::{AvailableDate, AvailableSlot, Center, Service};
use crate::shared::constants::ASSISTANT_MAX_DATES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatNode {
    Start,
    CheckAvailability,
    ServiceInfo,
    Service(i64),
    Center(i64),
    Date(NaiveDate),
    Info(i64),
    Book,
    Restart,
}

impl fmt::Display for ChatNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatNode::Start => write!(f, "start"),
            ChatNode::CheckAvailability => write!(f, "check_availability"),
            ChatNode::ServiceInfo => write!(f, "service_info"),
            ChatNode::Service(id) => write!(f, "service:{}", id),
            ChatNode::Center(id) => write!(f, "center:{}", id),
            ChatNode::Date(date) => write!(f, "date:{}", date.format("%Y-%m-%d")),
            ChatNode::Info(id) => write!(f, "info:{}", id),
            ChatNode::Book => write!(f, "book"),
            ChatNode::Restart => write!(f, "restart"),
        }
    }
}

impl FromStr for ChatNode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || format!("Unknown option '{}'", s);
        let id = |raw: &str| raw.parse::<i64>().map_err(|_| unknown());

        match s.trim().split_once(':') {
            None => match s.trim() {
                "start" => Ok(ChatNode::Start),
                "check_availability" => Ok(ChatNode::CheckAvailability),
                "service_info" => Ok(ChatNode::ServiceInfo),
                "book" => Ok(ChatNode::Book),
                "restart" => Ok(ChatNode::Restart),
                _ => Err(unknown()),
            },
            Some(("service", raw)) => id(raw).map(ChatNode::Service),
            Some(("center", raw)) => id(raw).map(ChatNode::Center),
            Some(("info", raw)) => id(raw).map(ChatNode::Info),
            Some(("date", raw)) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(ChatNode::Date)
                .map_err(|_| unknown()),
            Some(_) => Err(unknown()),
        }
    }
}

/// One button under an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatOption {
    /// Send this back as `option` to pick it
    pub id: String,
    pub label: String,
}

impl ChatOption {
    fn new(node: ChatNode, label: impl Into<String>) -> Self {
        Self {
            id: node.to_string(),
            label: label.into(),
        }
    }

    fn restart() -> Self {
        Self::new(ChatNode::Restart, "Start over")
    }
}

/// What the front end should do besides showing the message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatAction {
    OpenBookingWizard {
        service_id: i64,
        center_id: i64,
        date: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssistantMessage {
    pub text: String,
    pub options: Vec<ChatOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ChatAction>,
}

impl AssistantMessage {
    fn new(text: impl Into<String>, options: Vec<ChatOption>) -> Self {
        Self {
            text: text.into(),
            options,
            action: None,
        }
    }
}

pub fn greeting() -> AssistantMessage {
    AssistantMessage::new(
        "Hello! I can check appointment availability or tell you about our consular services. What would you like to do?",
        vec![
            ChatOption::new(ChatNode::CheckAvailability, "Check Appointment Availability"),
            ChatOption::new(ChatNode::ServiceInfo, "Service Information"),
        ],
    )
}

pub fn no_services() -> AssistantMessage {
    AssistantMessage::new(
        "Sorry, there are no services available at the moment. Please check back later.",
        vec![ChatOption::restart()],
    )
}

pub fn unavailable() -> AssistantMessage {
    AssistantMessage::new(
        "Sorry, I couldn't reach the booking system just now. Please try again in a moment.",
        vec![ChatOption::restart()],
    )
}

/// The conversation lost track of an earlier choice (expired or skipped ahead)
pub fn lost_context() -> AssistantMessage {
    AssistantMessage::new(
        "Let's start again from the service you need.",
        vec![
            ChatOption::new(ChatNode::CheckAvailability, "Check Appointment Availability"),
            ChatOption::restart(),
        ],
    )
}

pub fn choose_service(services: &[Service]) -> AssistantMessage {
    if services.is_empty() {
        return no_services();
    }

    let mut options: Vec<ChatOption> = services
        .iter()
        .map(|s| ChatOption::new(ChatNode::Service(s.id), &s.title))
        .collect();
    options.push(ChatOption::restart());
    AssistantMessage::new("Which service do you need an appointment for?", options)
}

pub fn service_list(services: &[Service]) -> AssistantMessage {
    if services.is_empty() {
        return no_services();
    }

    let mut options: Vec<ChatOption> = services
        .iter()
        .map(|s| ChatOption::new(ChatNode::Info(s.id), &s.title))
        .collect();
    options.push(ChatOption::restart());
    AssistantMessage::new("Which service would you like to know more about?", options)
}

pub fn service_details(service: &Service) -> AssistantMessage {
    let mut lines = vec![service.title.clone()];
    if let Some(description) = service.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
    }
    if let Some(time) = &service.processing_time {
        lines.push(format!("Processing time: {}", time));
    }
    if !service.fees.is_empty() {
        let fees: Vec<String> = service
            .fees
            .iter()
            .map(|f| format!("{} {:.2}", f.fee_type, f.amount))
            .collect();
        lines.push(format!("Fees: {}", fees.join(", ")));
    }
    if !service.required_documents.is_empty() {
        let documents: Vec<&str> = service
            .required_documents
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        lines.push(format!("Required documents: {}", documents.join(", ")));
    }

    AssistantMessage::new(
        lines.join("\n"),
        vec![
            ChatOption::new(ChatNode::Service(service.id), "Check availability for this service"),
            ChatOption::new(ChatNode::ServiceInfo, "Other services"),
            ChatOption::restart(),
        ],
    )
}

pub fn choose_center(service: &Service, centers: &[Center]) -> AssistantMessage {
    if centers.is_empty() {
        return AssistantMessage::new(
            format!("No centers currently offer {}.", service.title),
            vec![
                ChatOption::new(ChatNode::CheckAvailability, "Choose another service"),
                ChatOption::restart(),
            ],
        );
    }

    let mut options: Vec<ChatOption> = centers
        .iter()
        .map(|c| {
            let label = match &c.city {
                Some(city) => format!("{} ({})", c.name, city),
                None => c.name.clone(),
            };
            ChatOption::new(ChatNode::Center(c.id), label)
        })
        .collect();
    options.push(ChatOption::restart());
    AssistantMessage::new(
        format!("Where would you like to apply for {}?", service.title),
        options,
    )
}

/// Dates with capacity left, soonest first
pub fn choose_date(service: &Service, center: &Center, dates: &[AvailableDate]) -> AssistantMessage {
    let mut open: Vec<&AvailableDate> = dates
        .iter()
        .filter(|d| d.available_slots.is_none_or(|n| n > 0))
        .collect();
    open.sort_by_key(|d| d.date);

    if open.is_empty() {
        return AssistantMessage::new(
            format!(
                "There are no available dates for {} at {} right now.",
                service.title, center.name
            ),
            vec![
                ChatOption::new(ChatNode::Service(service.id), "Choose another center"),
                ChatOption::restart(),
            ],
        );
    }

    let mut options: Vec<ChatOption> = open
        .iter()
        .take(ASSISTANT_MAX_DATES)
        .map(|d| {
            let label = match d.available_slots {
                Some(n) => format!("{} ({} left)", d.date.format("%a %d %b %Y"), n),
                None => d.date.format("%a %d %b %Y").to_string(),
            };
            ChatOption::new(ChatNode::Date(d.date), label)
        })
        .collect();
    options.push(ChatOption::restart());
    AssistantMessage::new(
        format!("These are the next available dates at {}:", center.name),
        options,
    )
}

pub fn show_slots(
    service: &Service,
    center: &Center,
    date: NaiveDate,
    slots: &[AvailableSlot],
) -> AssistantMessage {
    let bookable: Vec<String> = slots
        .iter()
        .filter(|s| s.is_bookable())
        .map(AvailableSlot::label)
        .collect();

    if bookable.is_empty() {
        return AssistantMessage::new(
            format!(
                "All times on {} are taken. Please pick another date.",
                date.format("%A %d %B %Y")
            ),
            vec![
                ChatOption::new(ChatNode::Center(center.id), "Choose another date"),
                ChatOption::restart(),
            ],
        );
    }

    AssistantMessage::new(
        format!(
            "On {} these times are open for {} at {}: {}.",
            date.format("%A %d %B %Y"),
            service.title,
            center.name,
            bookable.join(", ")
        ),
        vec![
            ChatOption::new(ChatNode::Book, "Book one of these times"),
            ChatOption::new(ChatNode::Center(center.id), "Choose another date"),
            ChatOption::restart(),
        ],
    )
}

pub fn open_booking(service_id: i64, center_id: i64, date: NaiveDate) -> AssistantMessage {
    AssistantMessage {
        text: "I'll open the booking form so you can reserve your time.".to_string(),
        options: vec![ChatOption::restart()],
        action: Some(ChatAction::OpenBookingWizard {
            service_id,
            center_id,
            date,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> Service {
        serde_json::from_value(json!({
            "id": 1, "title": "Passport Renewal", "processing_time": "10 working days",
            "fees": [{"type": "Standard", "amount": 75.0}]
        }))
        .unwrap()
    }

    fn center() -> Center {
        serde_json::from_value(json!({"id": 5, "name": "Central Verification Center"})).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    #[test]
    fn test_node_ids_parse_back() {
        for node in [
            ChatNode::CheckAvailability,
            ChatNode::Service(3),
            ChatNode::Date(day(30)),
            ChatNode::Info(9),
            ChatNode::Restart,
        ] {
            assert_eq!(node.to_string().parse::<ChatNode>(), Ok(node));
        }
        assert!("service:abc".parse::<ChatNode>().is_err());
        assert!("date:30/12/2025".parse::<ChatNode>().is_err());
        assert!("teleport".parse::<ChatNode>().is_err());
    }

    #[test]
    fn test_no_services_offers_only_restart() {
        let message = choose_service(&[]);
        assert!(message.text.contains("no services available"));
        assert_eq!(message.options, vec![ChatOption::restart()]);
    }

    #[test]
    fn test_dates_skip_full_days_and_sort() {
        let dates = vec![
            AvailableDate { date: day(31), available_slots: Some(2) },
            AvailableDate { date: day(29), available_slots: Some(0) },
            AvailableDate { date: day(30), available_slots: None },
        ];
        let message = choose_date(&service(), &center(), &dates);
        let ids: Vec<&str> = message.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["date:2025-12-30", "date:2025-12-31", "restart"]);
    }

    #[test]
    fn test_slots_list_only_bookable_times() {
        let slots: Vec<AvailableSlot> = serde_json::from_value(json!([
            {"id": 1, "start_time": "09:00", "end_time": "09:30", "available": 0},
            {"id": 2, "start_time": "10:00", "end_time": "10:30", "available": 2}
        ]))
        .unwrap();
        let message = show_slots(&service(), &center(), day(30), &slots);
        assert!(message.text.contains("10:00 - 10:30"));
        assert!(!message.text.contains("09:00"));
        assert_eq!(message.options[0].id, "book");
    }

    #[test]
    fn test_service_details_lists_fees() {
        let message = service_details(&service());
        assert!(message.text.contains("Processing time: 10 working days"));
        assert!(message.text.contains("Fees: Standard 75.00"));
        assert_eq!(message.options[0].id, "service:1");
    }
}
