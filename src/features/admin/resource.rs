//! One back-office table per [`AdminResource`].
//!
//! A resource names its portal path, the backend collection behind it, its
//! record and payload types, and which operations it offers. The generic
//! handlers and [`resource_routes`](crate::features::admin::routes::resource_routes)
//! do the rest.

use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

use crate::features::admin::dtos::{
    ApplicationStatusUpdate, AppointmentStatusUpdate, CenterInput, CounterInput,
    NotificationTemplateInput, ServiceDetailInput, ServiceInput, TimeSlotInput, Unsupported,
};
use crate::modules::backend::{
    Application, Appointment, Center, Counter, NotificationTemplate, Service, ServiceDetail,
    TimeSlot,
};

pub trait AdminResource: Send + Sync + 'static {
    type Record: Serialize + DeserializeOwned + Send + 'static;
    type Create: Serialize + DeserializeOwned + Validate + Send + Sync + 'static;
    type Update: Serialize + DeserializeOwned + Validate + Send + Sync + 'static;

    /// Path under `/api/admin`
    const NAME: &'static str;
    /// Collection path on the backend
    const BACKEND_PATH: &'static str;
    /// Envelope key of a single record
    const RECORD_KEY: &'static str;
    /// Envelope key of a listing
    const LIST_KEY: &'static str;
    /// Human name used in messages ("Time slot 4 not found")
    const LABEL: &'static str;

    const SUPPORTS_CREATE: bool = true;
    const SUPPORTS_DELETE: bool = true;
    const SUPPORTS_TOGGLE: bool = true;
}

pub struct Services;

impl AdminResource for Services {
    type Record = Service;
    type Create = ServiceInput;
    type Update = ServiceInput;

    const NAME: &'static str = "services";
    const BACKEND_PATH: &'static str = "/admin/services";
    const RECORD_KEY: &'static str = "service";
    const LIST_KEY: &'static str = "services";
    const LABEL: &'static str = "Service";
}

pub struct ServiceDetails;

impl AdminResource for ServiceDetails {
    type Record = ServiceDetail;
    type Create = ServiceDetailInput;
    type Update = ServiceDetailInput;

    const NAME: &'static str = "service-details";
    const BACKEND_PATH: &'static str = "/admin/service-details";
    const RECORD_KEY: &'static str = "detail";
    const LIST_KEY: &'static str = "details";
    const LABEL: &'static str = "Service detail";
}

pub struct Centers;

impl AdminResource for Centers {
    type Record = Center;
    type Create = CenterInput;
    type Update = CenterInput;

    const NAME: &'static str = "centers";
    const BACKEND_PATH: &'static str = "/admin/centers";
    const RECORD_KEY: &'static str = "center";
    const LIST_KEY: &'static str = "centers";
    const LABEL: &'static str = "Center";
}

pub struct Counters;

impl AdminResource for Counters {
    type Record = Counter;
    type Create = CounterInput;
    type Update = CounterInput;

    const NAME: &'static str = "counters";
    const BACKEND_PATH: &'static str = "/admin/counters";
    const RECORD_KEY: &'static str = "counter";
    const LIST_KEY: &'static str = "counters";
    const LABEL: &'static str = "Counter";
}

pub struct TimeSlots;

impl AdminResource for TimeSlots {
    type Record = TimeSlot;
    type Create = TimeSlotInput;
    type Update = TimeSlotInput;

    const NAME: &'static str = "time-slots";
    const BACKEND_PATH: &'static str = "/admin/time-slots";
    const RECORD_KEY: &'static str = "slot";
    const LIST_KEY: &'static str = "slots";
    const LABEL: &'static str = "Time slot";
}

/// Applications are submitted by citizens; staff only move their status
pub struct Applications;

impl AdminResource for Applications {
    type Record = Application;
    type Create = Unsupported;
    type Update = ApplicationStatusUpdate;

    const NAME: &'static str = "applications";
    const BACKEND_PATH: &'static str = "/admin/applications";
    const RECORD_KEY: &'static str = "application";
    const LIST_KEY: &'static str = "applications";
    const LABEL: &'static str = "Application";

    const SUPPORTS_CREATE: bool = false;
    const SUPPORTS_DELETE: bool = false;
    const SUPPORTS_TOGGLE: bool = false;
}

pub struct MiscellaneousApplications;

impl AdminResource for MiscellaneousApplications {
    type Record = Application;
    type Create = Unsupported;
    type Update = ApplicationStatusUpdate;

    const NAME: &'static str = "applications/miscellaneous";
    const BACKEND_PATH: &'static str = "/admin/applications/miscellaneous";
    const RECORD_KEY: &'static str = "application";
    const LIST_KEY: &'static str = "applications";
    const LABEL: &'static str = "Miscellaneous application";

    const SUPPORTS_CREATE: bool = false;
    const SUPPORTS_DELETE: bool = false;
    const SUPPORTS_TOGGLE: bool = false;
}

pub struct Appointments;

impl AdminResource for Appointments {
    type Record = Appointment;
    type Create = Unsupported;
    type Update = AppointmentStatusUpdate;

    const NAME: &'static str = "appointments";
    const BACKEND_PATH: &'static str = "/admin/appointments";
    const RECORD_KEY: &'static str = "appointment";
    const LIST_KEY: &'static str = "appointments";
    const LABEL: &'static str = "Appointment";

    const SUPPORTS_CREATE: bool = false;
    const SUPPORTS_DELETE: bool = false;
    const SUPPORTS_TOGGLE: bool = false;
}

pub struct NotificationTemplates;

impl AdminResource for NotificationTemplates {
    type Record = NotificationTemplate;
    type Create = NotificationTemplateInput;
    type Update = NotificationTemplateInput;

    const NAME: &'static str = "notification-templates";
    const BACKEND_PATH: &'static str = "/admin/notification-templates";
    const RECORD_KEY: &'static str = "template";
    const LIST_KEY: &'static str = "templates";
    const LABEL: &'static str = "Notification template";
}
