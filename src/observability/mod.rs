//! Observability for spider setup
//!
//! Structured logging of lifecycle events. Observability is read-only and
//! never changes the outcome of the operation it reports on.
//!
//! ```ignore
//! use entityspider::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::EntityRegistered, &[("entity", "shop::Product")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_error() {
        Severity::Error
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
