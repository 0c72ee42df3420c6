//! Observable spider setup events
//!
//! Events are explicit and typed. Each one maps to a stable string that is
//! written as the `event` key of a log line.

use std::fmt;

/// Events emitted while compiling entities and wiring pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded and validated
    ConfigLoaded,

    // Entity registration
    /// Entity compiled and added to the spider
    EntityRegistered,
    /// Entity declaration failed validation
    EntityRejected,

    // Pipelines
    /// Default pipeline chosen from the configured provider
    PipelineSelected,
    /// Unknown provider, no-op pipeline used instead
    PipelineFallback,
    /// Entity registered with a pipeline
    PipelineEntityAdded,
    /// Records handed to a pipeline
    RecordsPersisted,

    // Lifecycle
    /// Spider setup begins
    SpiderStarting,
    /// Spider setup complete, crawl may begin
    SpiderStarted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::EntityRegistered => "ENTITY_REGISTERED",
            Event::EntityRejected => "ENTITY_REJECTED",

            Event::PipelineSelected => "PIPELINE_SELECTED",
            Event::PipelineFallback => "PIPELINE_FALLBACK",
            Event::PipelineEntityAdded => "PIPELINE_ENTITY_ADDED",
            Event::RecordsPersisted => "RECORDS_PERSISTED",

            Event::SpiderStarting => "SPIDER_STARTING",
            Event::SpiderStarted => "SPIDER_STARTED",
        }
    }

    /// Returns true if this event reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Event::EntityRejected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
