// Configuration and startup validation
pub mod config;

// Frigate event model and decoding
pub mod event;

// Suppression and grouping policy
pub mod policy;

// Notification composition and delivery
pub mod notify;

// Event dispatch
pub mod dispatch;

// MQTT broker integration
pub mod mqtt;
