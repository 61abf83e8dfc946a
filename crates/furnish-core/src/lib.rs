pub mod analytics;
pub mod api;
pub mod config;
pub mod conversation;
pub mod recommendation;
pub mod state;

// Re-export main types for convenience
pub use analytics::{derive_chart_data, fetch_analytics, AnalyticsSnapshot, AnalyticsView, DerivedChartData};
pub use api::{ApiError, Backend, HttpBackend};
pub use config::Config;
pub use conversation::{Conversation, ConversationState, SubmitError};
pub use recommendation::Recommendation;
pub use state::{Message, MessageContent, Page, Sender};
