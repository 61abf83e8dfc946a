use std::sync::Arc;

use furnish_core::{
    fetch_analytics, AnalyticsView, ApiError, Backend, Conversation, Page, Recommendation,
    SubmitError,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub type RecommendTask = JoinHandle<Result<Vec<Recommendation>, ApiError>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub page: Page,
    pub input_mode: InputMode,

    // Recommendation chat
    pub conversation: Conversation,
    pub cursor: usize, // cursor position in the draft, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub follow_chat: bool,
    pub recommend_task: Option<RecommendTask>,

    // Analytics dashboard
    pub analytics: AnalyticsView,
    pub analytics_task: Option<JoinHandle<AnalyticsView>>,
    analytics_requested: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Data
    pub backend: Arc<dyn Backend>,
    pub api_url: String,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, api_url: String) -> Self {
        Self {
            should_quit: false,
            page: Page::Recommendation,
            input_mode: InputMode::Editing,

            conversation: Conversation::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_chat: true,
            recommend_task: None,

            analytics: AnalyticsView::Loading,
            analytics_task: None,
            analytics_requested: false,

            animation_frame: 0,

            backend,
            api_url,
        }
    }

    pub fn set_page(&mut self, page: Page) {
        self.page = page;
        // The dashboard loads once, the first time it is shown
        if page == Page::Analytics && !self.analytics_requested {
            self.load_analytics();
        }
    }

    pub fn load_analytics(&mut self) {
        if self.analytics_task.is_some() {
            return;
        }
        self.analytics_requested = true;
        self.analytics = AnalyticsView::Loading;

        let backend = Arc::clone(&self.backend);
        self.analytics_task = Some(tokio::spawn(async move {
            fetch_analytics(backend.as_ref()).await
        }));
    }

    /// Send the current draft; ignored while a request is in flight or the draft is blank
    pub fn submit_draft(&mut self) {
        let draft = self.conversation.draft().to_string();
        let prompt = match self.conversation.begin_submit(&draft) {
            Ok(prompt) => prompt,
            Err(SubmitError::EmptyPrompt) => return,
            Err(SubmitError::Pending) => {
                debug!("submit ignored while a request is pending");
                return;
            }
        };

        self.follow_chat = true;
        let backend = Arc::clone(&self.backend);
        self.recommend_task = Some(tokio::spawn(async move {
            backend.recommend(&prompt).await
        }));
    }

    /// Collect finished background requests
    pub async fn poll_tasks(&mut self) {
        if self.recommend_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.recommend_task.take() {
                let outcome = match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(ApiError::Interrupted(e.to_string())),
                };
                self.conversation.complete(outcome);
                self.cursor = 0;
                self.follow_chat = true;
            }
        }

        if self.analytics_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.analytics_task.take() {
                self.analytics = task.await.unwrap_or_else(|e| {
                    warn!(error = %e, "analytics task failed");
                    AnalyticsView::Unavailable
                });
            }
        }
    }

    // Draft editing
    pub fn input_enabled(&self) -> bool {
        !self.conversation.is_pending()
    }

    pub fn insert_char(&mut self, c: char) {
        let mut draft = self.conversation.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.insert(byte_pos, c);
        self.conversation.update_draft(draft);
        self.cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.delete_at_cursor();
    }

    pub fn delete_at_cursor(&mut self) {
        let mut draft = self.conversation.draft().to_string();
        if self.cursor < draft.chars().count() {
            let byte_pos = char_to_byte_index(&draft, self.cursor);
            draft.remove(byte_pos);
            self.conversation.update_draft(draft);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.conversation.draft().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.conversation.draft().chars().count();
    }

    // Chat scrolling
    pub fn scroll_up(&mut self) {
        self.follow_chat = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_top(&mut self) {
        self.follow_chat = false;
        self.chat_scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.follow_chat = true;
    }

    /// Clamp scroll to the rendered transcript height (called by the renderer)
    pub fn fit_chat_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_chat || self.chat_scroll >= max_scroll {
            self.chat_scroll = max_scroll;
            self.follow_chat = true;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_pending() || self.analytics.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
