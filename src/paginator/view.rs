use super::Navigation;
use crate::chat::Controls;
use crate::chunker::chunk;
use crate::results::{format_breaches_within, BreachRecord};
use crate::search::SearchType;
use std::sync::Arc;

/// Highest page index for `total` records shown `page_size` at a time
pub fn max_page(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size).saturating_sub(1)
}

/// Navigation state over a shared, read-only result set
#[derive(Debug, Clone)]
pub struct PageView {
    records: Arc<Vec<BreachRecord>>,
    term: String,
    search_type: SearchType,
    page_size: usize,
    message_limit: usize,
    current_page: usize,
    max_page: usize,
    expired: bool,
}

impl PageView {
    pub fn new(
        records: Arc<Vec<BreachRecord>>,
        term: impl Into<String>,
        search_type: SearchType,
        page_size: usize,
        message_limit: usize,
    ) -> Self {
        let page_size = page_size.max(1);
        let max_page = max_page(records.len(), page_size);
        Self {
            records,
            term: term.into(),
            search_type,
            page_size,
            message_limit,
            current_page: 0,
            max_page,
            expired: false,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn max_page(&self) -> usize {
        self.max_page
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Apply a navigation event. Returns whether the page changed.
    pub fn apply(&mut self, nav: Navigation) -> bool {
        if self.expired {
            return false;
        }
        match nav {
            Navigation::Back if self.current_page > 0 => {
                self.current_page -= 1;
                true
            }
            Navigation::Next if self.current_page < self.max_page => {
                self.current_page += 1;
                true
            }
            _ => false,
        }
    }

    /// Freeze the view; no further transitions are accepted
    pub fn expire(&mut self) {
        self.expired = true;
    }

    pub fn controls(&self) -> Controls {
        if self.expired {
            return Controls::disabled();
        }
        Controls::new(self.current_page > 0, self.current_page < self.max_page)
    }

    /// Records on the current page
    pub fn page(&self) -> &[BreachRecord] {
        let start = (self.current_page * self.page_size).min(self.records.len());
        let end = (start + self.page_size).min(self.records.len());
        &self.records[start..end]
    }

    /// Text for the current page within the message limit. Long records are
    /// truncated; only an oversized term can still push text past the limit,
    /// and then the first chunk is shown.
    pub fn render(&self) -> String {
        let text =
            format_breaches_within(&self.term, self.search_type, self.page(), self.message_limit);
        if text.chars().count() <= self.message_limit {
            return text;
        }
        match chunk(&text, self.message_limit, None) {
            Ok(mut chunks) if chunks.len() > 1 => chunks.swap_remove(0),
            _ => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(n: usize) -> Arc<Vec<BreachRecord>> {
        Arc::new(
            (0..n)
                .map(|i| {
                    BreachRecord::from_value(json!({"username": format!("u{}", i)})).unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn test_max_page() {
        assert_eq!(max_page(0, 4), 0);
        assert_eq!(max_page(1, 4), 0);
        assert_eq!(max_page(4, 4), 0);
        assert_eq!(max_page(5, 4), 1);
        assert_eq!(max_page(10, 4), 2);
    }

    #[test]
    fn test_ten_records_three_pages() {
        let mut view = PageView::new(records(10), "u", SearchType::Username, 4, 2000);
        assert_eq!(view.max_page(), 2);
        assert_eq!(view.controls(), Controls::new(false, true));
        assert_eq!(view.page().len(), 4);

        assert!(!view.apply(Navigation::Back));
        assert!(view.apply(Navigation::Next));
        assert_eq!(view.controls(), Controls::new(true, true));
        assert!(view.apply(Navigation::Next));
        assert_eq!(view.controls(), Controls::new(true, false));
        assert_eq!(view.page().len(), 2);
        assert!(!view.apply(Navigation::Next));
        assert_eq!(view.current_page(), 2);
    }

    #[test]
    fn test_expired_view_is_frozen() {
        let mut view = PageView::new(records(10), "u", SearchType::Username, 4, 2000);
        view.expire();
        assert!(!view.apply(Navigation::Next));
        assert_eq!(view.controls(), Controls::disabled());
        assert_eq!(view.current_page(), 0);
    }

    #[test]
    fn test_empty_set_renders_no_results() {
        let view = PageView::new(records(0), "ghost", SearchType::Username, 4, 2000);
        assert_eq!(view.controls(), Controls::new(false, false));
        assert_eq!(view.render(), "No breaches found for username 'ghost'.");
    }

    #[test]
    fn test_render_fits_message_limit() {
        let long: Vec<BreachRecord> = (0..4)
            .map(|_| BreachRecord::from_value(json!({"hash": "f".repeat(300)})).unwrap())
            .collect();
        let view = PageView::new(Arc::new(long), "f", SearchType::Hash, 4, 500);
        assert!(view.render().chars().count() <= 500);
        assert!(view.render().starts_with("f:\n\n"));
    }

    #[test]
    fn test_render_shows_every_record_on_page() {
        let long: Vec<BreachRecord> = (0..4)
            .map(|i| {
                BreachRecord::from_value(json!({
                    "username": format!("user{}", i),
                    "hash": "f".repeat(600)
                }))
                .unwrap()
            })
            .collect();
        let view = PageView::new(Arc::new(long), "user", SearchType::Username, 4, 2000);

        let text = view.render();
        assert!(text.chars().count() <= 2000);
        for record in view.page() {
            let name = record.field("username").unwrap();
            assert!(text.contains(&format!("Username: {}", name)), "missing {}", name);
        }
        assert!(text.contains("(truncated)"));
    }
}
