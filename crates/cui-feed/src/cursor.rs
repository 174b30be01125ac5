//! Pagination position for the feed

use cui_api::{ConversationPage, Cursor};

/// Where the next "load more" resumes, and whether there is anything left
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    position: Option<Cursor>,
    has_more: bool,
}

impl PaginationCursor {
    /// Cursor state after receiving a page
    pub fn from_page(page: &ConversationPage) -> Self {
        let mut cursor = Self::default();
        cursor.advance(page);
        cursor
    }

    /// Move past a page. A page that claims more items but carries no
    /// resume position is treated as the end of the feed.
    pub fn advance(&mut self, page: &ConversationPage) {
        self.position = page.next_cursor.clone();
        self.has_more = page.has_more && self.position.is_some();
    }

    /// Back to "nothing loaded"
    pub fn reset(&mut self) {
        self.position = None;
        self.has_more = false;
    }

    pub fn position(&self) -> Option<&Cursor> {
        self.position.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }
}
