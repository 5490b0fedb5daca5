//! Written books.

use super::component::Component;

/// A written book opened on the client.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Book {
    pub title: Component,
    pub author: Component,
    pub pages: Vec<Component>,
}

impl Book {
    /// Creates a book.
    pub fn new(
        title: impl Into<Component>,
        author: impl Into<Component>,
        pages: Vec<Component>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            pages,
        }
    }

    /// Appends a page.
    pub fn page(mut self, page: impl Into<Component>) -> Self {
        self.pages.push(page.into());
        self
    }
}

crate::canonical_object!(Book, "mimic.Book");
crate::from_object_value!(Book, "book");
