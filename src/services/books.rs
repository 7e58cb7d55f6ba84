//! Book catalog service

use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create(&self, data: CreateBook) -> AppResult<Book> {
        data.validate()?;
        let book = self.repository.books.create(&data).await?;
        tracing::info!(book_id = book.id, "Book created");
        Ok(book)
    }

    pub async fn update(&self, id: i32, data: UpdateBook) -> AppResult<Book> {
        data.validate()?;
        self.repository.books.update(id, &data).await
    }

    /// Delete a book; books with borrowings are kept
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
