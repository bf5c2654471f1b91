use crate::domain::catalog::{Author, Book, BookDetail, Genre};
use crate::domain::value_objects::{AuthorId, BookId, GenreId};
use crate::ports::catalog_repository::{BookDeletion, CatalogRepository as CatalogRepositoryTrait};
use crate::ports::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::poisoned;

/// 書籍と、その著者・ジャンルへの関連
#[derive(Clone)]
struct StoredBook {
    book: Book,
    author_id: AuthorId,
    genre_id: GenreId,
}

#[derive(Default)]
struct Catalog {
    books: HashMap<BookId, StoredBook>,
    authors: HashMap<AuthorId, Author>,
    genres: HashMap<GenreId, Genre>,
    /// 削除を拒否する書籍（貸出からの参照）
    referenced: HashSet<BookId>,
}

/// CatalogRepositoryのメモリ実装
///
/// 書籍1冊につき著者・ジャンルを1件ずつ関連付ける。
pub struct CatalogRepository {
    catalog: Mutex<Catalog>,
}

impl CatalogRepository {
    pub fn new() -> Self {
        Self {
            catalog: Mutex::new(Catalog::default()),
        }
    }

    /// 書籍が貸出から参照されている状態にする
    ///
    /// PostgreSQLの`ON DELETE RESTRICT`と同じく、以降の`delete_book`は`HasLoans`になる。
    pub fn reference_from_loan(&self, book_id: BookId) {
        if let Ok(mut catalog) = self.catalog.lock() {
            catalog.referenced.insert(book_id);
        }
    }
}

impl Default for CatalogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepositoryTrait for CatalogRepository {
    async fn insert_book(&self, book: &Book, author_id: AuthorId, genre_id: GenreId) -> Result<()> {
        let mut catalog = self.catalog.lock().map_err(poisoned)?;
        catalog.books.insert(
            book.book_id,
            StoredBook {
                book: book.clone(),
                author_id,
                genre_id,
            },
        );
        Ok(())
    }

    async fn update_book(&self, book: &Book, author_id: AuthorId, genre_id: GenreId) -> Result<()> {
        let mut catalog = self.catalog.lock().map_err(poisoned)?;
        match catalog.books.get_mut(&book.book_id) {
            Some(stored) => {
                *stored = StoredBook {
                    book: book.clone(),
                    author_id,
                    genre_id,
                };
                Ok(())
            }
            None => Err(format!("book {} does not exist", book.book_id).into()),
        }
    }

    async fn delete_book(&self, book_id: BookId) -> Result<BookDeletion> {
        let mut catalog = self.catalog.lock().map_err(poisoned)?;
        if catalog.referenced.contains(&book_id) {
            return Ok(BookDeletion::HasLoans);
        }
        match catalog.books.remove(&book_id) {
            Some(_) => Ok(BookDeletion::Deleted),
            None => Ok(BookDeletion::NotFound),
        }
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let catalog = self.catalog.lock().map_err(poisoned)?;
        Ok(catalog.books.get(&book_id).map(|s| s.book.clone()))
    }

    async fn get_book_detail(&self, book_id: BookId) -> Result<Option<BookDetail>> {
        let catalog = self.catalog.lock().map_err(poisoned)?;
        Ok(catalog.books.get(&book_id).map(|stored| BookDetail {
            book: stored.book.clone(),
            authors: catalog.authors.get(&stored.author_id).cloned().into_iter().collect(),
            genres: catalog.genres.get(&stored.genre_id).cloned().into_iter().collect(),
        }))
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let catalog = self.catalog.lock().map_err(poisoned)?;
        let mut books: Vec<Book> = catalog.books.values().map(|s| s.book.clone()).collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn insert_author(&self, author: &Author) -> Result<()> {
        let mut catalog = self.catalog.lock().map_err(poisoned)?;
        catalog.authors.insert(author.author_id, author.clone());
        Ok(())
    }

    async fn get_author(&self, author_id: AuthorId) -> Result<Option<Author>> {
        let catalog = self.catalog.lock().map_err(poisoned)?;
        Ok(catalog.authors.get(&author_id).cloned())
    }

    async fn list_authors(&self) -> Result<Vec<Author>> {
        let catalog = self.catalog.lock().map_err(poisoned)?;
        let mut authors: Vec<Author> = catalog.authors.values().cloned().collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(authors)
    }

    async fn insert_genre(&self, genre: &Genre) -> Result<()> {
        let mut catalog = self.catalog.lock().map_err(poisoned)?;
        catalog.genres.insert(genre.genre_id, genre.clone());
        Ok(())
    }

    async fn get_genre(&self, genre_id: GenreId) -> Result<Option<Genre>> {
        let catalog = self.catalog.lock().map_err(poisoned)?;
        Ok(catalog.genres.get(&genre_id).cloned())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        let catalog = self.catalog.lock().map_err(poisoned)?;
        let mut genres: Vec<Genre> = catalog.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }
}
