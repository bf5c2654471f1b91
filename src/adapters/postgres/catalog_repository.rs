use crate::domain::catalog::{Author, Book, BookDetail, Genre};
use crate::domain::value_objects::{AuthorId, BookId, GenreId};
use crate::ports::catalog_repository::{BookDeletion, CatalogRepository as CatalogRepositoryTrait};
use crate::ports::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use super::violated_foreign_key;

fn map_row_to_book(row: &PgRow) -> Book {
    Book {
        book_id: BookId::from_uuid(row.get("book_id")),
        title: row.get("title"),
        description: row.get("description"),
        published_year: row.get("published_year"),
        cover_image: row.get("cover_image"),
        created_at: row.get("created_at"),
    }
}

fn map_row_to_author(row: &PgRow) -> Author {
    Author {
        author_id: AuthorId::from_uuid(row.get("author_id")),
        name: row.get("name"),
    }
}

fn map_row_to_genre(row: &PgRow) -> Genre {
    Genre {
        genre_id: GenreId::from_uuid(row.get("genre_id")),
        name: row.get("name"),
    }
}

/// 書籍の著者・ジャンルの関連を置き換える
async fn link_book(
    tx: &mut Transaction<'_, Postgres>,
    book_id: BookId,
    author_id: AuthorId,
    genre_id: GenreId,
) -> Result<()> {
    sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
        .bind(book_id.value())
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
        .bind(book_id.value())
        .execute(&mut **tx)
        .await?;

    sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2)")
        .bind(book_id.value())
        .bind(author_id.value())
        .execute(&mut **tx)
        .await?;
    sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
        .bind(book_id.value())
        .bind(genre_id.value())
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// CatalogRepositoryのPostgreSQL実装
///
/// 書籍と関連テーブル（book_authors, book_genres）は同じトランザクションで書き込む。
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepositoryTrait for CatalogRepository {
    async fn insert_book(&self, book: &Book, author_id: AuthorId, genre_id: GenreId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO books (book_id, title, description, published_year, cover_image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.published_year)
        .bind(&book.cover_image)
        .bind(book.created_at)
        .execute(&mut *tx)
        .await?;

        link_book(&mut tx, book.book_id, author_id, genre_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_book(&self, book: &Book, author_id: AuthorId, genre_id: GenreId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2,
                description = $3,
                published_year = $4,
                cover_image = $5
            WHERE book_id = $1
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.published_year)
        .bind(&book.cover_image)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("book {} does not exist", book.book_id).into());
        }

        link_book(&mut tx, book.book_id, author_id, genre_id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// 関連テーブルとウィッシュリストはON DELETE CASCADEで削除される
    ///
    /// 貸出は`loans_book_id_fkey`（ON DELETE RESTRICT）で削除を止める。
    async fn delete_book(&self, book_id: BookId) -> Result<BookDeletion> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(book_id.value())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(BookDeletion::NotFound),
            Ok(_) => Ok(BookDeletion::Deleted),
            Err(e) if violated_foreign_key(&e).as_deref() == Some("loans_book_id_fkey") => {
                Ok(BookDeletion::HasLoans)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT book_id, title, description, published_year, cover_image, created_at
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_book))
    }

    async fn get_book_detail(&self, book_id: BookId) -> Result<Option<BookDetail>> {
        let Some(book) = self.get_book(book_id).await? else {
            return Ok(None);
        };

        let authors = sqlx::query(
            r#"
            SELECT a.author_id, a.name
            FROM authors a
            JOIN book_authors ba ON ba.author_id = a.author_id
            WHERE ba.book_id = $1
            ORDER BY a.name ASC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        let genres = sqlx::query(
            r#"
            SELECT g.genre_id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.genre_id
            WHERE bg.book_id = $1
            ORDER BY g.name ASC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(BookDetail {
            book,
            authors: authors.iter().map(map_row_to_author).collect(),
            genres: genres.iter().map(map_row_to_genre).collect(),
        }))
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT book_id, title, description, published_year, cover_image, created_at
            FROM books
            ORDER BY title ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_book).collect())
    }

    async fn insert_author(&self, author: &Author) -> Result<()> {
        sqlx::query("INSERT INTO authors (author_id, name) VALUES ($1, $2)")
            .bind(author.author_id.value())
            .bind(&author.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_author(&self, author_id: AuthorId) -> Result<Option<Author>> {
        let row = sqlx::query("SELECT author_id, name FROM authors WHERE author_id = $1")
            .bind(author_id.value())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(map_row_to_author))
    }

    async fn list_authors(&self) -> Result<Vec<Author>> {
        let rows = sqlx::query("SELECT author_id, name FROM authors ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(map_row_to_author).collect())
    }

    async fn insert_genre(&self, genre: &Genre) -> Result<()> {
        sqlx::query("INSERT INTO genres (genre_id, name) VALUES ($1, $2)")
            .bind(genre.genre_id.value())
            .bind(&genre.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_genre(&self, genre_id: GenreId) -> Result<Option<Genre>> {
        let row = sqlx::query("SELECT genre_id, name FROM genres WHERE genre_id = $1")
            .bind(genre_id.value())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(map_row_to_genre))
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        let rows = sqlx::query("SELECT genre_id, name FROM genres ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(map_row_to_genre).collect())
    }
}
