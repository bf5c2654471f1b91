use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthorId, BookId, GenreId, commands::BookInput};

/// 書籍
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub description: String,
    pub published_year: i32,
    /// 表紙画像のパス（例: `/uploads/1700000000000-k3j2h1.png`）
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub author_id: AuthorId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub genre_id: GenreId,
    pub name: String,
}

/// 著者・ジャンルを含む書籍詳細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetail {
    pub book: Book,
    pub authors: Vec<Author>,
    pub genres: Vec<Genre>,
}

/// 純粋関数：フォーム入力から新しい書籍を作る
pub fn new_book(input: &BookInput, cover_image: Option<String>, created_at: DateTime<Utc>) -> Book {
    Book {
        book_id: BookId::new(),
        title: input.title.clone(),
        description: input.description.clone(),
        published_year: input.published_year,
        cover_image,
        created_at,
    }
}

/// 純粋関数：フォーム入力で書籍を更新する
///
/// 新しい表紙がない場合は既存の表紙を維持する。
pub fn revise_book(book: &Book, input: &BookInput, new_cover: Option<String>) -> Book {
    Book {
        title: input.title.clone(),
        description: input.description.clone(),
        published_year: input.published_year,
        cover_image: new_cover.or_else(|| book.cover_image.clone()),
        ..book.clone()
    }
}
