use crate::domain::catalog::{Author, Book, BookDetail, Genre};
use crate::domain::value_objects::{AuthorId, BookId, GenreId};
use async_trait::async_trait;

use super::Result;

/// 書籍削除の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookDeletion {
    Deleted,
    NotFound,
    /// 貸出から参照されているため削除できなかった
    HasLoans,
}

/// カタログリポジトリポート
///
/// 書籍・著者・ジャンルと、書籍⇔著者・書籍⇔ジャンルの関連を扱う。
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 書籍を保存し、著者・ジャンルと関連付ける
    async fn insert_book(&self, book: &Book, author_id: AuthorId, genre_id: GenreId)
    -> Result<()>;

    /// 書籍を更新し、著者・ジャンルの関連を置き換える
    async fn update_book(&self, book: &Book, author_id: AuthorId, genre_id: GenreId)
    -> Result<()>;

    /// 書籍を削除する
    ///
    /// 事前チェックの後に貸出が作られた場合も、ストア側で`HasLoans`を返すこと。
    async fn delete_book(&self, book_id: BookId) -> Result<BookDeletion>;

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 著者・ジャンルを含む書籍詳細
    async fn get_book_detail(&self, book_id: BookId) -> Result<Option<BookDetail>>;

    /// 全書籍（タイトル順）
    async fn list_books(&self) -> Result<Vec<Book>>;

    async fn insert_author(&self, author: &Author) -> Result<()>;

    async fn get_author(&self, author_id: AuthorId) -> Result<Option<Author>>;

    /// 全著者（名前の昇順）
    async fn list_authors(&self) -> Result<Vec<Author>>;

    async fn insert_genre(&self, genre: &Genre) -> Result<()>;

    async fn get_genre(&self, genre_id: GenreId) -> Result<Option<Genre>>;

    /// 全ジャンル（名前の昇順）
    async fn list_genres(&self) -> Result<Vec<Genre>>;
}
