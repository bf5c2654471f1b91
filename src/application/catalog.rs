use chrono::{DateTime, Utc};

use crate::domain::catalog::{self, Author, Book, BookDetail, Genre};
use crate::domain::commands::{BookForm, BookInput, NameForm};
use crate::domain::user::Principal;
use crate::domain::value_objects::*;
use crate::ports::{BookDeletion, View};

use super::{ApplicationError, Result, ServiceDependencies, require_admin};

/// アップロードされた表紙画像
#[derive(Debug, Clone)]
pub struct CoverUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CoverUpload {
    /// ファイルが選択されなかったフォームは空のパートを送ってくる
    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 著者・ジャンルが存在することを確認する
async fn ensure_references(deps: &ServiceDependencies, input: &BookInput) -> Result<()> {
    let author = deps
        .catalog
        .get_author(input.author_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;
    if author.is_none() {
        return Err(ApplicationError::NotFound("Author"));
    }

    let genre = deps
        .catalog
        .get_genre(input.genre_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;
    if genre.is_none() {
        return Err(ApplicationError::NotFound("Genre"));
    }

    Ok(())
}

/// 表紙画像を保存し、公開パスを返す
async fn store_cover(
    deps: &ServiceDependencies,
    cover: Option<&CoverUpload>,
) -> Result<Option<String>> {
    match cover.filter(|c| !c.is_empty()) {
        Some(cover) => {
            let path = deps
                .covers
                .store(&cover.file_name, &cover.bytes)
                .await
                .map_err(ApplicationError::CoverStorageError)?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}

/// 表紙画像を削除する（失敗しても処理は続行する）
async fn discard_cover(deps: &ServiceDependencies, path: &str) {
    if let Err(e) = deps.covers.remove(path).await {
        tracing::warn!(path, error = %e, "Failed to remove cover image");
    }
}

/// 全書籍（タイトル順）
pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    deps.catalog
        .list_books()
        .await
        .map_err(ApplicationError::RepositoryError)
}

/// 書籍詳細（著者・ジャンルを含む）
pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<BookDetail> {
    deps.catalog
        .get_book_detail(book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?
        .ok_or(ApplicationError::NotFound("Book"))
}

/// 書籍を登録する（管理者のみ）
///
/// ビジネスルール：
/// - すべての項目が必須、出版年は整数
/// - 著者・ジャンルが存在すること
/// - 表紙画像は入力の検証が通った後に保存する
pub async fn create_book(
    deps: &ServiceDependencies,
    principal: &Principal,
    form: &BookForm,
    cover: Option<&CoverUpload>,
    now: DateTime<Utc>,
) -> Result<Book> {
    require_admin(principal)?;

    let input = form.parse()?;
    ensure_references(deps, &input).await?;

    let cover_image = store_cover(deps, cover).await?;
    let book = catalog::new_book(&input, cover_image, now);

    if let Err(e) = deps
        .catalog
        .insert_book(&book, input.author_id, input.genre_id)
        .await
    {
        if let Some(path) = &book.cover_image {
            discard_cover(deps, path).await;
        }
        return Err(ApplicationError::RepositoryError(e));
    }

    tracing::info!(book_id = %book.book_id, title = %book.title, "Book created");

    deps.views.invalidate(View::Books).await;

    Ok(book)
}

/// 書籍を更新する（管理者のみ）
///
/// 新しい表紙画像がアップロードされた場合は差し替え、古いファイルを削除する。
/// 古いファイルの削除に失敗しても更新は成功とする。
pub async fn update_book(
    deps: &ServiceDependencies,
    principal: &Principal,
    book_id: BookId,
    form: &BookForm,
    cover: Option<&CoverUpload>,
) -> Result<Book> {
    require_admin(principal)?;

    let current = deps
        .catalog
        .get_book(book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?
        .ok_or(ApplicationError::NotFound("Book"))?;

    let input = form.parse()?;
    ensure_references(deps, &input).await?;

    let new_cover = store_cover(deps, cover).await?;
    let revised = catalog::revise_book(&current, &input, new_cover.clone());

    if let Err(e) = deps
        .catalog
        .update_book(&revised, input.author_id, input.genre_id)
        .await
    {
        if let Some(path) = &new_cover {
            discard_cover(deps, path).await;
        }
        return Err(ApplicationError::RepositoryError(e));
    }

    if let (Some(_), Some(old)) = (&new_cover, &current.cover_image) {
        discard_cover(deps, old).await;
    }

    tracing::info!(book_id = %revised.book_id, title = %revised.title, "Book updated");

    deps.views.invalidate(View::Books).await;
    deps.views.invalidate(View::BookDetail(book_id)).await;

    Ok(revised)
}

/// 書籍を削除する（管理者のみ）
///
/// 貸出履歴のある書籍は削除できない。
pub async fn delete_book(
    deps: &ServiceDependencies,
    principal: &Principal,
    book_id: BookId,
) -> Result<()> {
    require_admin(principal)?;

    let book = deps
        .catalog
        .get_book(book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?
        .ok_or(ApplicationError::NotFound("Book"))?;

    let loan_count = deps
        .loans
        .count_for_book(book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;
    if loan_count > 0 {
        return Err(ApplicationError::BookHasLoans);
    }

    // 事前チェックの後に作られた貸出はストア側で検出される
    let deletion = deps
        .catalog
        .delete_book(book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;
    match deletion {
        BookDeletion::Deleted => {}
        BookDeletion::NotFound => return Err(ApplicationError::NotFound("Book")),
        BookDeletion::HasLoans => return Err(ApplicationError::BookHasLoans),
    }

    if let Some(path) = &book.cover_image {
        discard_cover(deps, path).await;
    }

    tracing::info!(book_id = %book_id, "Book deleted");

    deps.views.invalidate(View::Books).await;

    Ok(())
}

/// 著者を追加する（管理者のみ）
pub async fn add_author(
    deps: &ServiceDependencies,
    principal: &Principal,
    form: &NameForm,
) -> Result<Author> {
    require_admin(principal)?;

    let author = Author {
        author_id: AuthorId::new(),
        name: form.parse("author")?,
    };

    deps.catalog
        .insert_author(&author)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    tracing::info!(author_id = %author.author_id, name = %author.name, "Author added");

    Ok(author)
}

/// ジャンルを追加する（管理者のみ）
pub async fn add_genre(
    deps: &ServiceDependencies,
    principal: &Principal,
    form: &NameForm,
) -> Result<Genre> {
    require_admin(principal)?;

    let genre = Genre {
        genre_id: GenreId::new(),
        name: form.parse("genre")?,
    };

    deps.catalog
        .insert_genre(&genre)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    tracing::info!(genre_id = %genre.genre_id, name = %genre.name, "Genre added");

    Ok(genre)
}

pub async fn list_authors(deps: &ServiceDependencies) -> Result<Vec<Author>> {
    deps.catalog
        .list_authors()
        .await
        .map_err(ApplicationError::RepositoryError)
}

pub async fn list_genres(deps: &ServiceDependencies) -> Result<Vec<Genre>> {
    deps.catalog
        .list_genres()
        .await
        .map_err(ApplicationError::RepositoryError)
}
