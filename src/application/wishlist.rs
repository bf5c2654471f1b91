use crate::domain::catalog::Book;
use crate::domain::commands::ToggleWishlist;
use crate::domain::user::Principal;
use crate::domain::value_objects::{BookId, UserId};
use crate::domain::wishlist::{WishlistChange, WishlistEntry};
use crate::ports::View;

use super::{ApplicationError, Result, ServiceDependencies};

/// ウィッシュリストの追加・削除を切り替える
///
/// ビジネスルール：
/// - 未ログインの場合は何もせず`None`を返す（エラーにしない）
/// - 書籍が存在すること
/// - 登録済みなら削除、未登録なら追加
///
/// 追加が同時に行われて重複した場合は、既に登録されているものとして`Added`を返す。
pub async fn toggle_wishlist(
    deps: &ServiceDependencies,
    principal: Option<&Principal>,
    cmd: ToggleWishlist,
) -> Result<Option<WishlistChange>> {
    let Some(principal) = principal else {
        return Ok(None);
    };

    let book = deps
        .catalog
        .get_book(cmd.book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    if book.is_none() {
        return Err(ApplicationError::NotFound("Book"));
    }

    let existing = deps
        .wishlists
        .find(principal.user_id, cmd.book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    let change = match existing {
        Some(entry) => {
            deps.wishlists
                .delete(entry.entry_id)
                .await
                .map_err(ApplicationError::RepositoryError)?;
            WishlistChange::Removed
        }
        None => {
            let entry = WishlistEntry::new(principal.user_id, cmd.book_id, cmd.toggled_at);
            let inserted = deps
                .wishlists
                .insert(&entry)
                .await
                .map_err(ApplicationError::RepositoryError)?;
            if !inserted {
                tracing::debug!(book_id = %cmd.book_id, "Wishlist entry already present");
            }
            WishlistChange::Added
        }
    };

    tracing::info!(
        user_id = %principal.user_id,
        book_id = %cmd.book_id,
        change = ?change,
        "Wishlist toggled"
    );

    deps.views.invalidate(View::BookDetail(cmd.book_id)).await;

    Ok(Some(change))
}

/// ウィッシュリストから書籍を外す
///
/// 未ログインの場合、または登録されていない場合も何もせず成功する。
pub async fn remove_from_wishlist(
    deps: &ServiceDependencies,
    principal: Option<&Principal>,
    book_id: BookId,
) -> Result<()> {
    let Some(principal) = principal else {
        return Ok(());
    };

    let removed = deps
        .wishlists
        .delete_for(principal.user_id, book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    tracing::info!(user_id = %principal.user_id, book_id = %book_id, removed, "Wishlist entry removed");

    deps.views.invalidate(View::Wishlist).await;

    Ok(())
}

/// 利用者のウィッシュリストの書籍（登録の新しい順）
///
/// 削除済みの書籍は含めない。
pub(crate) async fn wishlist_books(deps: &ServiceDependencies, user_id: UserId) -> Result<Vec<Book>> {
    let entries = deps
        .wishlists
        .find_by_user(user_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    let mut books = Vec::with_capacity(entries.len());
    for entry in entries {
        let book = deps
            .catalog
            .get_book(entry.book_id)
            .await
            .map_err(ApplicationError::RepositoryError)?;
        books.extend(book);
    }

    Ok(books)
}

/// 自分のウィッシュリスト
pub async fn my_wishlist(deps: &ServiceDependencies, principal: &Principal) -> Result<Vec<Book>> {
    wishlist_books(deps, principal.user_id).await
}
