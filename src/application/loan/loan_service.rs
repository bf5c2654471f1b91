use crate::domain::{self, commands::*, loan::Loan, user::Principal, value_objects::*};
use crate::ports::*;
use std::sync::Arc;

use crate::application::{ApplicationError, Result, ServiceDependencies, require_admin};

/// リポジトリから貸出を取得するヘルパー関数
///
/// # エラー
/// - RepositoryError: 読み込み失敗
/// - NotFound: 貸出が存在しない
async fn load_loan(loans: &Arc<dyn LoanRepository>, loan_id: LoanId) -> Result<Loan> {
    loans
        .get_by_id(loan_id)
        .await
        .map_err(ApplicationError::RepositoryError)?
        .ok_or(ApplicationError::NotFound("Loan"))
}

/// 書き込み結果をResultに変換するヘルパー関数
///
/// `Stale`（前提条件を満たす行がなかった）は`on_stale`のエラーになる。
fn ensure_saved(outcome: SaveOutcome, on_stale: ApplicationError) -> Result<()> {
    match outcome {
        SaveOutcome::Saved => Ok(()),
        SaveOutcome::Conflict(conflict) => Err(conflict.into()),
        SaveOutcome::Stale => Err(on_stale),
    }
}

/// 貸出を申請する
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 書籍が貸出中（APPROVED）でないこと
/// - 同じ書籍を申請中（PENDING）でないこと
///
/// 事前チェックは利用者に分かりやすいエラーを返すためのもの。
/// 同時実行時の不変条件はリポジトリ側（一意性制約）で保証され、
/// 競合した場合も同じエラーが返る。
///
/// # 戻り値
/// 作成された貸出
pub async fn request_borrow(
    deps: &ServiceDependencies,
    principal: &Principal,
    cmd: RequestBorrow,
) -> Result<Loan> {
    // 1. 書籍の存在確認
    let book = deps
        .catalog
        .get_book(cmd.book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    if book.is_none() {
        return Err(ApplicationError::NotFound("Book"));
    }

    // 2. 貸出中確認
    let borrowed = deps
        .loans
        .find_approved_for_book(cmd.book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    if borrowed.is_some() {
        return Err(ApplicationError::AlreadyBorrowed);
    }

    // 3. 重複申請確認
    let requested = deps
        .loans
        .find_pending(principal.user_id, cmd.book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    if requested.is_some() {
        return Err(ApplicationError::AlreadyRequested);
    }

    // 4. ドメイン層の純粋関数を呼び出し
    let loan = domain::loan::request_borrow(cmd.book_id, principal.user_id, cmd.requested_at);

    // 5. 保存
    let outcome = deps
        .loans
        .insert(&loan)
        .await
        .map_err(ApplicationError::RepositoryError)?;
    ensure_saved(outcome, ApplicationError::AlreadyRequested)?;

    tracing::info!(
        loan_id = %loan.loan_id,
        book_id = %loan.book_id,
        user_id = %loan.user_id,
        "Borrow requested"
    );

    deps.views.invalidate(View::BookDetail(cmd.book_id)).await;

    Ok(loan)
}

/// 貸出申請を承認する（管理者のみ）
///
/// ビジネスルール：
/// - 管理者であること（貸出の存在確認より先にチェック）
/// - 貸出が存在し、PENDINGであること
/// - 同じ書籍の他の貸出がAPPROVEDでないこと
/// - 返却期限 = 承認日時 + 設定された貸出期間
pub async fn approve_borrow(
    deps: &ServiceDependencies,
    principal: &Principal,
    cmd: ApproveBorrow,
) -> Result<Loan> {
    require_admin(principal)?;

    // 1. 貸出を取得
    let loan = load_loan(&deps.loans, cmd.loan_id).await?;

    // 2. ドメイン層の純粋関数を呼び出し
    let approved =
        domain::loan::approve_borrow(&loan, cmd.approved_at, &deps.settings.loan_policy)?;

    // 3. 同じ書籍が他の貸出で貸出中でないか確認
    let borrowed = deps
        .loans
        .find_approved_for_book(loan.book_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    if borrowed.is_some_and(|other| other.loan_id != loan.loan_id) {
        return Err(ApplicationError::AlreadyBorrowed);
    }

    // 4. 保存（読み取り時の状態のままであることが条件）
    let outcome = deps
        .loans
        .update(&approved, LoanGuard::of(&loan))
        .await
        .map_err(ApplicationError::RepositoryError)?;
    ensure_saved(outcome, ApplicationError::NotPending)?;

    tracing::info!(
        loan_id = %approved.loan_id,
        book_id = %approved.book_id,
        due_date = ?approved.due_date,
        "Borrow approved"
    );

    deps.views.invalidate(View::AdminDashboard).await;

    Ok(approved)
}

/// 貸出申請を却下する（管理者のみ）
///
/// 承認日時・返却期限は設定しない。
pub async fn reject_borrow(
    deps: &ServiceDependencies,
    principal: &Principal,
    cmd: RejectBorrow,
) -> Result<Loan> {
    require_admin(principal)?;

    let loan = load_loan(&deps.loans, cmd.loan_id).await?;
    let rejected = domain::loan::reject_borrow(&loan)?;

    let outcome = deps
        .loans
        .update(&rejected, LoanGuard::of(&loan))
        .await
        .map_err(ApplicationError::RepositoryError)?;
    ensure_saved(outcome, ApplicationError::NotPending)?;

    tracing::info!(loan_id = %rejected.loan_id, "Borrow rejected");

    deps.views.invalidate(View::AdminDashboard).await;

    Ok(rejected)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 借りた本人であること
/// - 貸出中（APPROVED）であること
///
/// 貸出が存在しない場合と他人の貸出の場合は、同じ`Unauthorized`を返す。
pub async fn return_book(
    deps: &ServiceDependencies,
    principal: &Principal,
    cmd: ReturnBook,
) -> Result<Loan> {
    let loan = deps
        .loans
        .get_by_id(cmd.loan_id)
        .await
        .map_err(ApplicationError::RepositoryError)?
        .ok_or(ApplicationError::Unauthorized)?;

    let returned = domain::loan::return_book(&loan, principal.user_id, cmd.returned_at)?;

    let outcome = deps
        .loans
        .update(&returned, LoanGuard::of(&loan))
        .await
        .map_err(ApplicationError::RepositoryError)?;
    ensure_saved(outcome, ApplicationError::NotActive)?;

    tracing::info!(
        loan_id = %returned.loan_id,
        book_id = %returned.book_id,
        overdue = domain::loan::is_overdue(&loan, cmd.returned_at),
        "Book returned"
    );

    deps.views
        .invalidate(View::UserProfile(principal.user_id))
        .await;

    Ok(returned)
}

/// 貸出を延長する
///
/// チェック順序：NotFound → NotOwner → AlreadyExtended → NotActive → MissingDueDate。
/// 返却期限は現在の期限から7日延びる。
///
/// 保存時に状態が変わっていた場合（同時に延長・返却された場合）は、
/// 最新の状態で再判定したエラーを返す。
pub async fn extend_loan(
    deps: &ServiceDependencies,
    principal: &Principal,
    cmd: ExtendLoan,
) -> Result<Loan> {
    let loan = load_loan(&deps.loans, cmd.loan_id).await?;
    let extended = domain::loan::extend_loan(&loan, principal.user_id)?;

    let outcome = deps
        .loans
        .update(&extended, LoanGuard::of(&loan))
        .await
        .map_err(ApplicationError::RepositoryError)?;

    if outcome == SaveOutcome::Stale {
        let current = load_loan(&deps.loans, cmd.loan_id).await?;
        return Err(domain::loan::extend_loan(&current, principal.user_id)
            .err()
            .map(ApplicationError::from)
            .unwrap_or(ApplicationError::AlreadyExtended));
    }
    ensure_saved(outcome, ApplicationError::AlreadyExtended)?;

    tracing::info!(
        loan_id = %extended.loan_id,
        due_date = ?extended.due_date,
        "Loan extended"
    );

    deps.views.invalidate(View::UserProfile(loan.user_id)).await;

    Ok(extended)
}
