use crate::domain::loan::Loan;
use crate::domain::value_objects::{BookId, LoanId, LoanStatus, UserId};
use crate::ports::loan_repository::{
    LoanConflict, LoanGuard, LoanRepository as LoanRepositoryTrait, SaveOutcome,
};
use crate::ports::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::poisoned;

/// LoanRepositoryのメモリ実装
///
/// 一意性（書籍ごとのAPPROVED、利用者・書籍ごとのPENDING）は
/// 書き込み時にロック内で確認する。
pub struct LoanRepository {
    loans: Mutex<HashMap<LoanId, Loan>>,
}

impl LoanRepository {
    pub fn new() -> Self {
        Self {
            loans: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for LoanRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// `loan`を書き込むと破られる一意性ルールを探す（自分自身は除く）
fn find_conflict(loans: &HashMap<LoanId, Loan>, loan: &Loan) -> Option<LoanConflict> {
    let others = loans.values().filter(|other| other.loan_id != loan.loan_id);

    match loan.status {
        LoanStatus::Approved => others
            .filter(|other| other.book_id == loan.book_id)
            .any(|other| other.status == LoanStatus::Approved)
            .then_some(LoanConflict::BookAlreadyBorrowed),
        LoanStatus::Pending => others
            .filter(|other| other.book_id == loan.book_id && other.user_id == loan.user_id)
            .any(|other| other.status == LoanStatus::Pending)
            .then_some(LoanConflict::AlreadyRequested),
        LoanStatus::Rejected | LoanStatus::Returned => None,
    }
}

fn newest_first(mut loans: Vec<Loan>) -> Vec<Loan> {
    loans.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    loans
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<SaveOutcome> {
        let mut loans = self.loans.lock().map_err(poisoned)?;

        if let Some(conflict) = find_conflict(&loans, loan) {
            return Ok(SaveOutcome::Conflict(conflict));
        }

        loans.insert(loan.loan_id, loan.clone());
        Ok(SaveOutcome::Saved)
    }

    async fn update(&self, loan: &Loan, guard: LoanGuard) -> Result<SaveOutcome> {
        let mut loans = self.loans.lock().map_err(poisoned)?;

        match loans.get(&loan.loan_id) {
            Some(current) if guard.matches(current) => {}
            _ => return Ok(SaveOutcome::Stale),
        }

        if let Some(conflict) = find_conflict(&loans, loan) {
            return Ok(SaveOutcome::Conflict(conflict));
        }

        loans.insert(loan.loan_id, loan.clone());
        Ok(SaveOutcome::Saved)
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let loans = self.loans.lock().map_err(poisoned)?;
        Ok(loans.get(&loan_id).cloned())
    }

    async fn find_approved_for_book(&self, book_id: BookId) -> Result<Option<Loan>> {
        let loans = self.loans.lock().map_err(poisoned)?;
        Ok(loans
            .values()
            .find(|l| l.book_id == book_id && l.status == LoanStatus::Approved)
            .cloned())
    }

    async fn find_pending(&self, user_id: UserId, book_id: BookId) -> Result<Option<Loan>> {
        let loans = self.loans.lock().map_err(poisoned)?;
        Ok(loans
            .values()
            .find(|l| {
                l.user_id == user_id && l.book_id == book_id && l.status == LoanStatus::Pending
            })
            .cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let loans = self.loans.lock().map_err(poisoned)?;
        Ok(newest_first(
            loans
                .values()
                .filter(|l| l.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Loan>> {
        let loans = self.loans.lock().map_err(poisoned)?;
        Ok(newest_first(loans.values().cloned().collect()))
    }

    async fn count_for_book(&self, book_id: BookId) -> Result<u64> {
        let loans = self.loans.lock().map_err(poisoned)?;
        Ok(loans.values().filter(|l| l.book_id == book_id).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loan::{self, LoanPolicy};
    use chrono::Utc;

    #[tokio::test]
    async fn test_second_approved_loan_for_book_conflicts() {
        let repo = LoanRepository::new();
        let book_id = BookId::new();
        let now = Utc::now();
        let policy = LoanPolicy::default();

        let first = loan::request_borrow(book_id, UserId::new(), now);
        let second = loan::request_borrow(book_id, UserId::new(), now);
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        let approved = loan::approve_borrow(&first, now, &policy).unwrap();
        let outcome = repo.update(&approved, LoanGuard::of(&first)).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);

        let approved = loan::approve_borrow(&second, now, &policy).unwrap();
        let outcome = repo.update(&approved, LoanGuard::of(&second)).await.unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Conflict(LoanConflict::BookAlreadyBorrowed)
        );
    }

    #[tokio::test]
    async fn test_update_with_outdated_guard_is_stale() {
        let repo = LoanRepository::new();
        let now = Utc::now();
        let pending = loan::request_borrow(BookId::new(), UserId::new(), now);
        repo.insert(&pending).await.unwrap();

        let rejected = loan::reject_borrow(&pending).unwrap();
        repo.update(&rejected, LoanGuard::of(&pending)).await.unwrap();

        // 同じ前提で承認しようとしても、既に却下済み
        let approved = loan::approve_borrow(&pending, now, &LoanPolicy::default()).unwrap();
        let outcome = repo.update(&approved, LoanGuard::of(&pending)).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Stale);
        let stored = repo.get_by_id(pending.loan_id).await.unwrap().unwrap();
        assert_eq!(stored.status, LoanStatus::Rejected);
    }

    #[tokio::test]
    async fn test_duplicate_pending_insert_conflicts() {
        let repo = LoanRepository::new();
        let (book_id, user_id) = (BookId::new(), UserId::new());

        repo.insert(&loan::request_borrow(book_id, user_id, Utc::now()))
            .await
            .unwrap();
        let outcome = repo
            .insert(&loan::request_borrow(book_id, user_id, Utc::now()))
            .await
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Conflict(LoanConflict::AlreadyRequested));
    }
}
