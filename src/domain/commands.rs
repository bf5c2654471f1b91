use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationErrors};

use super::{AuthorId, BookId, GenreId, LoanId, ValidationError};

/// コマンド：貸出を申請する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBorrow {
    pub book_id: BookId,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：貸出申請を承認する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveBorrow {
    pub loan_id: LoanId,
    pub approved_at: DateTime<Utc>,
}

/// コマンド：貸出申請を却下する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectBorrow {
    pub loan_id: LoanId,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
}

/// コマンド：貸出を延長する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendLoan {
    pub loan_id: LoanId,
}

/// コマンド：ウィッシュリストの登録をトグルする
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleWishlist {
    pub book_id: BookId,
    pub toggled_at: DateTime<Utc>,
}

fn as_is(field: &str) -> &str {
    field
}

/// 未入力の項目名を昇順で取り出す
///
/// `form_name`はRustのフィールド名をフォーム上の項目名に変換する。
fn missing_fields(errors: &ValidationErrors, form_name: fn(&str) -> &str) -> Vec<String> {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| form_name(field).to_string())
        .collect();
    fields.sort();
    fields
}

/// 書籍フォーム（作成・編集共通）
///
/// 値はフォームから文字列のまま受け取り、`parse`で型付きの入力に変換する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookForm {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub published_year: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub author_id: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub genre_id: String,
}

/// 検証済みの書籍入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInput {
    pub title: String,
    pub description: String,
    pub published_year: i32,
    pub author_id: AuthorId,
    pub genre_id: GenreId,
}

impl BookForm {
    /// `rename_all = "camelCase"`に合わせた項目名
    fn form_name(field: &str) -> &str {
        match field {
            "published_year" => "publishedYear",
            "author_id" => "authorId",
            "genre_id" => "genreId",
            other => other,
        }
    }

    pub fn parse(&self) -> Result<BookInput, ValidationError> {
        self.validate().map_err(|errors| {
            ValidationError::MissingFields(missing_fields(&errors, Self::form_name))
        })?;

        let published_year = self
            .published_year
            .trim()
            .parse::<i32>()
            .map_err(|_| ValidationError::InvalidYear)?;
        let author_id = self
            .author_id
            .parse::<AuthorId>()
            .map_err(|_| ValidationError::InvalidId("author"))?;
        let genre_id = self
            .genre_id
            .parse::<GenreId>()
            .map_err(|_| ValidationError::InvalidId("genre"))?;

        Ok(BookInput {
            title: self.title.clone(),
            description: self.description.clone(),
            published_year,
            author_id,
            genre_id,
        })
    }
}

/// 利用者登録フォーム
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

/// 検証済みの登録入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegisterForm {
    /// 必須項目とメールアドレスのドメインを検証する
    ///
    /// `allowed_domains` が空の場合、ドメイン制限は行わない。
    pub fn parse(&self, allowed_domains: &[String]) -> Result<Registration, ValidationError> {
        self.validate().map_err(|errors| {
            ValidationError::MissingFields(missing_fields(&errors, as_is))
        })?;

        let email = self.email.trim().to_lowercase();
        if !email.validate_email() {
            return Err(ValidationError::InvalidEmail);
        }

        let domain_allowed = allowed_domains.is_empty()
            || allowed_domains
                .iter()
                .any(|domain| email.ends_with(&format!("@{}", domain.to_lowercase())));
        if !domain_allowed {
            return Err(ValidationError::EmailDomainNotAllowed(
                allowed_domains.to_vec(),
            ));
        }

        Ok(Registration {
            email,
            name: self.name.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// 著者・ジャンル追加フォーム
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

impl NameForm {
    /// 前後の空白を除いた名前。空なら`NameRequired`。
    pub fn parse(&self, kind: &'static str) -> Result<String, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired(kind));
        }
        Ok(name.to_string())
    }
}
