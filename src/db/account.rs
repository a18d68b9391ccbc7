//! Account records, including the single active refresh token per account.

use sqlx::sqlite::SqlitePool;

use crate::auth::{ADMIN_AUTHORITY, USER_AUTHORITY};

#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

/// Account role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }

    /// Authorities granted to an account with this role.
    pub fn authorities(&self) -> Vec<&'static str> {
        match self {
            UserRole::User => vec![USER_AUTHORITY],
            UserRole::Admin => vec![ADMIN_AUTHORITY, USER_AUTHORITY],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub role: UserRole,
    /// Currently valid refresh token, `None` after logout
    pub refresh_token: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    email: String,
    password_hash: String,
    name: Option<String>,
    nickname: Option<String>,
    role: String,
    refresh_token: Option<String>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            nickname: row.nickname,
            role: UserRole::from_str(&row.role),
            refresh_token: row.refresh_token,
        }
    }
}

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: Option<&'a str>,
    pub nickname: Option<&'a str>,
    pub role: UserRole,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account. Returns the account ID.
    pub async fn create(&self, account: &NewAccount<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO accounts (email, password_hash, name, nickname, role) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(account.email)
        .bind(account.password_hash)
        .bind(account.name)
        .bind(account.nickname)
        .bind(account.role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get an account by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, email, password_hash, name, nickname, role, refresh_token FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    pub async fn is_email_available(&self, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 == 0)
    }

    /// Replace the stored refresh token. `None` clears it (logout).
    /// Returns false when no account has this email.
    pub async fn save_refresh_token(
        &self,
        email: &str,
        refresh_token: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET refresh_token = ? WHERE email = ?")
            .bind(refresh_token)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the stored refresh token only if it still equals `current`.
    /// Returns false when the account has no such token, e.g. because a
    /// concurrent refresh or logout got there first.
    pub async fn rotate_refresh_token(
        &self,
        email: &str,
        current: &str,
        next: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET refresh_token = ? WHERE email = ? AND refresh_token = ?",
        )
        .bind(next)
        .bind(email)
        .bind(current)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change an account's role. Returns false when no account has this email.
    pub async fn set_role(&self, email: &str, role: UserRole) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET role = ? WHERE email = ?")
            .bind(role.as_str())
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
