//! The `employees` table contract.
//!
//! Column names are fixed; they are shared with whatever else reads the
//! table and are not configurable at runtime.

pub const TABLE: &str = "employees";
pub const EMAIL_COLUMN: &str = "email";
pub const MESSAGING_COLUMN: &str = "telegramID";

pub const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS employees (
    email TEXT PRIMARY KEY NOT NULL,
    telegramID INTEGER DEFAULT 0
)";

pub const SELECT_ALL: &str = "SELECT email, telegramID FROM employees";
pub const SELECT_BY_EMAIL: &str = "SELECT email, telegramID FROM employees WHERE email = ?1";
pub const INSERT: &str = "INSERT INTO employees (email, telegramID) VALUES (?1, ?2)";
pub const UPDATE_MESSAGING_ID: &str = "UPDATE employees SET telegramID = ?1 WHERE email = ?2";
