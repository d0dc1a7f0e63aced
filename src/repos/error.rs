/*
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoError {
    #[error("conflict")]
    Conflict,
    #[error("not found")]
    NotFound,
    /// A precondition checked inside `UserStore::modify` did not hold.
    #[error("{code}: {message}")]
    Rejected {
        code: &'static str,
        message: &'static str,
    },
}

pub type RepoResult<T> = Result<T, RepoError>;
