/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth (認証ゲート), cors, http (request id / trace / limit / timeout)
 */
pub mod auth;
pub mod cors;
pub mod http;
