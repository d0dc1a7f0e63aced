/*!
 * Authenticated principal extractor
 *
 * Responsibility:
 * - 認証ゲートが request extensions に入れた Principal を handler に渡す
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - Principal
 * - AuthPrincipal
 */

mod core;
mod types;

pub use self::core::AuthPrincipal;
pub use self::types::Principal;
