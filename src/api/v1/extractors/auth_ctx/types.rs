/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - Ticket validation and session lookup are middleware/services concerns;
 *   this type is the fixed contract handlers rely on.
 */

use std::collections::HashMap;

use crate::services::sso::validator::Principal;

/// Context attached to an authenticated request.
///
/// - `principal` is the identity the SSO server verified for this session
/// - `attributes` are whatever the SSO server asserted at validation time
///   (display name, mail, group hints); treat as advisory, not authorization
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub principal: Principal,
    pub attributes: HashMap<String, serde_json::Value>,
}

impl AuthCtx {
    pub fn new(principal: Principal, attributes: HashMap<String, serde_json::Value>) -> Self {
        Self {
            principal,
            attributes,
        }
    }
}
