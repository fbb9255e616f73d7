use crate::articles::dto::{ArticleSummary, Tier};
use crate::auth::repo_types::SessionUser;
use crate::config::AccessPolicy;

/// Whether `user` may see an article of `tier` in full.
pub fn can_read_full(policy: AccessPolicy, user: Option<&SessionUser>, tier: Tier) -> bool {
    match policy {
        AccessPolicy::Open => true,
        AccessPolicy::Gated => tier == Tier::Basic || user.is_some_and(|u| u.tier == Tier::Pro),
    }
}

/// Reduces pro items the caller cannot read to their preview.
pub fn gate_summaries(
    policy: AccessPolicy,
    user: Option<&SessionUser>,
    items: Vec<ArticleSummary>,
) -> Vec<ArticleSummary> {
    items
        .into_iter()
        .map(|item| {
            if can_read_full(policy, user, item.tier) {
                item
            } else {
                item.preview()
            }
        })
        .collect()
}
