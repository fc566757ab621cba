//! Replaces raw `<@U123>` user references with `@Display Name`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::slack::service::{UserLookup, user_name_or_id};

static USER_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@([A-Z0-9]+)>").expect("valid user reference pattern"));

/// Resolve every distinct user reference once and substitute all of its
/// occurrences. Failed lookups substitute the raw id.
pub async fn decorate_mentions<L: UserLookup + ?Sized>(lookup: &L, text: &str) -> String {
    let mut seen = HashSet::new();
    let ids: Vec<&str> = USER_REFERENCE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|id| seen.insert(*id))
        .collect();

    let mut result = text.to_string();
    for id in ids {
        let name = user_name_or_id(lookup, id).await;
        result = result.replace(&format!("<@{id}>"), &format!("@{name}"));
    }
    result
}
