//! Mention extraction from free-text message bodies.
//!
//! Any whitespace-delimited token containing an `@` is a candidate. A single
//! trailing comma is dropped so that "ping kate@example.com, thanks" works.
//! Candidates that do not validate as emails are discarded.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::account::AccountId;

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S*@\S*").expect("mention pattern compiles"));

/// Mentioned accounts in order of first appearance, without duplicates.
pub fn extract_mentions(text: &str) -> Vec<AccountId> {
    let mut mentioned: Vec<AccountId> = Vec::new();
    for token in MENTION_RE.find_iter(text) {
        let token = token.as_str();
        let token = token.strip_suffix(',').unwrap_or(token);
        if let Some(account) = AccountId::parse(token) {
            if !mentioned.contains(&account) {
                mentioned.push(account);
            }
        }
    }
    mentioned
}
