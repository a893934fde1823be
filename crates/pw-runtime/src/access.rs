use std::sync::OnceLock;

use pw_core::{fields, PwValue, Template, UserContext};
use regex::Regex;

use crate::services::AccessPolicy;

const SUPERUSER_PERMISSION: &str = "Developer";

fn lock_term_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)^\s*(perm|id|all|false)\(\s*([^()]*?)\s*\)\s*$")
            .expect("lock term regex must compile")
    })
}

/// Reads the `edit:` clause of a template's `template_locks`, e.g.
/// `edit:perm(Builder) or id(alice);spawn:all()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LockAccessPolicy;

impl LockAccessPolicy {
    fn edit_clause(template: &Template) -> Option<String> {
        let locks = match template.get(fields::TEMPLATE_LOCKS)? {
            PwValue::String(text) => text.clone(),
            other => other.to_text(),
        };
        locks.split(';').find_map(|segment| {
            let (access_type, clause) = segment.split_once(':')?;
            access_type
                .trim()
                .eq_ignore_ascii_case("edit")
                .then(|| clause.trim().to_string())
        })
    }

    fn term_allows(term: &str, user: &UserContext) -> bool {
        let Some(captures) = lock_term_regex().captures(term) else {
            return false;
        };
        let arg = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        match captures[1].to_ascii_lowercase().as_str() {
            "perm" => user.has_permission(arg),
            "id" => user.name.eq_ignore_ascii_case(arg),
            "all" => true,
            _ => false,
        }
    }
}

impl AccessPolicy for LockAccessPolicy {
    fn can_edit(&self, user: &UserContext, template: &Template) -> bool {
        if user.has_permission(SUPERUSER_PERMISSION) {
            return true;
        }
        let Some(clause) = Self::edit_clause(template) else {
            return true;
        };
        if clause.is_empty() {
            return true;
        }
        split_or(&clause)
            .iter()
            .any(|term| Self::term_allows(term, user))
    }
}

fn split_or(clause: &str) -> Vec<String> {
    let lowered = clause.to_ascii_lowercase();
    let mut terms = Vec::new();
    let mut start = 0usize;
    while let Some(offset) = lowered[start..].find(" or ") {
        terms.push(clause[start..start + offset].to_string());
        start += offset + 4;
    }
    terms.push(clause[start..].to_string());
    terms
}

#[cfg(test)]
mod access_tests {
    use super::*;

    fn user(name: &str, perms: &[&str]) -> UserContext {
        let mut user = UserContext::new(name);
        user.permissions = perms.iter().map(|perm| perm.to_string()).collect();
        user
    }

    fn locked(locks: &str) -> Template {
        Template::new()
            .with(fields::KEY, "goblin")
            .with(fields::TEMPLATE_LOCKS, locks)
    }

    #[test]
    fn missing_or_empty_clause_allows_everyone() {
        let policy = LockAccessPolicy;
        let bob = user("bob", &[]);
        assert!(policy.can_edit(&bob, &Template::new()));
        assert!(policy.can_edit(&bob, &locked("spawn:all()")));
        assert!(policy.can_edit(&bob, &locked("edit:")));
    }

    #[test]
    fn perm_and_id_terms_are_or_joined() {
        let policy = LockAccessPolicy;
        let template = locked("spawn:all();edit:perm(Builder) OR id(alice)");
        assert!(policy.can_edit(&user("bob", &["builder"]), &template));
        assert!(policy.can_edit(&user("Alice", &[]), &template));
        assert!(!policy.can_edit(&user("carol", &["Player"]), &template));
    }

    #[test]
    fn false_blocks_everyone_but_superusers() {
        let policy = LockAccessPolicy;
        let template = locked("edit:false()");
        assert!(!policy.can_edit(&user("bob", &["Builder"]), &template));
        assert!(policy.can_edit(&user("root", &["Developer"]), &template));
    }

    #[test]
    fn unknown_terms_deny() {
        let policy = LockAccessPolicy;
        let template = locked("edit:tag(staff)");
        assert!(!policy.can_edit(&user("bob", &[]), &template));
    }
}
