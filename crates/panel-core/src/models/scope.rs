//! Well-known scope identifiers and helpers for scope strings.
//!
//! Scope strings on the wire are delimited by spaces or commas; order is
//! not significant.

use std::collections::BTreeSet;

pub const LOGIN: &str = "login";
pub const ADMIN: &str = "admin";
pub const SELF_EDIT: &str = "self.edit";

/// Split a delimited scope string into its non-empty identifiers.
pub fn split(scopes: &str) -> impl Iterator<Item = &str> {
    scopes
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

/// Unordered set view of a delimited scope string.
pub fn set(scopes: &str) -> BTreeSet<&str> {
    split(scopes).collect()
}

/// Canonical space-delimited form.
pub fn join<S: AsRef<str>>(scopes: &[S]) -> String {
    scopes
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_accepts_spaces_and_commas() {
        let got: Vec<_> = split("login, self.edit  servers.view,").collect();
        assert_eq!(got, vec!["login", "self.edit", "servers.view"]);
    }

    #[test]
    fn set_ignores_order() {
        assert_eq!(set("login self.edit"), set("self.edit,login"));
    }

    #[test]
    fn join_is_space_delimited() {
        assert_eq!(join(&[LOGIN, SELF_EDIT]), "login self.edit");
        assert_eq!(join::<&str>(&[]), "");
    }
}
