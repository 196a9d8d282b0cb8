//! Short ID prefix resolution for session commands.
//!
//! Any unique prefix of a session id is accepted, similar to git short hashes.

use anyhow::{bail, Result};

use crate::services::ScanSessionStore;

/// Resolve `prefix` to the full id of a stored session.
pub async fn resolve_session_id(store: &ScanSessionStore, prefix: &str) -> Result<String> {
    if prefix.is_empty() {
        bail!("Session ID must not be empty");
    }

    // Fast path: exact id
    if store.get(prefix).await.is_some() {
        return Ok(prefix.to_string());
    }

    let ids: Vec<String> = store.all().await.into_iter().map(|s| s.id).collect();
    match_prefix(&ids, prefix)
}

fn match_prefix(ids: &[String], prefix: &str) -> Result<String> {
    let matches: Vec<&String> = ids.iter().filter(|id| id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [] => bail!("No session found matching '{prefix}'"),
        [id] => Ok((*id).clone()),
        many => bail!("Ambiguous session ID '{prefix}' matches {} sessions", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<String> {
        vec![
            "3f2a9c10-0000-4000-8000-000000000001".to_string(),
            "3f2b0000-0000-4000-8000-000000000002".to_string(),
            "42".to_string(),
        ]
    }

    #[test]
    fn test_unique_prefix() {
        assert_eq!(match_prefix(&ids(), "3f2a").unwrap(), ids()[0]);
        assert_eq!(match_prefix(&ids(), "4").unwrap(), "42");
    }

    #[test]
    fn test_ambiguous_and_missing() {
        let err = match_prefix(&ids(), "3f2").unwrap_err();
        assert!(err.to_string().contains("matches 2 sessions"));
        assert!(match_prefix(&ids(), "ff").is_err());
    }
}
