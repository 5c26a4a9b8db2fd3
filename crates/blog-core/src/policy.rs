//! Object-level permission checks.
//!
//! Handlers call these explicitly before mutating a resource; collection
//! routes only require an authenticated caller.

use uuid::Uuid;

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Permit,
    Deny,
}

impl Access {
    pub fn is_permitted(self) -> bool {
        matches!(self, Access::Permit)
    }
}

/// Whether an HTTP method is read-only.
pub fn is_safe_method(method: &str) -> bool {
    matches!(method, "GET" | "HEAD" | "OPTIONS")
}

/// Reads are open to any authenticated caller; writes only to the author.
pub fn owner_or_read_only(safe_method: bool, requester: Uuid, author: Uuid) -> Access {
    if safe_method || requester == author {
        Access::Permit
    } else {
        Access::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_methods() {
        assert!(is_safe_method("GET"));
        assert!(is_safe_method("HEAD"));
        assert!(is_safe_method("OPTIONS"));
        assert!(!is_safe_method("PUT"));
        assert!(!is_safe_method("PATCH"));
        assert!(!is_safe_method("DELETE"));
        assert!(!is_safe_method("POST"));
    }

    #[test]
    fn test_read_permitted_for_anyone() {
        let access = owner_or_read_only(true, Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(access, Access::Permit);
    }

    #[test]
    fn test_write_permitted_for_author() {
        let author = Uuid::new_v4();
        assert!(owner_or_read_only(false, author, author).is_permitted());
    }

    #[test]
    fn test_write_denied_for_non_author() {
        let access = owner_or_read_only(false, Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(access, Access::Deny);
        assert!(!access.is_permitted());
    }
}
