//! Ownership checks for category and item mutations.

use crate::error::ApiError;
use crate::session::Identity;

/// True iff a user is bound to the session and owns the resource.
pub fn is_owner(current: Option<&Identity>, resource_owner_id: i64) -> bool {
    matches!(current, Some(identity) if identity.user_id == resource_owner_id)
}

/// Refuse the mutation unless the caller owns the resource. "Not owner"
/// is reported exactly like any other refusal, before any side effect.
pub fn require_owner(current: Option<&Identity>, resource_owner_id: i64) -> Result<(), ApiError> {
    if is_owner(current, resource_owner_id) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("You do not own this record"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user_id: i64) -> Identity {
        Identity {
            user_id,
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            picture: None,
        }
    }

    #[test]
    fn unauthenticated_caller_is_never_owner() {
        assert!(!is_owner(None, 1));
        assert!(require_owner(None, 1).is_err());
    }

    #[test]
    fn different_user_is_not_owner() {
        let caller = identity(2);
        assert!(!is_owner(Some(&caller), 1));
        assert!(require_owner(Some(&caller), 1).is_err());
    }

    #[test]
    fn matching_user_is_owner() {
        let caller = identity(1);
        assert!(is_owner(Some(&caller), 1));
        assert!(require_owner(Some(&caller), 1).is_ok());
    }
}
