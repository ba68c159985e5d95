//! In-process user directory with a unique handle index.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;

use stellar_shared::types::UserId;

use super::error::DirectoryError;
use crate::access::{Actor, Role};

const MAX_UTORID_LEN: usize = 16;
const MAX_NAME_LEN: usize = 50;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user ID.
    pub id: UserId,
    /// Unique, immutable handle.
    pub utorid: String,
    /// Display name.
    pub name: String,
    /// Current role.
    pub role: Role,
    /// Whether the account has been verified by staff.
    pub verified: bool,
    /// Whether the user is under investigation. Purchases recorded by a
    /// suspicious cashier are held until cleared.
    pub suspicious: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the user as the caller of a ledger operation.
    #[must_use]
    pub fn as_actor(&self) -> Actor {
        Actor {
            id: self.id,
            utorid: self.utorid.clone(),
            role: self.role,
            verified: self.verified,
            suspicious: self.suspicious,
        }
    }
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Requested handle.
    pub utorid: String,
    /// Display name.
    pub name: String,
    /// Initial role.
    pub role: Role,
    /// Initial verification state.
    pub verified: bool,
}

/// Normalizes and validates a handle.
///
/// Handles are case-insensitive and stored lowercase.
pub fn normalize_utorid(raw: &str) -> Result<String, DirectoryError> {
    let utorid = raw.trim().to_ascii_lowercase();
    if utorid.is_empty()
        || utorid.len() > MAX_UTORID_LEN
        || !utorid.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(DirectoryError::InvalidUtorid(raw.to_string()));
    }
    Ok(utorid)
}

/// Directory of registered users.
#[derive(Debug)]
pub struct UserDirectory {
    users: DashMap<UserId, User>,
    by_utorid: DashMap<String, UserId>,
    next_id: AtomicI64,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            by_utorid: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Registers a new user.
    pub fn register(&self, input: NewUser) -> Result<User, DirectoryError> {
        let utorid = normalize_utorid(&input.utorid)?;
        let name = input.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(DirectoryError::InvalidName);
        }

        match self.by_utorid.entry(utorid.clone()) {
            Entry::Occupied(_) => Err(DirectoryError::DuplicateUtorid(utorid)),
            Entry::Vacant(slot) => {
                let id = UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
                let user = User {
                    id,
                    utorid,
                    name,
                    role: input.role,
                    verified: input.verified,
                    suspicious: false,
                    created_at: Utc::now(),
                };
                self.users.insert(id, user.clone());
                slot.insert(id);
                tracing::info!(user_id = %id, utorid = %user.utorid, role = %user.role, "User registered");
                Ok(user)
            }
        }
    }

    /// Finds a user by ID.
    #[must_use]
    pub fn find(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|user| user.value().clone())
    }

    /// Finds a user by handle (case-insensitive).
    #[must_use]
    pub fn find_by_utorid(&self, utorid: &str) -> Option<User> {
        let key = normalize_utorid(utorid).ok()?;
        let id = *self.by_utorid.get(&key)?;
        self.find(id)
    }

    /// Returns every user ordered by ID.
    #[must_use]
    pub fn all(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    /// Changes a user's role.
    pub fn set_role(&self, id: UserId, role: Role) -> Result<User, DirectoryError> {
        self.update(id, |user| user.role = role)
    }

    /// Marks a user verified or unverified.
    pub fn set_verified(&self, id: UserId, verified: bool) -> Result<User, DirectoryError> {
        self.update(id, |user| user.verified = verified)
    }

    /// Flags or clears a user as suspicious.
    pub fn set_suspicious(&self, id: UserId, suspicious: bool) -> Result<User, DirectoryError> {
        self.update(id, |user| user.suspicious = suspicious)
    }

    fn update(&self, id: UserId, f: impl FnOnce(&mut User)) -> Result<User, DirectoryError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or(DirectoryError::UserNotFound(id))?;
        f(user.value_mut());
        Ok(user.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(utorid: &str, role: Role) -> NewUser {
        NewUser {
            utorid: utorid.to_string(),
            name: "Test User".to_string(),
            role,
            verified: false,
        }
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let directory = UserDirectory::new();
        let a = directory.register(new_user("alice001", Role::Regular)).unwrap();
        let b = directory.register(new_user("bob00002", Role::Cashier)).unwrap();
        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));
        assert!(!a.suspicious);
    }

    #[test]
    fn test_register_duplicate_is_case_insensitive() {
        let directory = UserDirectory::new();
        directory.register(new_user("alice001", Role::Regular)).unwrap();
        let err = directory
            .register(new_user("ALICE001", Role::Regular))
            .unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateUtorid(_)));
        assert_eq!(err.http_status_code(), 409);
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let directory = UserDirectory::new();
        assert!(matches!(
            directory.register(new_user("not valid!", Role::Regular)),
            Err(DirectoryError::InvalidUtorid(_))
        ));
        assert!(matches!(
            directory.register(new_user("", Role::Regular)),
            Err(DirectoryError::InvalidUtorid(_))
        ));
        let mut input = new_user("carol003", Role::Regular);
        input.name = "   ".to_string();
        assert!(matches!(
            directory.register(input),
            Err(DirectoryError::InvalidName)
        ));
    }

    #[test]
    fn test_find_by_utorid() {
        let directory = UserDirectory::new();
        let user = directory.register(new_user("Dave0004", Role::Manager)).unwrap();
        assert_eq!(user.utorid, "dave0004");
        assert_eq!(directory.find_by_utorid("DAVE0004").unwrap().id, user.id);
        assert!(directory.find_by_utorid("nobody").is_none());
        assert!(directory.find_by_utorid("bad handle").is_none());
    }

    #[test]
    fn test_updates() {
        let directory = UserDirectory::new();
        let user = directory.register(new_user("erin0005", Role::Regular)).unwrap();

        let user = directory.set_role(user.id, Role::Cashier).unwrap();
        assert_eq!(user.role, Role::Cashier);
        let user = directory.set_verified(user.id, true).unwrap();
        assert!(user.verified);
        let user = directory.set_suspicious(user.id, true).unwrap();
        assert!(user.as_actor().suspicious);

        assert!(matches!(
            directory.set_role(UserId::new(99), Role::Manager),
            Err(DirectoryError::UserNotFound(_))
        ));
    }
}
