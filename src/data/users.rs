//! User accounts
//!
//! Users carry the town used by the "weather in my town" lookup. Only
//! administrators may change or remove accounts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by user operations
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("User not found")]
    NotFound(u32),

    /// The acting user lacks `ROLE_ADMIN`
    #[error("Vous n'avez pas les droits suffisants pour modifier un compte")]
    Forbidden,
}

/// Access level of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u32,
    pub email: String,
    /// Town used for weather lookups
    pub town: String,
    pub roles: Vec<Role>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// Request body for registering a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub town: String,
}

/// Request body for updating a user; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
}

/// In-memory user accounts, keyed by id
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: BTreeMap<u32, User>,
    next_id: u32,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            users: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// A directory with one regular user in Paris and one admin in Bordeaux
    pub fn with_defaults() -> Self {
        let mut directory = Self::new();
        directory.insert(
            "user@ecogardenapi.com".to_string(),
            "Paris".to_string(),
            vec![Role::User],
        );
        directory.insert(
            "admin@ecogardenapi.com".to_string(),
            "Bordeaux".to_string(),
            vec![Role::Admin],
        );
        directory
    }

    pub fn get(&self, id: u32) -> Option<&User> {
        self.users.get(&id)
    }

    /// Case-insensitive lookup by email
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim();
        self.users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
    }

    /// Registers a new user with `ROLE_USER`
    pub fn create(&mut self, new_user: NewUser) -> Result<&User, UserError> {
        let email = validate_email(&new_user.email)?;
        let town = validate_town(&new_user.town)?;
        if self.find_by_email(&email).is_some() {
            return Err(UserError::DuplicateEmail(email));
        }

        let id = self.insert(email, town, vec![Role::User]);
        tracing::info!("Created user {}", id);
        self.get(id).ok_or(UserError::NotFound(id))
    }

    /// Changes a user's email and/or town; `actor` must be an admin
    pub fn update(
        &mut self,
        actor: &User,
        id: u32,
        update: UserUpdate,
    ) -> Result<&User, UserError> {
        require_admin(actor)?;
        if !self.users.contains_key(&id) {
            return Err(UserError::NotFound(id));
        }

        let email = update.email.as_deref().map(validate_email).transpose()?;
        let town = update.town.as_deref().map(validate_town).transpose()?;
        if let Some(email) = &email {
            if self.find_by_email(email).is_some_and(|other| other.id != id) {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }

        let user = self.users.get_mut(&id).ok_or(UserError::NotFound(id))?;
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(town) = town {
            user.town = town;
        }

        tracing::info!("Updated user {}", id);
        Ok(&*user)
    }

    /// Removes a user; `actor` must be an admin
    pub fn delete(&mut self, actor: &User, id: u32) -> Result<User, UserError> {
        require_admin(actor)?;
        let removed = self.users.remove(&id).ok_or(UserError::NotFound(id))?;
        tracing::info!("Deleted user {}", id);
        Ok(removed)
    }

    fn insert(&mut self, email: String, town: String, roles: Vec<Role>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.users.insert(
            id,
            User {
                id,
                email,
                town,
                roles,
            },
        );
        id
    }
}

fn require_admin(actor: &User) -> Result<(), UserError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(UserError::Forbidden)
    }
}

fn validate_email(email: &str) -> Result<String, UserError> {
    let email = email.trim();
    let valid = matches!(
        email.split_once('@'),
        Some((local, domain)) if !local.is_empty() && !domain.is_empty()
    );
    if !valid {
        return Err(UserError::Validation(format!("Invalid email: '{}'", email)));
    }
    Ok(email.to_string())
}

fn validate_town(town: &str) -> Result<String, UserError> {
    let town = town.trim();
    if town.is_empty() {
        return Err(UserError::Validation("Town is required".to_string()));
    }
    Ok(town.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(directory: &UserDirectory) -> User {
        directory
            .find_by_email("admin@ecogardenapi.com")
            .cloned()
            .unwrap()
    }

    fn regular(directory: &UserDirectory) -> User {
        directory
            .find_by_email("user@ecogardenapi.com")
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let directory = UserDirectory::with_defaults();
        let user = regular(&directory);
        assert_eq!(user.town, "Paris");
        assert!(!user.is_admin());
        assert!(admin(&directory).is_admin());
    }

    #[test]
    fn test_find_by_email_ignores_case() {
        let directory = UserDirectory::with_defaults();
        let user = directory.find_by_email("  USER@EcoGardenApi.com ").unwrap();
        assert_eq!(user.id, 1);
    }

    #[test]
    fn test_create_assigns_user_role() {
        let mut directory = UserDirectory::with_defaults();
        let user = directory
            .create(NewUser {
                email: "jardin@example.com".to_string(),
                town: " Lyon ".to_string(),
            })
            .unwrap();

        assert_eq!(user.id, 3);
        assert_eq!(user.town, "Lyon");
        assert_eq!(user.roles, vec![Role::User]);
    }

    #[test]
    fn test_create_validation() {
        let mut directory = UserDirectory::with_defaults();

        let bad_email = directory.create(NewUser {
            email: "not-an-email".to_string(),
            town: "Lyon".to_string(),
        });
        assert!(matches!(bad_email, Err(UserError::Validation(_))));

        let no_town = directory.create(NewUser {
            email: "a@b.fr".to_string(),
            town: "".to_string(),
        });
        assert!(matches!(no_town, Err(UserError::Validation(_))));

        let duplicate = directory.create(NewUser {
            email: "Admin@EcoGardenApi.com".to_string(),
            town: "Nice".to_string(),
        });
        assert!(matches!(duplicate, Err(UserError::DuplicateEmail(_))));
    }

    #[test]
    fn test_update_requires_admin() {
        let mut directory = UserDirectory::with_defaults();
        let actor = regular(&directory);

        let result = directory.update(
            &actor,
            1,
            UserUpdate {
                town: Some("Nantes".to_string()),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(UserError::Forbidden)));
        assert_eq!(directory.get(1).unwrap().town, "Paris");
    }

    #[test]
    fn test_admin_updates_town() {
        let mut directory = UserDirectory::with_defaults();
        let actor = admin(&directory);

        let user = directory
            .update(
                &actor,
                1,
                UserUpdate {
                    town: Some("Nantes".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(user.town, "Nantes");
        assert_eq!(user.email, "user@ecogardenapi.com");
    }

    #[test]
    fn test_update_rejects_taken_email() {
        let mut directory = UserDirectory::with_defaults();
        let actor = admin(&directory);

        let result = directory.update(
            &actor,
            1,
            UserUpdate {
                email: Some("admin@ecogardenapi.com".to_string()),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[test]
    fn test_update_unknown_user() {
        let mut directory = UserDirectory::with_defaults();
        let actor = admin(&directory);
        let result = directory.update(&actor, 42, UserUpdate::default());
        assert!(matches!(result, Err(UserError::NotFound(42))));
    }

    #[test]
    fn test_delete() {
        let mut directory = UserDirectory::with_defaults();
        let actor = admin(&directory);

        assert!(matches!(
            directory.delete(&regular(&directory), 2),
            Err(UserError::Forbidden)
        ));

        let removed = directory.delete(&actor, 1).unwrap();
        assert_eq!(removed.email, "user@ecogardenapi.com");
        assert!(directory.get(1).is_none());
        assert!(matches!(directory.delete(&actor, 1), Err(UserError::NotFound(1))));
    }

    #[test]
    fn test_user_payload_shape() {
        let directory = UserDirectory::with_defaults();
        let json = serde_json::to_value(directory.get(2).unwrap()).unwrap();
        assert_eq!(json["roles"], serde_json::json!(["ROLE_ADMIN"]));
        assert_eq!(json["town"], "Bordeaux");
    }
}
