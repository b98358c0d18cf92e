//! Start-up provisioning of the fixed user roster.

use std::sync::Arc;

use tracing::info;
use zeroize::Zeroizing;

use crate::domain::auth_service::{map_hash_error, map_user_persistence_error};
use crate::domain::ports::{PasswordHasher, UserAccount, UserRepository};
use crate::domain::{Error, Role, User, UserId, UserValidationError, Username};

/// One roster member and its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub username: Username,
    pub role: Role,
}

/// The fixed set of users provisioned at start-up.
///
/// # Examples
/// ```
/// use loan_backend::domain::{Role, Roster};
///
/// let roster = Roster::try_new(["Gilbert", "Jasper"], ["Jasper"], "BMW123").unwrap();
/// assert_eq!(roster.entries()[1].role, Role::Editor);
/// ```
#[derive(Debug, Clone)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    default_password: Zeroizing<String>,
}

impl Roster {
    /// Build a roster. Names listed in `editors` receive [`Role::Editor`]
    /// and are added when missing from `usernames`. Duplicates collapse.
    pub fn try_new<N, E>(
        usernames: N,
        editors: E,
        default_password: &str,
    ) -> Result<Self, UserValidationError>
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let editors = editors
            .into_iter()
            .map(|name| Username::new(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries: Vec<RosterEntry> = Vec::new();
        let names = usernames
            .into_iter()
            .map(|name| Username::new(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        for username in names.into_iter().chain(editors.iter().cloned()) {
            if entries.iter().any(|entry| entry.username == username) {
                continue;
            }
            let role = if editors.contains(&username) {
                Role::Editor
            } else {
                Role::Viewer
            };
            entries.push(RosterEntry { username, role });
        }

        Ok(Self {
            entries,
            default_password: Zeroizing::new(default_password.to_owned()),
        })
    }

    /// Members in declaration order.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }
}

/// Create every roster member that does not exist yet.
///
/// Existing accounts are left untouched, including their password and role.
/// Returns the number of accounts created.
pub async fn ensure_users<U, H>(
    users: &Arc<U>,
    hasher: &Arc<H>,
    roster: &Roster,
) -> Result<usize, Error>
where
    U: UserRepository + ?Sized,
    H: PasswordHasher + ?Sized,
{
    let mut created = 0;
    for entry in roster.entries() {
        let existing = users
            .find_by_username(&entry.username)
            .await
            .map_err(map_user_persistence_error)?;
        if existing.is_some() {
            continue;
        }

        let password_hash = hasher
            .hash(roster.default_password.as_str())
            .await
            .map_err(map_hash_error)?;
        let account = UserAccount {
            user: User::new(UserId::random(), entry.username.clone(), entry.role),
            password_hash,
        };
        if users
            .insert_if_absent(&account)
            .await
            .map_err(map_user_persistence_error)?
        {
            info!(username = %entry.username, role = %entry.role, "provisioned user");
            created += 1;
        }
    }
    Ok(created)
}
