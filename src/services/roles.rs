use std::collections::BTreeSet;

use crate::config::StaffConfig;
use crate::models::{Provider, Role};

/// Roles granted by a fresh login, before merging with anything stored.
pub fn initial_roles(provider: Provider, email: &str, staff: &StaffConfig) -> BTreeSet<Role> {
    match provider {
        Provider::Google => staff_roles(email, staff),
        Provider::Github => BTreeSet::from([Role::User]),
        Provider::Sponsor => BTreeSet::from([Role::User, Role::Sponsor]),
    }
}

fn staff_roles(email: &str, staff: &StaffConfig) -> BTreeSet<Role> {
    let Some((local_part, domain)) = email.rsplit_once('@') else {
        return BTreeSet::new();
    };

    if !domain.eq_ignore_ascii_case(&staff.domain) {
        // A Google login from outside the staff domain gets NO roles at all,
        // not even USER. Attendees come in through GitHub; granting USER here
        // would let any personal Google account mint a usable session. Do not
        // "fix" this branch to be more generous.
        return BTreeSet::new();
    }

    let mut roles = BTreeSet::from([Role::User, Role::Attendee, Role::Staff]);
    if staff.admins.iter().any(|admin| admin == local_part) {
        roles.insert(Role::Admin);
    }
    roles
}

/// Union of stored and freshly derived grants. Roles are only ever widened by
/// logins; revocation goes through the role mutation endpoints.
pub fn merge(stored: &BTreeSet<Role>, fresh: &BTreeSet<Role>) -> BTreeSet<Role> {
    stored.union(fresh).copied().collect()
}
