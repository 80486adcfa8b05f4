//! Entity and action type names of the PhotoFlash policy schema.

use authz::EntityUid;

pub const USER_TYPE: &str = "PhotoFlash::User";
pub const ACCOUNT_TYPE: &str = "PhotoFlash::Account";
pub const PHOTO_TYPE: &str = "PhotoFlash::Photo";
pub const ACTION_TYPE: &str = "PhotoFlash::Action";

/// Name of the user attribute that references the user's own account.
pub const ACCOUNT_ATTR: &str = "Account";

pub fn user_uid(id: &str) -> EntityUid {
    EntityUid::new(USER_TYPE, id)
}

pub fn account_uid(id: &str) -> EntityUid {
    EntityUid::new(ACCOUNT_TYPE, id)
}

pub fn photo_uid(id: &str) -> EntityUid {
    EntityUid::new(PHOTO_TYPE, id)
}
