// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drops from root to the configured unprivileged user/group before any
//! collaborator is initialized. Failure here is always fatal (see the
//! concurrency model's privilege-drop requirement).

use std::ffi::CString;

use nix::unistd::{self, Group, User};

use crate::error::PrivilegeError;

pub fn drop_privileges(user: &str, group: &str) -> Result<(), PrivilegeError> {
    let gid = Group::from_name(group)
        .map_err(PrivilegeError::SetGid)?
        .ok_or_else(|| PrivilegeError::UnknownGroup(group.to_string()))?
        .gid;

    let user_record = User::from_name(user)
        .map_err(PrivilegeError::SetUid)?
        .ok_or_else(|| PrivilegeError::UnknownUser(user.to_string()))?;

    let user_cstr = CString::new(user).map_err(|_| PrivilegeError::UnknownUser(user.to_string()))?;
    unistd::initgroups(&user_cstr, gid).map_err(PrivilegeError::InitGroups)?;
    unistd::setgid(gid).map_err(PrivilegeError::SetGid)?;
    unistd::setuid(user_record.uid).map_err(PrivilegeError::SetUid)?;

    Ok(())
}

#[cfg(test)]
#[path = "privilege_tests.rs"]
mod tests;
