//! # ReDACT Privileged Exec (`common::privilege`)
//!
//! File: cli/src/common/privilege.rs
//!
//! ## Overview
//!
//! Replaces the current process with a command running under another user and
//! group, in the style of `gosu`/`su-exec`. Used by `redact exec` and, after a
//! successful render, by `redact entrypoint`.
//!
//! ## Architecture
//!
//! A USERSPEC is `<user or uid>` or `<user or uid>:<group or gid>`:
//! - names are looked up with `getpwnam_r` / `getgrnam_r`
//! - a numeric uid is looked up with `getpwuid_r` for its primary group and home
//! - a numeric uid with no passwd entry runs with gid 0 and `HOME=/`
//! - without an explicit group, the user's primary group is used
//!
//! The identity switch runs in a `pre_exec` hook, in the order gosu uses:
//! the supplementary groups `initgroups` would set (read with `getgrouplist`
//! before forking, or an empty list for a uid without a passwd entry), then
//! `setgid`, then `setuid`. The
//! command is then `execvp`ed, so `exec` only returns when something failed.
//! Without root, changing the group list fails with `EPERM`; that is ignored
//! so running as oneself keeps working.
//!
use crate::core::error::RedactError;
use std::ffi::{CStr, CString};
use std::io;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Initial buffer size for the reentrant passwd/group lookups.
const LOOKUP_BUFFER_SIZE: usize = 4096;
/// Lookups give up growing their buffer past this size.
const LOOKUP_BUFFER_LIMIT: usize = 1024 * 1024;

/// The identity a command will be executed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecUser {
    /// Login name, when the user has a passwd entry.
    pub name: Option<String>,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

struct PasswdEntry {
    name: String,
    uid: u32,
    gid: u32,
    home: PathBuf,
}

/// Splits a USERSPEC into its user part and optional group part.
pub fn parse_userspec(userspec: &str) -> Result<(&str, Option<&str>), RedactError> {
    let (user, group) = match userspec.split_once(':') {
        Some((user, group)) => (user, Some(group)),
        None => (userspec, None),
    };
    if user.is_empty() {
        return Err(RedactError::Exec(format!(
            "invalid userspec '{}': empty user",
            userspec
        )));
    }
    if group == Some("") {
        return Err(RedactError::Exec(format!(
            "invalid userspec '{}': empty group",
            userspec
        )));
    }
    Ok((user, group))
}

/// Resolves a USERSPEC against the passwd and group databases.
pub fn resolve_userspec(userspec: &str) -> Result<ExecUser, RedactError> {
    let (user, group) = parse_userspec(userspec)?;

    let mut exec_user = match user.parse::<u32>() {
        Ok(uid) => match lookup_user_by_uid(uid)? {
            Some(entry) => entry.into(),
            None => ExecUser {
                name: None,
                uid,
                gid: 0,
                home: PathBuf::from("/"),
            },
        },
        Err(_) => lookup_user_by_name(user)?
            .map(ExecUser::from)
            .ok_or_else(|| RedactError::Exec(format!("unable to find user {}", user)))?,
    };

    if let Some(group) = group {
        exec_user.gid = match group.parse::<u32>() {
            Ok(gid) => gid,
            Err(_) => lookup_group_by_name(group)?
                .ok_or_else(|| RedactError::Exec(format!("unable to find group {}", group)))?,
        };
    }
    debug!("Resolved userspec '{}' to {:?}", userspec, exec_user);
    Ok(exec_user)
}

/// Executes `argv` as `userspec`, replacing the current process.
///
/// Returns only on failure.
pub fn exec(userspec: &str, argv: &[String]) -> RedactError {
    let Some((program, args)) = argv.split_first() else {
        return RedactError::Exec("no command given".to_string());
    };
    let user = match resolve_userspec(userspec) {
        Ok(user) => user,
        Err(e) => return e,
    };
    info!(
        "with userspec `{}`, executing command `{}`",
        userspec, program
    );

    let groups = match supplementary_groups(&user) {
        Ok(groups) => groups,
        Err(e) => return e,
    };
    debug!("supplementary groups for uid {}: {:?}", user.uid, groups);
    let (uid, gid) = (user.uid, user.gid);

    let mut command = Command::new(program);
    command.args(args).env("HOME", &user.home);
    // SAFETY: the hook runs in the forked child. It only makes the
    // async-signal-safe setgroups/setgid/setuid calls on data prepared here
    // and allocates nothing.
    unsafe {
        command.pre_exec(move || switch_identity(&groups, uid, gid));
    }
    let err = command.exec();
    RedactError::Exec(format!("failed to execute '{}': {}", program, err))
}

/// The group list `initgroups(user, gid)` would install: the user's
/// memberships from the group database plus `gid`. Empty for a user with no
/// passwd entry.
pub fn supplementary_groups(user: &ExecUser) -> Result<Vec<libc::gid_t>, RedactError> {
    let Some(name) = user.name.as_deref() else {
        return Ok(Vec::new());
    };
    let c_name = CString::new(name)
        .map_err(|_| RedactError::Exec(format!("invalid user name '{}'", name)))?;
    let mut groups: Vec<libc::gid_t> = vec![0; 32];
    loop {
        let mut count = groups.len() as libc::c_int;
        // SAFETY: `groups` holds `count` writable entries and `c_name` is a
        // valid NUL-terminated string for the duration of the call.
        let rc = unsafe {
            libc::getgrouplist(
                c_name.as_ptr(),
                user.gid as _,
                groups.as_mut_ptr() as *mut _,
                &mut count,
            )
        };
        if rc >= 0 {
            groups.truncate(count.max(0) as usize);
            return Ok(groups);
        }
        // `count` now holds the required size (glibc); otherwise double.
        let needed = (count.max(0) as usize).max(groups.len() * 2);
        if needed > LOOKUP_BUFFER_LIMIT {
            return Err(RedactError::Exec(format!(
                "too many groups for user '{}'",
                name
            )));
        }
        groups.resize(needed, 0);
    }
}

/// Runs in the forked child before `execvp`.
fn switch_identity(groups: &[libc::gid_t], uid: u32, gid: u32) -> io::Result<()> {
    // SAFETY: plain syscalls on a borrowed slice that outlives the call.
    if unsafe { libc::setgroups(groups.len() as _, groups.as_ptr()) } != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EPERM) {
            return Err(err);
        }
    }
    if unsafe { libc::setgid(gid as libc::gid_t) } != 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::setuid(uid as libc::uid_t) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl From<PasswdEntry> for ExecUser {
    fn from(entry: PasswdEntry) -> Self {
        ExecUser {
            name: Some(entry.name),
            uid: entry.uid,
            gid: entry.gid,
            home: entry.home,
        }
    }
}

fn lookup_user_by_name(name: &str) -> Result<Option<PasswdEntry>, RedactError> {
    let c_name = CString::new(name)
        .map_err(|_| RedactError::Exec(format!("invalid user name '{}'", name)))?;
    lookup_passwd(name, |pwd, buf, len, result| unsafe {
        libc::getpwnam_r(c_name.as_ptr(), pwd, buf, len, result)
    })
}

fn lookup_user_by_uid(uid: u32) -> Result<Option<PasswdEntry>, RedactError> {
    lookup_passwd(&uid.to_string(), |pwd, buf, len, result| unsafe {
        libc::getpwuid_r(uid as libc::uid_t, pwd, buf, len, result)
    })
}

/// Runs a reentrant passwd query, growing the scratch buffer on `ERANGE`.
fn lookup_passwd<F>(what: &str, mut query: F) -> Result<Option<PasswdEntry>, RedactError>
where
    F: FnMut(*mut libc::passwd, *mut libc::c_char, libc::size_t, *mut *mut libc::passwd) -> libc::c_int,
{
    let mut buf: Vec<libc::c_char> = vec![0; LOOKUP_BUFFER_SIZE];
    loop {
        // SAFETY: passwd is plain old data; an all-zero value is valid.
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        let rc = query(&mut pwd, buf.as_mut_ptr(), buf.len(), &mut result);
        if rc == libc::ERANGE && buf.len() < LOOKUP_BUFFER_LIMIT {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 {
            return Err(RedactError::Exec(format!(
                "passwd lookup for '{}' failed: {}",
                what,
                std::io::Error::from_raw_os_error(rc)
            )));
        }
        if result.is_null() {
            return Ok(None);
        }
        let name = if pwd.pw_name.is_null() {
            what.to_string()
        } else {
            // SAFETY: on success pw_name points into `buf`, which is still alive.
            unsafe { CStr::from_ptr(pwd.pw_name) }
                .to_string_lossy()
                .into_owned()
        };
        let home = if pwd.pw_dir.is_null() {
            PathBuf::from("/")
        } else {
            // SAFETY: on success pw_dir points into `buf`, which is still alive.
            let dir = unsafe { CStr::from_ptr(pwd.pw_dir) };
            PathBuf::from(dir.to_string_lossy().into_owned())
        };
        return Ok(Some(PasswdEntry {
            name,
            uid: pwd.pw_uid,
            gid: pwd.pw_gid,
            home,
        }));
    }
}

fn lookup_group_by_name(name: &str) -> Result<Option<u32>, RedactError> {
    let c_name = CString::new(name)
        .map_err(|_| RedactError::Exec(format!("invalid group name '{}'", name)))?;
    let mut buf: Vec<libc::c_char> = vec![0; LOOKUP_BUFFER_SIZE];
    loop {
        // SAFETY: group is plain old data; an all-zero value is valid.
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();
        let rc = unsafe {
            libc::getgrnam_r(
                c_name.as_ptr(),
                &mut grp,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < LOOKUP_BUFFER_LIMIT {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 {
            return Err(RedactError::Exec(format!(
                "group lookup for '{}' failed: {}",
                name,
                std::io::Error::from_raw_os_error(rc)
            )));
        }
        return Ok(if result.is_null() {
            None
        } else {
            Some(grp.gr_gid)
        });
    }
}
