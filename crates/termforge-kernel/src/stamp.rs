//! Revision stamping and the immutable session context.
//!
//! Every record in a chronicle carries the same five mandatory revision
//! fields. The author and module are process-wide constants; the path and
//! the default timestamp are fixed once at initialization. Changing any of
//! them mid-run would retroactively change the derivation of every
//! subsequently created default identifier, so [`SessionContext`] has no
//! setters: it is constructed once and only read afterwards.

use crate::bindings;
use crate::ident::{Identifier, Namespace};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    Inactive,
}

/// The mandatory revision fields stamped onto every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub status: Status,
    pub time: DateTime<Utc>,
    pub author: Identifier,
    pub module: Identifier,
    pub path: Identifier,
}

/// Process-wide construction context: namespace, path, default time.
///
/// Single-writer, single-assignment. All fields are private and set once
/// by [`SessionContext::new`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    namespace: Namespace,
    path: Identifier,
    default_time: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(namespace: Namespace, path: Identifier, default_time: DateTime<Utc>) -> Self {
        Self {
            namespace,
            path,
            default_time,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn path(&self) -> Identifier {
        self.path
    }

    pub fn default_time(&self) -> DateTime<Utc> {
        self.default_time
    }

    /// Fill the mandatory revision fields, defaulting status to Active and
    /// time to the session default.
    pub fn stamp(&self, status: Option<Status>, time: Option<DateTime<Utc>>) -> Stamp {
        self.stamp_on(self.path, status, time)
    }

    /// Stamp onto an explicit path.
    ///
    /// Only the bootstrap concepts (the path concept and its refset
    /// memberships) live on a path other than the session path.
    pub fn stamp_on(
        &self,
        path: Identifier,
        status: Option<Status>,
        time: Option<DateTime<Utc>>,
    ) -> Stamp {
        Stamp {
            status: status.unwrap_or(Status::Active),
            time: time.unwrap_or(self.default_time),
            author: bindings::AUTHOR,
            module: bindings::UNSPECIFIED_MODULE,
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn context() -> SessionContext {
        let ns = Namespace::from_seed("test");
        let path = ns.derive_one("Test Path");
        let time = Utc.with_ymd_and_hms(2015, 3, 1, 0, 0, 0).unwrap();
        SessionContext::new(ns, path, time)
    }

    #[test]
    fn stamp_fills_defaults() {
        let ctx = context();
        let stamp = ctx.stamp(None, None);
        assert_eq!(stamp.status, Status::Active);
        assert_eq!(stamp.time, ctx.default_time());
        assert_eq!(stamp.path, ctx.path());
        assert_eq!(stamp.author, bindings::AUTHOR);
        assert_eq!(stamp.module, bindings::UNSPECIFIED_MODULE);
    }

    #[test]
    fn explicit_status_and_time_win() {
        let ctx = context();
        let t = Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap();
        let stamp = ctx.stamp(Some(Status::Inactive), Some(t));
        assert_eq!(stamp.status, Status::Inactive);
        assert_eq!(stamp.time, t);
    }

    #[test]
    fn stamp_on_overrides_only_the_path() {
        let ctx = context();
        let other = bindings::AUXILIARY_PATH;
        let stamp = ctx.stamp_on(other, None, None);
        assert_eq!(stamp.path, other);
        assert_eq!(stamp.time, ctx.default_time());
    }
}
