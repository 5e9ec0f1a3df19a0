//! Minimal Landlock sandbox setup for Linux.
//!
//! This is a best-effort hardening layer: if Landlock is unavailable or setup
//! fails (e.g. older kernel, missing permissions), we log and continue without
//! sandboxing rather than crashing the service.

#[cfg(target_os = "linux")]
pub mod linux {
    use std::path::Path;

    use landlock::{
        path_beneath_rules, Access, AccessFs, Ruleset, RulesetAttr, RulesetCreatedAttr,
        RulesetStatus, ABI,
    };
    use tracing::{info, warn};

    /// Restrict filesystem access to what the upload service needs.
    ///
    /// Current policy:
    /// - Read-only access to the whole filesystem
    /// - Full access beneath the storage root
    ///
    /// Must run after the storage root exists, since rules are bound to open
    /// directory handles.
    pub fn init(storage_root: &Path) {
        // The Landlock ABI should be incremented (and tested) regularly.
        let abi = ABI::V1;
        let access_all = AccessFs::from_all(abi);
        let access_read = AccessFs::from_read(abi);

        let result = Ruleset::default()
            .handle_access(access_all)
            .and_then(|r| r.create())
            .and_then(|r| r.add_rules(path_beneath_rules(&["/"], access_read)))
            .and_then(|r| r.add_rules(path_beneath_rules(&[storage_root], access_all)))
            .and_then(|r| r.restrict_self());

        match result {
            Ok(status) => match status.ruleset {
                RulesetStatus::FullyEnforced => info!(
                    ?status,
                    storage_root = %storage_root.display(),
                    "Landlock sandbox fully enforced (writes limited to the storage root)"
                ),
                RulesetStatus::PartiallyEnforced => info!(
                    ?status,
                    storage_root = %storage_root.display(),
                    "Landlock sandbox partially enforced (writes limited to the storage root)"
                ),
                RulesetStatus::NotEnforced => warn!(
                    ?status,
                    "Landlock ruleset not enforced; kernel does not support requested features"
                ),
            },
            Err(err) => {
                warn!(?err, "Landlock not enabled; continuing without sandbox");
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub mod linux {
    /// No-op on non-Linux targets.
    pub fn init(_storage_root: &std::path::Path) {}
}
