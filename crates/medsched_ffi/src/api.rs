//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level grid functions to Dart via FRB.
//! - Hand whole-tree payloads to the shell for transport and accept the
//!   remote outcome back through resolve calls.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Exactly one grid engine exists per process.
//! - Tree payloads cross the boundary as JSON.

use medsched_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DayOfWeek, DraftValues, FieldKey, GridService, NodeId, NodeLevel, PendingSync, PersistTicket,
    ReminderTree, StoreFailure, TimeOfDay,
};
use std::sync::{Mutex, OnceLock};

const ACCOUNT_EMAIL_ENV: &str = "MEDSCHED_ACCOUNT_EMAIL";

static GRID: OnceLock<Mutex<GridService>> = OnceLock::new();
static ACCOUNT_EMAIL: OnceLock<String> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Account email the shell should fetch the tree for.
///
/// Resolved once per process from `MEDSCHED_ACCOUNT_EMAIL`; empty when the
/// shell must fall back to its authenticated user.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_account_email() -> String {
    ACCOUNT_EMAIL
        .get_or_init(|| {
            std::env::var(ACCOUNT_EMAIL_ENV)
                .map(|raw| raw.trim().to_string())
                .unwrap_or_default()
        })
        .clone()
}

/// Generic action response envelope for grid calls without a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl GridActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Response envelope for mutating calls that open a persist window.
///
/// On success the shell must PUT `tree_json` to the remote store and report
/// the outcome through [`grid_resolve_sync`] with the same `ticket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSyncResponse {
    pub ok: bool,
    /// Persist ticket identifying this in-flight mutation.
    pub ticket: Option<u64>,
    /// Serialized whole-tree payload for the remote replace call.
    pub tree_json: Option<String>,
    pub message: String,
}

impl GridSyncResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            ticket: None,
            tree_json: None,
            message: message.into(),
        }
    }
}

/// Response envelope for tree snapshot reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshotResponse {
    pub ok: bool,
    pub tree_json: Option<String>,
    pub message: String,
}

/// Installs a freshly fetched tree snapshot as canonical grid state.
///
/// # FFI contract
/// - Closes any open edit session (implicit cancel).
/// - Fails while a persist is in flight; retry after resolving it.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_install_tree(tree_json: String) -> GridActionResponse {
    let tree: ReminderTree = match serde_json::from_str(&tree_json) {
        Ok(tree) => tree,
        Err(err) => return GridActionResponse::failure(format!("invalid tree payload: {err}")),
    };
    match with_grid(|grid| grid.install_tree(tree)) {
        Ok(Ok(())) => GridActionResponse::success("Tree installed."),
        Ok(Err(err)) => GridActionResponse::failure(err.to_string()),
        Err(err) => GridActionResponse::failure(err),
    }
}

/// Serializes the current canonical tree for rendering.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_snapshot() -> GridSnapshotResponse {
    match with_grid(|grid| serde_json::to_string(grid.tree())) {
        Ok(Ok(tree_json)) => GridSnapshotResponse {
            ok: true,
            tree_json: Some(tree_json),
            message: String::new(),
        },
        Ok(Err(err)) => GridSnapshotResponse {
            ok: false,
            tree_json: None,
            message: format!("tree serialization failed: {err}"),
        },
        Err(err) => GridSnapshotResponse {
            ok: false,
            tree_json: None,
            message: err,
        },
    }
}

/// Opens the single edit session for one row.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_begin_edit(node_id: String, level: String) -> GridActionResponse {
    let (node_id, level) = match parse_row_target(&node_id, &level) {
        Ok(target) => target,
        Err(message) => return GridActionResponse::failure(message),
    };
    match with_grid(|grid| grid.begin_edit(node_id, level)) {
        Ok(Ok(())) => GridActionResponse::success("Edit session opened."),
        Ok(Err(err)) => GridActionResponse::failure(err.to_string()),
        Err(err) => GridActionResponse::failure(err),
    }
}

/// Merges one raw field change into the active draft.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_update_field(field: String, value: String) -> GridActionResponse {
    let Some(key) = FieldKey::parse(&field) else {
        return GridActionResponse::failure(format!("unknown field: `{field}`"));
    };
    let mut fields = DraftValues::new();
    fields.insert(key, value);
    match with_grid(|grid| grid.update_draft(fields)) {
        Ok(Ok(())) => GridActionResponse::success("Draft updated."),
        Ok(Err(err)) => GridActionResponse::failure(err.to_string()),
        Err(err) => GridActionResponse::failure(err),
    }
}

/// Discards the active draft; succeeds even when no session is open.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_cancel_edit() -> GridActionResponse {
    match with_grid(|grid| grid.cancel_edit()) {
        Ok(()) => GridActionResponse::success("Edit cancelled."),
        Err(err) => GridActionResponse::failure(err),
    }
}

/// Pagination/view change hook: closes the session, keeps the tree.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_view_changed() -> GridActionResponse {
    match with_grid(|grid| grid.view_changed()) {
        Ok(()) => GridActionResponse::success("View state cleared."),
        Err(err) => GridActionResponse::failure(err),
    }
}

/// Row id of the active edit session, if one is open.
///
/// Row highlighting must key off this id, not off widget object identity.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_active_edit_row() -> Option<String> {
    with_grid(|grid| grid.active_edit().map(|session| session.node_id.to_string()))
        .ok()
        .flatten()
}

/// Commits the active draft and opens the persist window.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_save() -> GridSyncResponse {
    sync_call(|grid| grid.save_active_edit(), "Row saved locally; persist pending.")
}

/// Deletes one row and its subtree, optimistically.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_delete(node_id: String, level: String) -> GridSyncResponse {
    let (node_id, level) = match parse_row_target(&node_id, &level) {
        Ok(target) => target,
        Err(message) => return GridSyncResponse::failure(message),
    };
    sync_call(
        |grid| grid.delete_node(node_id, level),
        "Row deleted locally; persist pending.",
    )
}

/// Adds a person row.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_add_person(name: String) -> GridSyncResponse {
    sync_call(
        |grid| grid.add_person(&name),
        "Person added locally; persist pending.",
    )
}

/// Adds a day group under one person.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_add_group(person_id: String, day_of_week: String) -> GridSyncResponse {
    let person_id = match parse_node_id(&person_id) {
        Ok(id) => id,
        Err(message) => return GridSyncResponse::failure(message),
    };
    let day = match DayOfWeek::parse(&day_of_week) {
        Ok(day) => day,
        Err(err) => return GridSyncResponse::failure(err.to_string()),
    };
    sync_call(
        |grid| grid.add_group(person_id, day),
        "Day group added locally; persist pending.",
    )
}

/// Adds a reminder entry under one day group.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_add_entry(
    group_id: String,
    medication_name: String,
    time_of_day: String,
) -> GridSyncResponse {
    let group_id = match parse_node_id(&group_id) {
        Ok(id) => id,
        Err(message) => return GridSyncResponse::failure(message),
    };
    let time = match TimeOfDay::parse(&time_of_day) {
        Ok(time) => time,
        Err(err) => return GridSyncResponse::failure(err.to_string()),
    };
    sync_call(
        |grid| grid.add_entry(group_id, &medication_name, time),
        "Reminder added locally; persist pending.",
    )
}

/// Settles one pending persist with the remote outcome.
///
/// # FFI contract
/// - `ok=true` confirms the optimistic snapshot.
/// - `ok=false` rolls the tree back; `timed_out` distinguishes timeouts
///   from rejections for the retry prompt.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_resolve_sync(
    ticket: u64,
    ok: bool,
    timed_out: bool,
    message: String,
) -> GridActionResponse {
    let outcome = if ok {
        Ok(())
    } else if timed_out {
        Err(StoreFailure::Timeout)
    } else {
        Err(StoreFailure::Unavailable { message })
    };
    match with_grid(|grid| grid.resolve_sync(PersistTicket::from_value(ticket), outcome)) {
        Ok(Ok(())) => GridActionResponse::success("Persist confirmed."),
        Ok(Err(err)) => GridActionResponse::failure(err.to_string()),
        Err(err) => GridActionResponse::failure(err),
    }
}

fn sync_call(
    op: impl FnOnce(&mut GridService) -> Result<PendingSync, medsched_core::GridError>,
    success_message: &str,
) -> GridSyncResponse {
    let result = with_grid(|grid| {
        op(grid).map(|pending| (pending, serde_json::to_string(grid.tree())))
    });
    match result {
        Ok(Ok((pending, Ok(tree_json)))) => GridSyncResponse {
            ok: true,
            ticket: Some(pending.ticket.value()),
            tree_json: Some(tree_json),
            message: success_message.to_string(),
        },
        Ok(Ok((_, Err(err)))) => {
            GridSyncResponse::failure(format!("tree serialization failed: {err}"))
        }
        Ok(Err(err)) => GridSyncResponse::failure(err.to_string()),
        Err(err) => GridSyncResponse::failure(err),
    }
}

fn with_grid<T>(f: impl FnOnce(&mut GridService) -> T) -> Result<T, String> {
    let mutex = GRID.get_or_init(|| Mutex::new(GridService::new()));
    match mutex.lock() {
        Ok(mut grid) => Ok(f(&mut grid)),
        Err(_) => {
            log::error!("event=grid_lock_poisoned module=ffi status=error");
            Err("grid engine state is unavailable; restart the app".to_string())
        }
    }
}

fn parse_node_id(value: &str) -> Result<NodeId, String> {
    NodeId::parse_str(value.trim()).map_err(|_| format!("invalid row id: `{value}`"))
}

fn parse_row_target(node_id: &str, level: &str) -> Result<(NodeId, NodeLevel), String> {
    let node_id = parse_node_id(node_id)?;
    let level =
        NodeLevel::parse(level).ok_or_else(|| format!("unknown row level: `{level}`"))?;
    Ok((node_id, level))
}

#[cfg(test)]
mod tests {
    use super::{
        grid_active_edit_row, grid_add_entry, grid_add_group, grid_begin_edit, grid_cancel_edit,
        grid_delete, grid_install_tree, grid_resolve_sync, grid_save, grid_snapshot,
        grid_update_field, init_logging, ping,
    };
    use medsched_core::{
        DayGroupNode, DayOfWeek, PersonNode, ReminderEntryNode, ReminderTree, TimeOfDay,
    };

    fn seed_json() -> (ReminderTree, String) {
        let mut ana = PersonNode::new("Ana");
        let mut monday = DayGroupNode::new(DayOfWeek::Monday);
        monday
            .entries
            .push(ReminderEntryNode::new("Ibuprofen", TimeOfDay::try_new(8, 0).unwrap()));
        let mut friday = DayGroupNode::new(DayOfWeek::Friday);
        friday
            .entries
            .push(ReminderEntryNode::new("Dipirona", TimeOfDay::try_new(22, 0).unwrap()));
        ana.groups.push(monday);
        ana.groups.push(friday);
        let tree = ReminderTree::new(vec![ana]);
        let json = serde_json::to_string(&tree).expect("tree serializes");
        (tree, json)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn init_logging_rejects_empty_log_dir_and_bad_level() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn invalid_inputs_fail_with_envelope_messages() {
        let bad_id = grid_begin_edit("not-a-uuid".to_string(), "entry".to_string());
        assert!(!bad_id.ok);
        assert!(bad_id.message.contains("invalid row id"));

        let bad_field = grid_update_field("dosage".to_string(), "2".to_string());
        assert!(!bad_field.ok);
        assert!(bad_field.message.contains("unknown field"));

        let bad_payload = grid_install_tree("{not json".to_string());
        assert!(!bad_payload.ok);
        assert!(bad_payload.message.contains("invalid tree payload"));
    }

    // The grid engine is one process-wide instance, so everything touching
    // it runs inside this single sequential flow.
    #[test]
    fn full_edit_and_sync_flow_over_the_boundary() {
        let (tree, json) = seed_json();
        let entry_id = tree.persons[0].groups[0].entries[0].id;
        let friday_id = tree.persons[0].groups[1].id;

        let installed = grid_install_tree(json);
        assert!(installed.ok, "{}", installed.message);

        // Edit the entry time and commit; the shell receives the payload.
        let opened = grid_begin_edit(entry_id.to_string(), "entry".to_string());
        assert!(opened.ok, "{}", opened.message);
        assert_eq!(grid_active_edit_row(), Some(entry_id.to_string()));

        let updated = grid_update_field("time_of_day".to_string(), "20:00".to_string());
        assert!(updated.ok, "{}", updated.message);

        let saved = grid_save();
        assert!(saved.ok, "{}", saved.message);
        let ticket = saved.ticket.expect("save opens a persist window");
        let payload = saved.tree_json.expect("save returns the payload");
        assert!(payload.contains("20"));
        assert!(grid_active_edit_row().is_none());

        // A second mutation while the persist is pending is rejected busy.
        let busy = grid_delete(friday_id.to_string(), "day_group".to_string());
        assert!(!busy.ok);
        assert!(busy.message.contains("in flight"));

        let confirmed = grid_resolve_sync(ticket, true, false, String::new());
        assert!(confirmed.ok, "{}", confirmed.message);

        let snapshot = grid_snapshot();
        assert!(snapshot.ok);
        assert!(snapshot.tree_json.unwrap().contains("\"minute\":0"));

        // A failed persist rolls the optimistic delete back.
        let deleted = grid_delete(friday_id.to_string(), "day_group".to_string());
        assert!(deleted.ok, "{}", deleted.message);
        let rollback = grid_resolve_sync(
            deleted.ticket.unwrap(),
            false,
            false,
            "server unreachable".to_string(),
        );
        assert!(!rollback.ok);
        assert!(rollback.message.contains("rolled back"));
        let snapshot = grid_snapshot();
        assert!(snapshot.tree_json.unwrap().contains("friday"));

        // Duplicate day insert is rejected with the conflicting day named.
        let ana_id = tree.persons[0].id;
        let duplicate = grid_add_group(ana_id.to_string(), "friday".to_string());
        assert!(!duplicate.ok);
        assert!(duplicate.message.contains("Friday"));

        // Valid insert persists through the same two-phase protocol.
        let monday_id = tree.persons[0].groups[0].id;
        let added = grid_add_entry(
            monday_id.to_string(),
            "Clonazepam".to_string(),
            "21:15".to_string(),
        );
        assert!(added.ok, "{}", added.message);
        let confirmed = grid_resolve_sync(added.ticket.unwrap(), true, false, String::new());
        assert!(confirmed.ok, "{}", confirmed.message);
        let snapshot = grid_snapshot();
        assert!(snapshot.tree_json.unwrap().contains("Clonazepam"));

        let cancelled = grid_cancel_edit();
        assert!(cancelled.ok);
    }
}
