use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;
use std::path::PathBuf;

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(out_path) = req
        .params
        .get("outPath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
    else {
        return err(&req.id, "bad_params", "missing params.outPath", None);
    };

    match backup::export_store_bundle(&workspace, &out_path) {
        Ok(summary) => {
            if let Some(conn) = state.db.as_ref() {
                let _ = store::record_activity(
                    conn,
                    "STORE_EXPORT",
                    &format!("Exported store bundle to {}", out_path.to_string_lossy()),
                );
            }
            ok(
                &req.id,
                json!({
                    "bundleFormat": summary.bundle_format,
                    "dbSha256": summary.db_sha256,
                    "outPath": out_path.to_string_lossy()
                }),
            )
        }
        Err(e) => err(&req.id, "export_failed", e.to_string(), None),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(in_path) = req
        .params
        .get("inPath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
    else {
        return err(&req.id, "bad_params", "missing params.inPath", None);
    };

    // Release the open store before swapping the file underneath it.
    state.db = None;

    let summary = match backup::import_store_bundle(&in_path, &workspace) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "import_failed", e.to_string(), None),
    };

    let conn = match store::open_store(&workspace) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };
    let _ = store::record_activity(
        &conn,
        "STORE_RESTORE",
        &format!("Restored store bundle from {}", in_path.to_string_lossy()),
    );
    state.db = Some(conn);

    ok(
        &req.id,
        json!({ "bundleFormat": summary.bundle_format_detected }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
