use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;

const ACTIVITY_LIST_MAX: usize = 500;

fn handle_activity_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let limit = req
        .params
        .get("limit")
        .and_then(|v| v.as_u64())
        .unwrap_or(50) as usize;
    if limit == 0 || limit > ACTIVITY_LIST_MAX {
        return err(
            &req.id,
            "bad_params",
            format!("limit must be in 1..={}", ACTIVITY_LIST_MAX),
            None,
        );
    }

    let entries = match store::list_activity(conn, limit) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "total": entries.len(),
            "entries": entries
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "activity.list" => Some(handle_activity_list(state, req)),
        _ => None,
    }
}
