use crate::bank::{self, BankRepo};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;

fn handle_bank_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.text", None);
    };

    let repo = BankRepo::new(conn);
    let summary = match bank::import_pasted(&repo, text) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_update_failed", e.to_string(), None),
    };

    if !text.trim().is_empty() {
        let _ = store::record_activity(
            conn,
            "BANK_IMPORT",
            &format!(
                "Imported {} questions (bank total {})",
                summary.imported, summary.total
            ),
        );
    }

    ok(
        &req.id,
        json!({
            "imported": summary.imported,
            "total": summary.total
        }),
    )
}

fn handle_bank_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let repo = BankRepo::new(conn);
    let questions = match repo.get() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "total": questions.len(),
            "questions": questions
        }),
    )
}

// Destructive and final: the bank has no recycle-bin tier, so the operator's
// confirmation is enforced here and not only in the console UI.
fn handle_bank_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let confirm = req
        .params
        .get("confirm")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let repo = BankRepo::new(conn);
    if !confirm {
        let total = match repo.get() {
            Ok(v) => v.len(),
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };
        return ok(&req.id, json!({ "cleared": false, "total": total }));
    }

    if let Err(e) = repo.clear() {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    let _ = store::record_activity(conn, "BANK_RESET", "Cleared the question bank");

    ok(&req.id, json!({ "cleared": true, "total": 0 }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "bank.import" => Some(handle_bank_import(state, req)),
        "bank.list" => Some(handle_bank_list(state, req)),
        "bank.reset" => Some(handle_bank_reset(state, req)),
        _ => None,
    }
}
