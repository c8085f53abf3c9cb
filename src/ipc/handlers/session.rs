use crate::bank::BankRepo;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup;
use crate::ipc::types::{AppState, Request};
use crate::session;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

fn handle_session_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let exam = match setup::load_exam(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if !exam.get("live").and_then(|v| v.as_bool()).unwrap_or(false) {
        return err(&req.id, "exam_closed", "the exam is not open to students", None);
    }
    let limit = exam
        .get("questionLimit")
        .and_then(|v| v.as_u64())
        .unwrap_or(50) as usize;

    let bank = match BankRepo::new(conn).get() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    // Never hand out an empty session; the student is told to come back.
    if bank.is_empty() {
        return err(
            &req.id,
            "bank_empty",
            "the question bank is still being prepared, check back soon",
            None,
        );
    }

    let questions = session::draw(&bank, limit);

    ok(
        &req.id,
        json!({
            "sessionId": Uuid::new_v4().to_string(),
            "startedAt": Utc::now().to_rfc3339(),
            "questionCount": questions.len(),
            "questions": questions
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.start" => Some(handle_session_start(state, req)),
        _ => None,
    }
}
