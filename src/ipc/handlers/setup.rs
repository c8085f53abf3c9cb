use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
enum SetupSection {
    App,
    Chat,
    Game,
    Exam,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "app" => Some(Self::App),
            "chat" => Some(Self::Chat),
            "game" => Some(Self::Game),
            "exam" => Some(Self::Exam),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::App => "setup.app",
            Self::Chat => "setup.chat",
            Self::Game => "setup.game",
            Self::Exam => "setup.exam",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::App => json!({
            "appName": "QuizBank",
            "themeColor": "#3b82f6",
            "maintenanceMode": false,
            "allowSignup": true,
            "loginMessage": "",
            "marqueeLines": []
        }),
        SetupSection::Chat => json!({
            "enabled": true,
            "cost": 1,
            "cooldownMinutes": 360
        }),
        SetupSection::Game => json!({
            "enabled": true,
            "dailyReward": 3,
            "signupBonus": 2,
            "wheelRewards": [0, 1, 2, 5]
        }),
        SetupSection::Exam => json!({
            "live": false,
            "questionLimit": 50,
            "prizes": {
                "rank1": 100,
                "rank2": 50,
                "rank3": 25,
                "above60": 10,
                "above45": 5,
                "above30": 2
            }
        }),
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool()
        .ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_hex_color(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 7)?.to_ascii_lowercase();
    let hex_ok = s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !hex_ok {
        return Err(format!("{} must be a #rrggbb color", key));
    }
    Ok(s)
}

fn parse_string_list(
    v: &Value,
    key: &str,
    max_items: usize,
    max_len: usize,
) -> Result<Vec<Value>, String> {
    let arr = v.as_array().ok_or_else(|| format!("{} must be a list", key))?;
    if arr.len() > max_items {
        return Err(format!("{} must have <= {} entries", key, max_items));
    }
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(Value::String(parse_string_max(item, key, max_len)?));
    }
    Ok(out)
}

fn parse_i64_list(
    v: &Value,
    key: &str,
    max_items: usize,
    min: i64,
    max: i64,
) -> Result<Vec<Value>, String> {
    let arr = v.as_array().ok_or_else(|| format!("{} must be a list", key))?;
    if arr.is_empty() || arr.len() > max_items {
        return Err(format!("{} must have 1..={} entries", key, max_items));
    }
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(Value::from(parse_i64_range(item, key, min, max)?));
    }
    Ok(out)
}

const PRIZE_FIELDS: [&str; 6] = ["rank1", "rank2", "rank3", "above60", "above45", "above30"];

fn merge_prizes_patch(current: &mut Value, patch: &Value) -> Result<(), String> {
    let patch_obj = patch
        .as_object()
        .ok_or_else(|| "prizes must be an object".to_string())?;
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal prizes object must be a JSON object".to_string())?;
    for (k, v) in patch_obj {
        if !PRIZE_FIELDS.contains(&k.as_str()) {
            return Err(format!("unknown prizes field: {}", k));
        }
        obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 100_000)?));
    }
    Ok(())
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::App => match k.as_str() {
                "appName" => {
                    let s = parse_string_max(v, k, 80)?;
                    if s.is_empty() {
                        return Err(format!("{} must not be empty", k));
                    }
                    obj.insert(k.clone(), Value::String(s));
                }
                "themeColor" => {
                    obj.insert(k.clone(), Value::String(parse_hex_color(v, k)?));
                }
                "maintenanceMode" | "allowSignup" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                "loginMessage" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 500)?));
                }
                "marqueeLines" => {
                    obj.insert(k.clone(), Value::Array(parse_string_list(v, k, 10, 200)?));
                }
                _ => return Err(format!("unknown app field: {}", k)),
            },
            SetupSection::Chat => match k.as_str() {
                "enabled" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                "cost" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 100)?));
                }
                "cooldownMinutes" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 1440)?));
                }
                _ => return Err(format!("unknown chat field: {}", k)),
            },
            SetupSection::Game => match k.as_str() {
                "enabled" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                "dailyReward" | "signupBonus" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 100)?));
                }
                "wheelRewards" => {
                    obj.insert(k.clone(), Value::Array(parse_i64_list(v, k, 16, 0, 1000)?));
                }
                _ => return Err(format!("unknown game field: {}", k)),
            },
            SetupSection::Exam => match k.as_str() {
                "live" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                "questionLimit" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, 500)?));
                }
                "prizes" => {
                    let mut prizes = obj
                        .get(k.as_str())
                        .cloned()
                        .unwrap_or_else(|| default_section(SetupSection::Exam)["prizes"].clone());
                    merge_prizes_patch(&mut prizes, v)?;
                    obj.insert(k.clone(), prizes);
                }
                _ => return Err(format!("unknown exam field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &rusqlite::Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = store::store_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Best-effort apply: malformed historical values should not block
            // the console.
            let _ = merge_section_patch(section, &mut current, saved_obj);
        }
    }
    Ok(current)
}

/// Exam section with defaults applied; the session handler gates on it.
pub fn load_exam(conn: &rusqlite::Connection) -> anyhow::Result<Value> {
    load_section(conn, SetupSection::Exam)
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let app = match load_section(conn, SetupSection::App) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let chat = match load_section(conn, SetupSection::Chat) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let game = match load_section(conn, SetupSection::Game) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let exam = match load_section(conn, SetupSection::Exam) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "app": app,
            "chat": chat,
            "game": game,
            "exam": exam
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = store::store_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    let _ = store::record_activity(
        conn,
        "SETTINGS_UPDATE",
        &format!("Updated {} settings", section_raw),
    );
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
