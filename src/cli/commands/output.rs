//! Shared human/`--json` output helper and timestamp formatting for CLI
//! commands.

use chrono::Utc;

pub fn human_or_json<H, J>(json: bool, human: H, to_json: J)
where
    H: FnOnce(),
    J: FnOnce() -> serde_json::Value,
{
    if json {
        let value = to_json();
        match serde_json::to_string_pretty(&value) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("failed to serialize output: {e}"),
        }
    } else {
        human();
    }
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
