//! CLI smoke entry point.
//!
//! Opens an in-memory feed store to prove the core links and migrates.
//! Set `NOTIFEED_LOG_DIR` to an absolute path to write rolling logs there.

use notifeed_core::db::migrations::latest_version;
use notifeed_core::db::open_db_in_memory;
use notifeed_core::{default_log_level, init_logging};

const LOG_DIR_ENV: &str = "NOTIFEED_LOG_DIR";

fn main() {
    if let Ok(raw) = std::env::var(LOG_DIR_ENV) {
        let log_dir = raw.trim();
        if !log_dir.is_empty() {
            if let Err(err) = init_logging(default_log_level(), log_dir) {
                eprintln!("notifeed_core logging=error error={err}");
                std::process::exit(1);
            }
            println!("notifeed_core logging={log_dir}");
        }
    }

    println!("notifeed_core ping={}", notifeed_core::ping());
    println!("notifeed_core version={}", notifeed_core::core_version());
    match open_db_in_memory() {
        Ok(_) => println!("notifeed_core schema={}", latest_version()),
        Err(err) => {
            eprintln!("notifeed_core schema=error error={err}");
            std::process::exit(1);
        }
    }
}
