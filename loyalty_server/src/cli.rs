use std::{env, env::VarError};

/// There's no real CLI for the server, so any argument prints the help text. Returns true if it did.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "LOYALTY_DATABASE_URL",
        "LOYALTY_MAX_DB_CONNECTIONS",
        "LOYALTY_ACCRUAL_SYSTEM_ADDRESS",
        "LOYALTY_ACCRUAL_MAX_RETRIES",
        "LOYALTY_ACCRUAL_RETRY_WAIT_MIN_MS",
        "LOYALTY_ACCRUAL_RETRY_WAIT_MAX_MS",
        "LOYALTY_ACCRUAL_TIMEOUT_SECS",
        "LOYALTY_POLL_INTERVAL_MS",
        "LOYALTY_POLL_BATCH_SIZE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
