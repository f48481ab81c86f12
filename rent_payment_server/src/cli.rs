use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "RPG_HOST",
        "RPG_PORT",
        "RPG_DATABASE_URL",
        "RPG_USE_X_FORWARDED_FOR",
        "RPG_USE_FORWARDED",
        "RPG_MPESA_IP_WHITELIST",
        "RPG_PENDING_REQUEST_TIMEOUT",
        "RPG_MPESA_ENV",
        "RPG_MPESA_BASE_URL",
        "RPG_MPESA_SHORTCODE",
        "RPG_MPESA_CALLBACK_URL",
        "RPG_MPESA_TOKEN_TTL",
        "RPG_MPESA_COUNTRY_CODE",
        "RPG_MPESA_TRANSACTION_TYPE",
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
