use anyhow::{bail, Result};

#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    Migrate,
    Help,
}

/// The migrator takes no options; everything lives in the config file.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    match args {
        [] => Ok(Invocation::Migrate),
        [flag] if matches!(flag.as_str(), "-h" | "--help" | "help") => Ok(Invocation::Help),
        [other, ..] => bail!("Unexpected argument '{other}'. Run `planka-migrate --help` for usage"),
    }
}

pub fn print_help() {
    println!("planka-migrate: copy Trello workspaces into Planka\n");
    println!("USAGE:");
    println!("  planka-migrate          Migrate every workspace the Trello token can see");
    println!("  planka-migrate --help   Show this message");
    println!();
    println!("CONFIG:");
    println!("  ~/.planka-migrate/config.toml (override with PLANKA_MIGRATE_CONFIG)");
    println!();
    println!("  [trello]     api_key, token, base_url");
    println!("  [planka]     url, username, password");
    println!("  [migration]  add_date_to_filename, timezone, request_delay_ms,");
    println!("               scratch_dir, log_file, order");
    println!();
    println!("Set RUST_LOG=debug to trace every API request.");
}
