use crate::config::{Config, expand_home};
use crate::db::Database;
use anyhow::{Context, Result};
use chrono::Local;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to Habitrack setup.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();
    let defaults = Config::default();

    println!("\n[1/3] Database location");
    let db_path_input: String = Input::with_theme(&theme)
        .with_prompt("  Where should habit data be stored?")
        .default(defaults.db_path.display().to_string())
        .interact_text()
        .context("Failed to read database path")?;
    let db_path = expand_home(&db_path_input);
    println!("  ✓ {}", db_path.display());

    println!("\n[2/3] API port");
    let api_port: u16 = Input::with_theme(&theme)
        .with_prompt("  Port for the local dashboard API")
        .default(defaults.api_port.to_string())
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            input
                .parse::<u16>()
                .map(|_| ())
                .map_err(|_| "Use a port number between 1 and 65535")
        })
        .interact_text()
        .context("Failed to read API port")?
        .parse()
        .context("Invalid port number")?;
    println!("  ✓ Port {api_port}");

    let config = Config { db_path, api_port };
    config.ensure_bootstrap_files()?;
    config.save()?;
    let database = Database::open(&config.db_path)?;

    println!("\n[3/3] First habit");
    let add_first = Confirm::with_theme(&theme)
        .with_prompt("  Add your first habit now?")
        .default(true)
        .interact()
        .context("Failed to read habit prompt input")?;

    if add_first {
        let name: String = Input::with_theme(&theme)
            .with_prompt("  Habit name")
            .interact_text()
            .context("Failed to read habit name")?;

        let kind = Select::with_theme(&theme)
            .with_prompt("  Habit kind")
            .default(0)
            .items(&[
                "good habit (streaks count completed days)",
                "bad habit (streaks count clean days)",
            ])
            .interact()
            .context("Failed to select habit kind")?;

        let habit = database.create_habit(&name, Local::now().date_naive(), kind == 1)?;
        println!("  ✓ Tracking '{}'", habit.name);
    } else {
        println!("  ✓ Skipped. Add one later with `habitrack add <name>`");
    }

    println!("\n──────────────────────────────────────────");
    println!("  Setup complete!");
    println!("  Run `habitrack toggle <name>` to record today's completion.");
    println!("──────────────────────────────────────────");

    Ok(config)
}
