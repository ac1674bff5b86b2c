mod api;
mod cli;
mod config;
mod db;
mod stats;

use crate::cli::onboard::run_onboarding;
use crate::cli::{Cli, Commands, ConfigCommands};
use crate::config::Config;
use crate::db::{Database, HabitRow};
use crate::stats::HabitStats;
use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Add { name, bad } => handle_add(&name, bad),
        Commands::Remove { name } => handle_remove(&name),
        Commands::List { date } => handle_list(date),
        Commands::Toggle { name, date } => handle_toggle(&name, date),
        Commands::Stats { name, date } => handle_stats(&name, date),
        Commands::Serve => {
            let config = load_config()?;
            api::run_server(Arc::new(config)).await
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
    }
}

fn handle_add(name: &str, bad: bool) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let habit = database.create_habit(name, Local::now().date_naive(), bad)?;
    let kind = if habit.is_bad { "bad" } else { "good" };
    println!("Tracking {kind} habit '{}'", habit.name);

    Ok(())
}

fn handle_remove(name: &str) -> Result<()> {
    let config = load_config()?;
    let database = Database::open(&config.db_path)?;

    let habit = find_habit(&database, name)?;
    database.delete_habit(habit.id)?;
    println!("Removed '{}' and its completion history", habit.name);

    Ok(())
}

fn handle_list(date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let database = Database::open(&config.db_path)?;
    let date = parse_as_of_date(date)?;

    let habits = database.list_habits()?;
    if habits.is_empty() {
        println!("No habits yet. Add one with `habitrack add <name>`.");
        return Ok(());
    }

    println!("Habits for {}:", date.format("%Y-%m-%d"));
    for habit in habits {
        let marker = if database.is_completed(habit.id, date)? {
            "[x]"
        } else {
            "[ ]"
        };
        let completions = database.completions_for_habit(habit.id)?;
        let stats = HabitStats::compute(habit.is_bad, habit.date_created, &completions, date);
        println!("{marker} {:<24} {}", habit.name, stats.streak_text());
    }

    Ok(())
}

fn handle_toggle(name: &str, date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let database = Database::open(&config.db_path)?;
    let date = parse_as_of_date(date)?;

    let habit = find_habit(&database, name)?;
    let completed = database.toggle_completion(habit.id, date)?;

    let completions = database.completions_for_habit(habit.id)?;
    let stats = HabitStats::compute(habit.is_bad, habit.date_created, &completions, date);

    let action = if completed { "Completed" } else { "Uncompleted" };
    println!("{action} '{}' on {}", habit.name, date.format("%Y-%m-%d"));
    println!("{}", stats.streak_text());

    Ok(())
}

fn handle_stats(name: &str, date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let database = Database::open(&config.db_path)?;
    let date = parse_as_of_date(date)?;

    let habit = find_habit(&database, name)?;
    let completions = database.completions_for_habit(habit.id)?;
    let stats = HabitStats::compute(habit.is_bad, habit.date_created, &completions, date);

    let kind = if habit.is_bad { "bad" } else { "good" };
    println!("{} ({kind} habit, tracked since {})", habit.name, habit.date_created);
    println!("- {}", stats.streak_text());
    println!("- current_streak: {}", stats.current_streak);
    println!("- longest_streak: {}", stats.longest_streak());
    println!("- win_streaks: {:?}", stats.win_streaks);
    println!("- loss_streaks: {:?}", stats.loss_streaks);
    println!("- completed_today: {}", stats.completed_today);
    for (period, entry) in &stats.periods {
        println!(
            "- {period}: {} completion(s) over {} day(s)",
            entry.completions, entry.days
        );
    }

    Ok(())
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = load_config()?;
    let database = Database::open(&config.db_path)?;

    println!("Habitrack status");
    println!("- config: {}", Config::config_path()?.display());
    println!("- db_path: {}", config.db_path.display());
    println!("- api_port: {}", config.api_port);
    println!("- habit_count: {}", database.habit_count()?);
    println!(
        "- latest_completion: {}",
        database
            .latest_completion()?
            .map(|date| date.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}

fn find_habit(database: &Database, name: &str) -> Result<HabitRow> {
    database
        .habit_by_name(name)?
        .with_context(|| format!("No habit named '{name}'. See `habitrack list`."))
}

/// Resolve an optional "as of" date: absent or unparsable input means
/// today, and a date after today is rejected before any stats run.
fn parse_as_of_date(input: Option<String>) -> Result<NaiveDate> {
    resolve_as_of_date(input.as_deref(), Local::now().date_naive())
}

fn resolve_as_of_date(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let date = input
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .unwrap_or(today);

    if date > today {
        bail!("Requested date {date} is in the future");
    }

    Ok(date)
}

fn load_or_default_config() -> Result<Config> {
    Config::load().or_else(|_| {
        let config = Config::default();
        config.ensure_bootstrap_files()?;
        config.save()?;
        Ok(config)
    })
}

fn load_config() -> Result<Config> {
    Config::load().with_context(|| "Config file not found. Run `habitrack init` first.".to_string())
}
