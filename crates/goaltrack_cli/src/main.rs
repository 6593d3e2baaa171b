//! Command-line view over a goaltrack database.
//!
//! # Responsibility
//! - Verify `goaltrack_core` linkage and print its version.
//! - Print period stats, daily stats and recent logs for one owner.
//!
//! The database path and defaults come from `GOALTRACK_*` variables.

use clap::{Parser, Subcommand, ValueEnum};
use goaltrack_core::{
    core_version, init_logging, open_db, CoreConfig, SqliteGoalRepository,
    SqliteTimeLogRepository, StatsPeriod, StatsService, TimeLogListRequest, TimeLogService,
};
use log::error;
use std::error::Error;
use std::process::ExitCode;
use uuid::Uuid;

type CliResult = Result<(), Box<dyn Error>>;

/// Period window for the stats command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PeriodArg {
    Day,
    Week,
    Month,
}

impl From<PeriodArg> for StatsPeriod {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::Day => StatsPeriod::Day,
            PeriodArg::Week => StatsPeriod::Week,
            PeriodArg::Month => StatsPeriod::Month,
        }
    }
}

/// Goal time tracking reports.
#[derive(Debug, Parser)]
#[command(name = "goaltrack", version, about = "Goal time tracking reports")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Minutes per goal over a trailing period
    Stats {
        owner: Uuid,
        #[arg(value_enum, default_value = "week")]
        period: PeriodArg,
    },

    /// Minutes per calendar day for one goal
    Daily {
        owner: Uuid,
        goal: Uuid,
        /// Window length; defaults to GOALTRACK_DAILY_DAYS
        days: Option<u32>,
    },

    /// One page of the owner's logs, newest first
    Logs {
        owner: Uuid,
        #[arg(long)]
        page: Option<u32>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult {
    let Some(command) = cli.command else {
        println!("goaltrack_core version={}", core_version());
        return Ok(());
    };

    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref().and_then(|dir| dir.to_str()) {
        init_logging(&config.log_level, log_dir)?;
    }

    match command {
        Commands::Stats { owner, period } => print_period_stats(&config, owner, period.into()),
        Commands::Daily { owner, goal, days } => {
            let days = days.unwrap_or(config.daily_window_days);
            print_daily_stats(&config, owner, goal, days)
        }
        Commands::Logs { owner, page } => print_recent_logs(&config, owner, page),
    }
}

fn print_period_stats(config: &CoreConfig, owner_id: Uuid, period: StatsPeriod) -> CliResult {
    let conn = open_db(&config.db_path)?;
    let service = StatsService::new(
        SqliteTimeLogRepository::try_new(&conn)?,
        SqliteGoalRepository::try_new(&conn)?,
    );
    for stats in service.period_stats(owner_id, None, period)? {
        let title = stats
            .goal
            .as_ref()
            .map_or("<deleted goal>", |goal| goal.title.as_str());
        println!(
            "{}\t{}\tminutes={}\tsessions={}\thours={}",
            stats.goal_id, title, stats.total_minutes, stats.total_sessions, stats.total_hours
        );
    }
    Ok(())
}

fn print_daily_stats(config: &CoreConfig, owner_id: Uuid, goal_id: Uuid, days: u32) -> CliResult {
    let conn = open_db(&config.db_path)?;
    let service = StatsService::new(
        SqliteTimeLogRepository::try_new(&conn)?,
        SqliteGoalRepository::try_new(&conn)?,
    );
    let report = service.daily_stats(owner_id, goal_id, Some(days))?;
    println!("goal={} days_with_time={}", report.goal.title, report.total_days);
    for day in report.daily_stats {
        println!(
            "{}\tminutes={}\tsessions={}",
            day.date, day.total_minutes, day.total_sessions
        );
    }
    Ok(())
}

fn print_recent_logs(config: &CoreConfig, owner_id: Uuid, page: Option<u32>) -> CliResult {
    let conn = open_db(&config.db_path)?;
    let service = TimeLogService::new(
        SqliteTimeLogRepository::try_new(&conn)?,
        SqliteGoalRepository::try_new(&conn)?,
    );
    let request = TimeLogListRequest {
        page,
        limit: Some(config.list_page_size),
        ..TimeLogListRequest::default()
    };
    let result = service.list_time_logs(owner_id, &request)?;
    println!(
        "page={}/{} total={}",
        result.current_page, result.total_pages, result.total
    );
    for view in result.items {
        println!(
            "{}\t{}\t{}\t{}",
            view.log.id,
            view.log.category.as_str(),
            view.log.formatted_duration(),
            view.goal.as_ref().map_or("<deleted goal>", |goal| goal.title.as_str())
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, PeriodArg};
    use clap::{CommandFactory, Parser};

    const OWNER: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
    const GOAL: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_is_accepted() {
        let cli = Cli::try_parse_from(["goaltrack"]).expect("bare invocation parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn stats_period_defaults_to_week() {
        let cli = Cli::try_parse_from(["goaltrack", "stats", OWNER]).expect("stats parses");
        match cli.command {
            Some(Commands::Stats { owner, period }) => {
                assert_eq!(owner.to_string(), OWNER);
                assert_eq!(period, PeriodArg::Week);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn stats_rejects_unknown_period_and_bad_uuid() {
        assert!(Cli::try_parse_from(["goaltrack", "stats", OWNER, "year"]).is_err());
        assert!(Cli::try_parse_from(["goaltrack", "stats", "not-a-uuid"]).is_err());
    }

    #[test]
    fn daily_takes_optional_window() {
        let cli = Cli::try_parse_from(["goaltrack", "daily", OWNER, GOAL, "7"])
            .expect("daily parses");
        match cli.command {
            Some(Commands::Daily { goal, days, .. }) => {
                assert_eq!(goal.to_string(), GOAL);
                assert_eq!(days, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["goaltrack", "daily", OWNER]).is_err());
    }

    #[test]
    fn logs_page_is_a_flag() {
        let cli = Cli::try_parse_from(["goaltrack", "logs", OWNER, "--page", "3"])
            .expect("logs parses");
        match cli.command {
            Some(Commands::Logs { page, .. }) => assert_eq!(page, Some(3)),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
