//! `daybook` command-line front end.
//!
//! # Responsibility
//! - Drive one owned `CalendarSession` from subcommands or an interactive
//!   shell, the way the desktop buttons drove the store.
//! - Report load fallbacks and unsaved changes to the user.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use daybook_core::{
    core_version, default_log_level, init_logging, ActivityRepository, CalendarService,
    CalendarSession, ClockTime, DateKey, JsonFileRepository, LoadOutcome, DEFAULT_STORE_FILE,
};
use log::info;

#[derive(Debug, Parser)]
#[command(name = "daybook", about = "Personal activity calendar", version)]
struct Cli {
    /// Activity file to load and save.
    #[arg(long, global = true, default_value = DEFAULT_STORE_FILE)]
    file: PathBuf,
    /// Absolute directory for rolling log files; logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List activities for a date.
    List(DateArgs),

    /// Add an activity to a date.
    Add(AddArgs),

    /// Delete the activity at a listing position.
    Delete(PositionArgs),

    /// Show one activity in full.
    Show(PositionArgs),

    /// List every date that has activities.
    Dates,

    /// Interactive session; changes are written only on `save`.
    Shell(DateArgs),
}

#[derive(Debug, Args)]
struct DateArgs {
    /// Date (YYYY-MM-DD). Defaults to today.
    date: Option<DateKey>,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Date (YYYY-MM-DD). Defaults to today.
    date: Option<DateKey>,
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=23))]
    hour: u8,
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(0..=59))]
    minute: u8,
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Debug, Args)]
struct PositionArgs {
    /// Position as shown by `list`.
    position: usize,
    /// Date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<DateKey>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        init_logging(level, log_dir).context("initializing logging")?;
    }
    info!(
        "event=cli_start module=cli status=ok core_version={} file={}",
        core_version(),
        cli.file.display()
    );

    let repo = JsonFileRepository::new(&cli.file);
    let mut session = CalendarSession::new(CalendarService::new(repo), DateKey::today());
    load_with_report(&mut session, &mut io::stderr())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::List(args) => {
            select_or_today(&mut session, args.date);
            print_listing(&session, &mut out)?;
        }
        Commands::Add(args) => {
            select_or_today(&mut session, args.date);
            session.add(
                ClockTime::new(args.hour, args.minute),
                args.title,
                args.description,
            );
            print_listing(&session, &mut out)?;
        }
        Commands::Delete(args) => {
            select_or_today(&mut session, args.date);
            if session.delete_selected(args.position).is_none() {
                writeln!(out, "Nothing at position {}.", args.position)?;
            }
            print_listing(&session, &mut out)?;
        }
        Commands::Show(args) => {
            select_or_today(&mut session, args.date);
            print_details(&session, args.position, &mut out)?;
        }
        Commands::Dates => {
            for date in session.service().dates() {
                let count = session.service().list(date).len();
                writeln!(out, "{date}  {count}")?;
            }
        }
        Commands::Shell(args) => {
            select_or_today(&mut session, args.date);
            let stdin = io::stdin();
            return run_shell(&mut session, stdin.lock(), &mut out);
        }
    }

    save_if_dirty(&mut session)
}

/// Saves one-shot changes; fails instead of writing over an unread file.
fn save_if_dirty<R: ActivityRepository>(session: &mut CalendarSession<R>) -> Result<()> {
    if session.service().is_dirty() {
        let location = session.service().repository().location().display().to_string();
        session
            .save()
            .with_context(|| format!("saving {location}"))?;
    }
    Ok(())
}

fn select_or_today<R: ActivityRepository>(
    session: &mut CalendarSession<R>,
    date: Option<DateKey>,
) {
    session.select(date.unwrap_or_else(DateKey::today));
}

fn load_with_report<R: ActivityRepository, W: Write>(
    session: &mut CalendarSession<R>,
    diag: &mut W,
) -> Result<()> {
    let location = session.service().repository().location().display().to_string();
    let outcome = session
        .load()
        .with_context(|| format!("loading {location}"))?;
    match outcome {
        LoadOutcome::Loaded { .. } => {}
        LoadOutcome::Created => writeln!(diag, "Created empty activity file {location}.")?,
        LoadOutcome::Quarantined { backup, reason } => writeln!(
            diag,
            "warning: {location} is malformed ({reason}); moved to {} and starting empty.",
            backup.display()
        )?,
        LoadOutcome::Unreadable { reason } => writeln!(
            diag,
            "warning: could not read {location} ({reason}); starting empty, saving is disabled until it loads."
        )?,
    }
    Ok(())
}

fn print_listing<R: ActivityRepository, W: Write>(
    session: &CalendarSession<R>,
    out: &mut W,
) -> Result<()> {
    let rows = session.listing();
    if rows.is_empty() {
        writeln!(out, "No activities on {}.", session.selected_date())?;
        return Ok(());
    }
    writeln!(out, "{}", session.selected_date())?;
    for row in rows {
        writeln!(out, "{:>3}  {}  {}", row.position, row.time, row.title)?;
    }
    Ok(())
}

fn print_details<R: ActivityRepository, W: Write>(
    session: &CalendarSession<R>,
    position: usize,
    out: &mut W,
) -> Result<()> {
    match session.details(position) {
        Some(details) => {
            writeln!(out, "Time         {}", details.header)?;
            writeln!(out, "Activity     {}", details.title)?;
            writeln!(out, "Description")?;
            for line in details.description.lines() {
                writeln!(out, "  {line}")?;
            }
        }
        None => writeln!(out, "Nothing at position {position}.")?,
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Select(DateKey),
    List,
    Add {
        time: ClockTime,
        title: String,
        description: String,
    },
    Delete(usize),
    Show(usize),
    Dates,
    Load,
    Save,
    ForceSave,
    Status,
    Help,
    Quit,
}

const SHELL_HELP: &str = "\
commands:
  select YYYY-MM-DD            pick a date
  list                         list activities for the selected date
  add HH:MM TITLE [| DESC]     add an activity (`\\n` in DESC is a newline)
  delete N                     delete the activity at position N
  show N                       show the activity at position N
  dates                        list dates with activities
  load                         reload from file, dropping unsaved changes
  save                         write all activities to file
  force-save                   write even over a file that could not be read
  status                       show date, time and unsaved state
  quit                         leave the shell";

fn parse_shell_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));

    let command = match verb {
        "select" => {
            ShellCommand::Select(rest.parse::<DateKey>().map_err(|err| err.to_string())?)
        }
        "list" | "ls" => ShellCommand::List,
        "add" => parse_add(rest)?,
        "delete" | "rm" => ShellCommand::Delete(parse_position(rest)?),
        "show" => ShellCommand::Show(parse_position(rest)?),
        "dates" => ShellCommand::Dates,
        "load" => ShellCommand::Load,
        "save" => ShellCommand::Save,
        "force-save" => ShellCommand::ForceSave,
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command `{other}`; try `help`")),
    };
    Ok(Some(command))
}

fn parse_add(rest: &str) -> Result<ShellCommand, String> {
    let (time, remainder) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| "usage: add HH:MM TITLE [| DESC]".to_string())?;
    let time = time
        .parse::<ClockTime>()
        .map_err(|err| err.to_string())?;
    if !time.is_valid() {
        return Err(format!("{time} is not a time of day"));
    }
    let (title, description) = match remainder.split_once('|') {
        Some((title, description)) => (title.trim(), description.trim()),
        None => (remainder.trim(), ""),
    };
    Ok(ShellCommand::Add {
        time,
        title: title.to_string(),
        description: description.replace("\\n", "\n"),
    })
}

fn parse_position(rest: &str) -> Result<usize, String> {
    rest.parse()
        .map_err(|_| format!("expected a listing position, got `{rest}`"))
}

fn run_shell<R: ActivityRepository, I: BufRead, W: Write>(
    session: &mut CalendarSession<R>,
    input: I,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "{}", session.status_line(Local::now().time()))?;
    print_listing(session, out)?;

    for line in input.lines() {
        let line = line.context("reading shell input")?;
        let command = match parse_shell_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "error: {message}")?;
                continue;
            }
        };

        match command {
            ShellCommand::Select(date) => {
                session.select(date);
                print_listing(session, out)?;
            }
            ShellCommand::List => print_listing(session, out)?,
            ShellCommand::Add {
                time,
                title,
                description,
            } => {
                session.add(time, title, description);
                print_listing(session, out)?;
            }
            ShellCommand::Delete(position) => {
                if session.delete_selected(position).is_none() {
                    writeln!(out, "Nothing at position {position}.")?;
                }
                print_listing(session, out)?;
            }
            ShellCommand::Show(position) => print_details(session, position, out)?,
            ShellCommand::Dates => {
                for date in session.service().dates() {
                    writeln!(out, "{date}  {}", session.service().list(date).len())?;
                }
            }
            ShellCommand::Load => {
                load_with_report(session, out)?;
                print_listing(session, out)?;
            }
            ShellCommand::Save => match session.save() {
                Ok(()) => writeln!(out, "Saved.")?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ShellCommand::ForceSave => match session.force_save() {
                Ok(()) => writeln!(out, "Saved.")?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ShellCommand::Status => {
                writeln!(out, "{}", session.status_line(Local::now().time()))?;
                if session.service().is_dirty() {
                    writeln!(out, "unsaved changes")?;
                }
            }
            ShellCommand::Help => writeln!(out, "{SHELL_HELP}")?,
            ShellCommand::Quit => break,
        }
    }

    if session.service().is_dirty() {
        writeln!(out, "warning: leaving with unsaved changes; they were not written.")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    fn shell_session(dir: &tempfile::TempDir) -> CalendarSession<JsonFileRepository> {
        let repo = JsonFileRepository::new(dir.path().join("activities.dat"));
        let mut session =
            CalendarSession::new(CalendarService::new(repo), "2024-01-01".parse().unwrap());
        session.load().expect("load");
        session
    }

    fn run(session: &mut CalendarSession<JsonFileRepository>, script: &str) -> String {
        let mut out = Vec::new();
        run_shell(session, Cursor::new(script.to_string()), &mut out).expect("shell");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn parse_add_splits_title_and_description() {
        let command = parse_shell_line("add 09:15 Standup | daily\\nsync").unwrap();
        assert_eq!(
            command,
            Some(ShellCommand::Add {
                time: ClockTime::new(9, 15),
                title: "Standup".to_string(),
                description: "daily\nsync".to_string(),
            })
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(parse_shell_line("add 25:00 Late").is_err());
        assert!(parse_shell_line("add 09:15").is_err());
        assert!(parse_shell_line("delete first").is_err());
        assert!(parse_shell_line("select tomorrow").is_err());
        assert!(parse_shell_line("frobnicate").is_err());
        assert_eq!(parse_shell_line("   ").unwrap(), None);
    }

    #[test]
    fn shell_saves_only_on_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("activities.dat");
        let mut session = shell_session(&dir);

        let output = run(&mut session, "add 09:15 Standup | daily sync\nquit\n");
        assert!(output.contains("  0  09:15  Standup"));
        assert!(output.contains("unsaved changes"));
        assert_eq!(fs::read_to_string(&path).expect("read").trim(), "{}");

        let output = run(&mut session, "save\n");
        assert!(output.contains("Saved."));
        assert!(fs::read_to_string(&path).expect("read").contains("Standup"));
    }

    #[test]
    fn shell_delete_and_show_use_positions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = shell_session(&dir);

        let output = run(
            &mut session,
            "add 09:00 first\nadd 10:00 second | notes\nshow 1\ndelete 0\nshow 0\ndelete 5\n",
        );
        assert!(output.contains("Time         2024-01-01 | 10:00"));
        assert!(output.contains("  notes"));
        assert!(output.contains("Nothing at position 5."));
        let titles: Vec<_> = session.listing().iter().map(|r| r.title.clone()).collect();
        assert_eq!(titles, ["second"]);
    }

    #[test]
    fn shell_load_drops_unsaved_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = shell_session(&dir);

        let output = run(&mut session, "select 2024-03-03\nadd 08:00 draft\nload\n");
        assert!(output.contains("No activities on 2024-03-03."));
        assert!(session.listing().is_empty());
        assert!(!session.service().is_dirty());
    }

    #[test]
    fn load_report_mentions_quarantine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("activities.dat");
        fs::write(&path, "not json").expect("write");
        let repo = JsonFileRepository::new(&path);
        let mut session =
            CalendarSession::new(CalendarService::new(repo), "2024-01-01".parse().unwrap());

        let mut diag = Vec::new();
        load_with_report(&mut session, &mut diag).expect("load");

        let diag = String::from_utf8(diag).expect("utf8");
        assert!(diag.contains("malformed"));
        assert!(diag.contains(".corrupt-"));
    }

    #[test]
    fn one_shot_save_fails_when_file_was_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store_dir = dir.path().join("activities.dat");
        fs::create_dir(&store_dir).expect("mkdir");
        let repo = JsonFileRepository::new(&store_dir);
        let mut session =
            CalendarSession::new(CalendarService::new(repo), "2024-01-01".parse().unwrap());

        let mut diag = Vec::new();
        load_with_report(&mut session, &mut diag).expect("load");
        assert!(String::from_utf8(diag).expect("utf8").contains("saving is disabled"));

        session.add(ClockTime::new(9, 0), "fresh", "");
        let err = save_if_dirty(&mut session).unwrap_err();
        assert!(format!("{err:#}").contains("refusing to overwrite"));
        assert!(store_dir.is_dir());
    }

    #[test]
    fn shell_save_reports_refusal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store_dir = dir.path().join("activities.dat");
        fs::create_dir(&store_dir).expect("mkdir");
        let repo = JsonFileRepository::new(&store_dir);
        let mut session =
            CalendarSession::new(CalendarService::new(repo), "2024-01-01".parse().unwrap());
        session.load().expect("load");

        let output = run(&mut session, "add 09:00 fresh\nsave\n");
        assert!(output.contains("error: refusing to overwrite"));
        assert!(session.service().is_dirty());
    }
}
