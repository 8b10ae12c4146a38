//! Interactive driver for the LCFS process table.
//!
//! Reads one command per line from stdin and prints the raw return code of
//! each call, e.g. `fork 1` prints `fork(1) = 2`.
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{LevelFilter, Log, Metadata, Record};

use lcfs::config::{MIN_GRANULARITY, SCHED_LATENCY};
use lcfs::process::NPROC;
use lcfs::syscalls;
use lcfs::{Channel, Pid, ProcessService, SchedConfig};

/// Drive a weighted-fair process table from the console.
#[derive(Parser, Debug)]
#[command(name = "lcfs", version, about)]
struct Cli {
    /// Number of process table slots.
    #[arg(long, default_value_t = NPROC)]
    capacity: usize,

    /// Time distributed across all processes per round (ms).
    #[arg(long, default_value_t = SCHED_LATENCY)]
    latency: u32,

    /// Smallest timeslice any process receives (ms).
    #[arg(long, default_value_t = MIN_GRANULARITY)]
    min_granularity: u32,

    /// Log verbosity on stderr.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

enum Command {
    Fork(Pid),
    Exit(Pid),
    Wait(Pid),
    Sleep(Pid, Channel),
    Wakeup(Channel),
    Kill(Pid),
    Nice(Pid, i32),
    Schedule,
    Dump,
    Stats,
    Help,
    Quit,
}

fn arg<T: std::str::FromStr>(words: &[&str], idx: usize, what: &str) -> Result<T, String> {
    let word = words.get(idx).ok_or_else(|| format!("missing {}", what))?;
    word.parse().map_err(|_| format!("invalid {}: {}", what, word))
}

fn parse(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(&cmd) = words.first() else {
        return Ok(None);
    };

    let command = match cmd {
        "fork" => Command::Fork(arg(&words, 1, "pid")?),
        "exit" => Command::Exit(arg(&words, 1, "pid")?),
        "wait" => Command::Wait(arg(&words, 1, "pid")?),
        "sleep" => Command::Sleep(arg(&words, 1, "pid")?, arg(&words, 2, "channel")?),
        "wakeup" => Command::Wakeup(arg(&words, 1, "channel")?),
        "kill" => Command::Kill(arg(&words, 1, "pid")?),
        "nice" => Command::Nice(arg(&words, 1, "pid")?, arg(&words, 2, "nice")?),
        "schedule" | "sched" => Command::Schedule,
        "dump" | "ps" => Command::Dump,
        "stats" => Command::Stats,
        "help" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(command))
}

const HELP: &str = "\
commands:
  fork <pid>            create a child of <pid>
  exit <pid>            terminate <pid>
  wait <pid>            reap one zombie child of <pid>
  sleep <pid> <chan>    block <pid> on <chan>
  wakeup <chan>         wake everything sleeping on <chan>
  kill <pid>            flag <pid> as killed
  nice <pid> <n>        set niceness (-20..19)
  schedule              assign timeslices and pick the next process
  dump                  list live processes
  stats                 per-state counts and scheduler totals
  quit";

/// Run one command; `false` means stop reading
fn run(svc: &mut ProcessService, command: Command, out: &mut impl Write) -> io::Result<bool> {
    match command {
        Command::Fork(pid) => writeln!(out, "fork({}) = {}", pid, syscalls::sys_fork(svc, pid))?,
        Command::Exit(pid) => writeln!(out, "exit({}) = {}", pid, syscalls::sys_exit(svc, pid))?,
        Command::Wait(pid) => writeln!(out, "wait({}) = {}", pid, syscalls::sys_wait(svc, pid))?,
        Command::Sleep(pid, chan) => {
            writeln!(out, "sleep({}, {}) = {}", pid, chan, syscalls::sys_sleep(svc, pid, chan))?
        }
        Command::Wakeup(chan) => {
            writeln!(out, "wakeup({}) = {}", chan, syscalls::sys_wakeup(svc, chan))?
        }
        Command::Kill(pid) => writeln!(out, "kill({}) = {}", pid, syscalls::sys_kill(svc, pid))?,
        Command::Nice(pid, nice) => writeln!(
            out,
            "setnice({}, {}) = {}",
            pid,
            nice,
            syscalls::sys_setnice(svc, pid, nice)
        )?,
        Command::Schedule => writeln!(out, "schedule() = {}", syscalls::sys_schedule(svc))?,
        Command::Dump => write!(out, "{}", svc.dump())?,
        Command::Stats => {
            writeln!(out, "{:?}", svc.get_system_stats())?;
            writeln!(out, "{:?}", svc.get_scheduler_stats())?
        }
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(cli.log_level.into());
    }

    let config = SchedConfig::new()
        .with_capacity(cli.capacity)
        .with_sched_latency(cli.latency)
        .with_min_granularity(cli.min_granularity);
    let mut svc = ProcessService::new(config);

    let init = syscalls::sys_init(&mut svc);
    if init < 0 {
        eprintln!("could not create init process (capacity {})", cli.capacity);
        return ExitCode::FAILURE;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if writeln!(out, "init pid {}", init).is_err() {
        return ExitCode::FAILURE;
    }

    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            return ExitCode::FAILURE;
        };
        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                eprintln!("{}", msg);
                continue;
            }
        };
        match run(&mut svc, command, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(_) => return ExitCode::FAILURE,
        }
    }

    ExitCode::SUCCESS
}
