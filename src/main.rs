//! catrock — play and inspect `.crock` music files.

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, execute};
use tracing_subscriber::EnvFilter;

use catrock::config::PlayerConfig;
use catrock::dsl::Compiler;
use catrock::io::{MemoryDevice, MidiOutputDevice, MidiSink};
use catrock::play::{CancelToken, PlayEngine, PlaybackError, PlaybackHandle};
use catrock::score::{is_valid_tempo, EventStats, Score};

const EXTENSION: &str = "crock";

#[derive(Parser)]
#[command(name = "catrock", version)]
#[command(about = "Compile and play catrock music files over MIDI", long_about = None)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a file and play it on a MIDI output
    Play(PlayArgs),
    /// Show the stages of compiling a file
    Debug(DebugArgs),
    /// List MIDI output ports
    Devices,
}

#[derive(Args)]
struct PlayArgs {
    /// Source file (.crock)
    file: PathBuf,

    /// Tempo in BPM, replacing the score's
    #[arg(short, long, value_parser = parse_tempo)]
    tempo: Option<f64>,

    /// Note velocity 0-127, replacing the score's volume
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    volume: Option<u8>,

    /// Run without a MIDI device and report what would be sent
    #[arg(long)]
    dry_run: bool,

    /// Print the syntax tree before playing
    #[arg(long)]
    show_ast: bool,

    /// Print every event before playing
    #[arg(long)]
    show_events: bool,

    /// MIDI output to use (substring of the port name)
    #[arg(short, long)]
    device: Option<String>,
}

#[derive(Args)]
struct DebugArgs {
    /// Source file (.crock)
    file: PathBuf,

    /// Print the token stream
    #[arg(long)]
    tokens: bool,

    /// Print the syntax tree
    #[arg(long)]
    ast: bool,

    /// Print the sorted events and their statistics
    #[arg(long)]
    events: bool,

    /// Print the compiled score
    #[arg(long)]
    score: bool,

    /// Print events as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = PlayerConfig::load().unwrap_or_default();
    init_logging(cli.verbose, config.log_level.as_deref());

    let result = match cli.command {
        Command::Play(args) => play(args, &config),
        Command::Debug(args) => debug(args),
        Command::Devices => {
            devices();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, configured: Option<&str>) {
    let fallback = if verbose {
        "debug"
    } else {
        configured.unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_tempo(s: &str) -> Result<f64, String> {
    let bpm: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if !is_valid_tempo(bpm) {
        return Err(format!("tempo must be a positive number, got {bpm}"));
    }
    Ok(bpm)
}

fn read_source(path: &Path) -> Result<String, Box<dyn Error>> {
    if !path.exists() {
        return Err(format!("{} does not exist", path.display()).into());
    }
    if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        return Err(format!("{} is not a .{EXTENSION} file", path.display()).into());
    }
    Ok(std::fs::read_to_string(path)?)
}

fn play(args: PlayArgs, config: &PlayerConfig) -> Result<(), Box<dyn Error>> {
    let source = read_source(&args.file)?;

    if args.show_ast {
        println!("{}", Compiler::parse(&source)?);
    }

    let mut score = Compiler::compile(&source)?;
    score.volume = config.volume_or(args.volume, score.volume);
    let bpm = config.tempo_or(args.tempo, score.bpm);
    if !is_valid_tempo(bpm) {
        return Err(PlaybackError::InvalidTempo(bpm).into());
    }
    let events = score.events();

    print_summary(&args.file, &score, bpm, events.len());

    if args.show_events {
        for event in &events {
            println!("  {event}");
        }
    }

    if args.dry_run {
        let mut device = MemoryDevice::connected();
        let stats = PlayEngine::immediate(bpm).play(&mut device, &events, &CancelToken::new())?;
        println!("{} {stats} (dry run)", "✓".green());
        return Ok(());
    }

    let mut device = MidiOutputDevice::new(config.device_or(args.device));
    device.connect()?;
    println!(
        "{} {}",
        "output:".dim(),
        device.port_name().unwrap_or("unknown")
    );

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }

    let handle = PlayEngine::new(bpm).play_async(device, events, cancel);
    show_progress(&handle);
    let outcome = handle.wait();

    if let Some(mut device) = outcome.sink {
        device.disconnect()?;
    }

    match outcome.result {
        Ok(stats) => {
            println!("{} {stats}", "✓".green());
            Ok(())
        }
        Err(PlaybackError::Cancelled { dispatched }) => {
            println!("{} stopped after {dispatched} events", "■".yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(file: &Path, score: &Score, bpm: f64, event_count: usize) {
    let beats = score.duration();
    println!(
        "{} {}  {} BPM  {} beats ({:.1}s)  {} events",
        "♪".cyan(),
        file.display().to_string().bold(),
        bpm,
        beats,
        beats.to_duration(bpm).as_secs_f64(),
        event_count
    );
}

fn show_progress<S>(handle: &PlaybackHandle<S>) {
    let mut stdout = io::stdout();
    while !handle.is_finished() {
        let _ = execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
        print!(
            "{} {}/{} events  {:.1}s / {:.1}s",
            "▶".green(),
            handle.progress(),
            handle.total(),
            handle.elapsed().as_secs_f64(),
            handle.length().as_secs_f64()
        );
        let _ = stdout.flush();
        thread::sleep(Duration::from_millis(100));
    }
    let _ = execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
}

fn debug(args: DebugArgs) -> Result<(), Box<dyn Error>> {
    let source = read_source(&args.file)?;
    let nothing_selected = !(args.tokens || args.ast || args.events || args.score || args.json);

    if args.tokens {
        println!("{}", "Tokens".bold());
        for token in Compiler::tokenize(&source) {
            println!(
                "  {:>4}:{:<3} {:<10} {:?}",
                token.line,
                token.col,
                token.kind.name(),
                token.literal
            );
        }
    }

    if args.ast {
        let (ast, diagnostics) = Compiler::parse_partial(&source);
        println!("{}", "AST".bold());
        print!("{ast}");
        for d in &diagnostics {
            println!("  {} {d}", "!".red());
        }
    }

    if !(args.events || args.score || args.json || nothing_selected) {
        return Ok(());
    }

    let score = Compiler::compile(&source)?;
    let events = score.events();

    if args.score || nothing_selected {
        print!("{score}");
    }
    if args.events || nothing_selected {
        println!("{}", "Events".bold());
        for event in &events {
            println!("  {event}");
        }
        println!("{}", EventStats::from_events(&events));
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    }
    Ok(())
}

fn devices() {
    let ports = MidiOutputDevice::list_devices();
    if ports.is_empty() {
        println!("no MIDI output ports found");
        return;
    }
    for (i, name) in ports.iter().enumerate() {
        println!("  {i}: {name}");
    }
}
