// Entry point: headless terminal runner for the trial engine.
use std::io::BufRead;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mnemoscope::cli::Args;
use mnemoscope::config::AppConfig;
use mnemoscope::task::ports::{FeedbackSink, RenderSink, TomlStore};
use mnemoscope::task::rank::rank_for;
use mnemoscope::task::response::InputEvent;
use mnemoscope::task::session::{Mode, NumerositySubmode, Session};
use mnemoscope::task::stimulus::StimulusItem;
use mnemoscope::task::trial_engine::{Phase, Trial, TrialEngine};

enum HostEvent {
    Input(InputEvent),
    Quit,
}

/// Parse one line of console input into an event.
fn parse_line(line: &str) -> Option<HostEvent> {
    let line = line.trim().to_lowercase();
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let event = match head {
        "q" | "quit" => return Some(HostEvent::Quit),
        "s" | "same" => InputEvent::Same,
        "d" | "diff" | "different" => InputEvent::Different,
        "a" => InputEvent::ALarger,
        "b" => InputEvent::BLarger,
        "h" | "help" => InputEvent::ToggleHelp,
        "p" | "pause" => InputEvent::TogglePause,
        "r" | "reset" => InputEvent::ResetStats,
        "c" | "click" => {
            let x = parts.next()?.parse::<f32>().ok()?;
            let y = parts.next()?.parse::<f32>().ok()?;
            InputEvent::Pointer { x, y }
        }
        digit => InputEvent::Digit(digit.parse::<u8>().ok()?),
    };
    Some(HostEvent::Input(event))
}

/// Console frame sink: one line per phase change.
struct ConsoleRender;

impl ConsoleRender {
    fn describe(items: &[StimulusItem]) -> String {
        items
            .iter()
            .map(|item| match item {
                StimulusItem::Bar { angle_deg } => format!("bar {angle_deg:.0}°"),
                StimulusItem::ColoredBar { hue_deg, .. } => format!("hue {hue_deg:.0}°"),
                StimulusItem::GaborPatch { cycles } => format!("grating {cycles:.2}c"),
                StimulusItem::Shape { kind, .. } => format!("{kind:?}").to_lowercase(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl RenderSink for ConsoleRender {
    fn render(&mut self, phase: Phase, session: &Session, trial: Option<&Trial>) {
        match phase {
            Phase::Fix => println!("      +"),
            Phase::Mem | Phase::MemA => {
                if let Some(trial) = trial {
                    println!("  [memory] {}", Self::describe(&trial.memory));
                }
            }
            Phase::MemB => {
                if let Some(trial) = trial {
                    println!("  [array B] {}", Self::describe(&trial.test));
                }
            }
            Phase::SaccadeOn => {
                if let Some(target) = trial.and_then(|t| t.saccade_target) {
                    println!("  [target] at ({:.0}, {:.0})", target.x, target.y);
                }
            }
            Phase::Test => match (session.mode, session.submode) {
                (Mode::Numerosity, NumerositySubmode::Enumerate) => {
                    println!("  how many items? (4-10)")
                }
                (Mode::Numerosity, NumerositySubmode::Compare) => {
                    println!("  which array had more? (a/b)")
                }
                _ => {
                    if let Some(trial) = trial {
                        println!("  [test] {}", Self::describe(&trial.test));
                    }
                    println!("  same or different? (s/d)")
                }
            },
            _ => {}
        }
    }
}

/// Console stand-in for the audio feedback sink.
struct ConsoleFeedback;

impl FeedbackSink for ConsoleFeedback {
    fn on_correct(&mut self) {
        println!("  ✓ correct");
    }

    fn on_incorrect(&mut self) {
        println!("  ✗ incorrect");
    }

    fn on_rank_up(&mut self, rank: &str) {
        println!("  ★ rank up: {rank}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = AppConfig::load_or_default(&args.config);
    let store = TomlStore::open(&args.state);

    let mut engine = TrialEngine::new(
        cfg,
        args.seed,
        Box::new(ConsoleRender),
        Box::new(ConsoleFeedback),
        Box::new(store),
    );
    engine.set_task(
        args.mode.as_deref().map(Mode::from_str),
        args.submode.as_deref().map(NumerositySubmode::from_str),
    );
    info!(
        mode = engine.session().mode.as_str(),
        points = engine.session().points,
        rank = rank_for(engine.session().points),
        "session loaded"
    );

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_for_ctrlc = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_for_ctrlc.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let (tx, rx) = crossbeam_channel::unbounded::<HostEvent>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(event) = parse_line(&line) {
                if tx.send(event).is_err() {
                    break;
                }
            }
        }
    });

    let trial_target = if args.trials > 0 {
        Some(engine.session().trial_index + args.trials)
    } else {
        None
    };
    let started = Instant::now();

    loop {
        if stop_flag.load(Ordering::SeqCst) {
            break;
        }
        if trial_target.is_some_and(|t| engine.session().trial_index >= t) {
            break;
        }
        let now = started.elapsed().as_millis() as u64;
        if engine.phase() == Phase::Idle && !engine.is_paused() {
            engine.begin_trial(now);
        }
        let wait = match engine.next_deadline() {
            Some(deadline) => Duration::from_millis(deadline.saturating_sub(now)),
            // Paused or idle: just poll for input.
            None => Duration::from_millis(50),
        };
        match rx.recv_timeout(wait) {
            Ok(HostEvent::Input(event)) => {
                engine.handle_input(event, started.elapsed().as_millis() as u64);
            }
            Ok(HostEvent::Quit) => break,
            Err(RecvTimeoutError::Timeout) => {
                engine.on_timer(started.elapsed().as_millis() as u64);
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    engine.shutdown();
    let session = engine.session();
    println!(
        "session: {} trials, {} points, rank {}",
        session.trial_index,
        session.points,
        rank_for(session.points)
    );
}
