mod play;
mod view;

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use becom_contracts::chat::{parse_intent, Intent, CHAT_HELP_COMMANDS};
use becom_contracts::domain::{CreativeInput, CreativeInputCapture};
use becom_contracts::events::EventWriter;
use becom_contracts::schema::ContractKind;
use becom_contracts::session::{transition, SessionEvent, Stage};
use becom_engine::{build_service, EngineConfig, SessionDriver};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use play::{MissionPlay, PlayProgress};

#[derive(Debug, Parser)]
#[command(name = "becom-rs", version, about = "Becom.AI career discovery in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Session(SessionArgs),
    CheckContracts,
}

#[derive(Debug, Parser)]
struct SessionArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    text_model: Option<String>,
    #[arg(long)]
    image_model: Option<String>,
    /// Offline text and image backends.
    #[arg(long)]
    dryrun: bool,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("becom-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Session(args) => {
            run_session(args)?;
            Ok(0)
        }
        Command::CheckContracts => {
            for kind in ContractKind::ALL {
                let contract = kind.contract();
                println!("# {}", contract.name());
                println!("{}", serde_json::to_string_pretty(&contract.to_response_schema())?);
            }
            Ok(0)
        }
    }
}

/// Keyboard dream capture: `/draw` stages a PNG, `/dream` supplies the words.
#[derive(Debug, Default)]
struct TerminalCapture {
    text: String,
    drawing: Option<Vec<u8>>,
}

impl TerminalCapture {
    fn attach_drawing(&mut self, path: &Path) -> Result<usize> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let size = bytes.len();
        self.drawing = Some(bytes);
        Ok(size)
    }
}

impl CreativeInputCapture for TerminalCapture {
    fn capture(&mut self) -> Result<CreativeInput> {
        Ok(CreativeInput {
            text: std::mem::take(&mut self.text).trim().to_string(),
            drawing: self.drawing.take(),
        })
    }
}

struct Console {
    driver: SessionDriver<StdRng>,
    capture: TerminalCapture,
    play: Option<MissionPlay>,
}

impl Console {
    fn dispatch(&mut self, event: SessionEvent) -> Result<()> {
        let preview = transition(self.driver.session(), event.clone());
        if let Some(message) = preview.session.loading_message() {
            println!("{message}");
        }
        self.driver.dispatch(event)?;
        self.sync_play();
        self.show();
        Ok(())
    }

    fn sync_play(&mut self) {
        if self.driver.session().stage == Stage::InMission {
            self.play.get_or_insert_with(MissionPlay::default);
        } else {
            self.play = None;
        }
    }

    fn show(&self) {
        let round = self.play.as_ref().map(MissionPlay::current_round);
        print!("{}", view::render(self.driver.session(), round));
    }

    /// The staged drawing is only consumed once a dream is actually expected.
    fn submit_dream(&mut self, text: &str) -> Result<()> {
        if self.driver.session().stage != Stage::DreamInput {
            println!("Not ready for a dream yet. Type /show to see what comes next.");
            return Ok(());
        }
        self.capture.text = text.to_string();
        let input = self.capture.capture()?;
        self.dispatch(SessionEvent::DreamSubmitted(input))
    }

    fn answer(&mut self, ids: Vec<String>) -> Result<()> {
        let Some(mission) = self.driver.session().mission.clone() else {
            println!("There is no mission to play right now.");
            return Ok(());
        };
        let Some(play) = self.play.as_mut() else {
            println!("There is no mission to play right now.");
            return Ok(());
        };
        match play.answer(&mission, &ids) {
            Some(PlayProgress::NextRound { succeeded }) => {
                println!("{}", if succeeded { "Great job!" } else { "Nice try!" });
                self.show();
                Ok(())
            }
            Some(PlayProgress::Finished(results)) => {
                self.dispatch(SessionEvent::MissionCompleted(results))
            }
            None => Ok(()),
        }
    }

    fn export_plan(&self, path: &Path) -> Result<()> {
        let Some(plan) = self.driver.session().plan.as_ref() else {
            println!("No plan yet. Finish a mission and ask for one with /plan.");
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(plan)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        self.driver.events().emit_value(
            "plan_exported",
            serde_json::json!({ "path": path.to_string_lossy() }),
        )?;
        println!("Plan saved to {}", path.display());
        Ok(())
    }

    /// Plain text means whatever the current stage is waiting for.
    fn text_input(&mut self, text: &str) -> Result<()> {
        match self.driver.session().stage {
            Stage::AgeInput => match text.parse::<u8>() {
                Ok(age) => self.dispatch(SessionEvent::AgeSubmitted(age)),
                Err(_) => {
                    println!("Please type your age as a number.");
                    Ok(())
                }
            },
            Stage::DreamInput => self.submit_dream(text),
            Stage::Results => match parse_choice(text) {
                Some(idx) => self.dispatch(SessionEvent::CareerSelected(idx)),
                None => self.hint(),
            },
            Stage::InStory => match parse_choice(text) {
                Some(idx) => self.dispatch(SessionEvent::ChoiceMade(idx)),
                None => self.hint(),
            },
            Stage::InMission => {
                let ids = text
                    .replace(',', " ")
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                self.answer(ids)
            }
            _ => self.hint(),
        }
    }

    fn hint(&self) -> Result<()> {
        println!("Type /help for commands.");
        Ok(())
    }

    fn handle(&mut self, intent: &Intent) -> Result<bool> {
        match intent.action.as_str() {
            "help" => println!("Commands: {}", CHAT_HELP_COMMANDS.join(" ")),
            "quit" => return Ok(false),
            "set_age" => {
                let age = intent
                    .arg_u64("number")
                    .and_then(|value| u8::try_from(value).ok())
                    .unwrap_or(u8::MAX);
                self.dispatch(SessionEvent::AgeSubmitted(age))?;
            }
            "attach_drawing" => {
                let path = PathBuf::from(intent.arg_str("path").unwrap_or_default());
                match self.capture.attach_drawing(&path) {
                    Ok(size) => println!("Drawing attached ({size} bytes)."),
                    Err(err) => println!("Could not attach drawing: {err:#}"),
                }
            }
            "dream" => {
                let text = intent.prompt.clone().unwrap_or_default();
                self.submit_dream(&text)?;
            }
            "pick_career" => {
                let idx = number_to_index(intent.arg_u64("number"));
                self.dispatch(SessionEvent::CareerSelected(idx))?;
            }
            "choose" => {
                let idx = number_to_index(intent.arg_u64("number"));
                self.dispatch(SessionEvent::ChoiceMade(idx))?;
            }
            "play" | "show" => self.show(),
            "answer" => self.answer(intent.arg_list("ids"))?,
            "request_plan" => self.dispatch(SessionEvent::PlanRequested)?,
            "back_to_map" => self.dispatch(SessionEvent::BackToGrowthMap)?,
            "start_over" => {
                self.capture = TerminalCapture::default();
                self.dispatch(SessionEvent::StartOver)?;
            }
            "export" => {
                let path = PathBuf::from(intent.arg_str("path").unwrap_or_default());
                self.export_plan(&path)?;
            }
            "text" => {
                let text = intent.prompt.clone().unwrap_or_default();
                self.text_input(&text)?;
            }
            "invalid" => println!(
                "{}",
                intent.arg_str("reason").unwrap_or("Invalid command.")
            ),
            "unknown" => println!(
                "Unknown command /{}. Type /help for commands.",
                intent.arg_str("command").unwrap_or_default()
            ),
            _ => {}
        }
        Ok(true)
    }
}

/// Users count from 1.
fn number_to_index(number: Option<u64>) -> usize {
    number
        .and_then(|value| usize::try_from(value).ok())
        .and_then(|value| value.checked_sub(1))
        .unwrap_or(usize::MAX)
}

fn parse_choice(text: &str) -> Option<usize> {
    text.trim()
        .parse::<u64>()
        .ok()
        .map(|value| number_to_index(Some(value)))
}

fn run_session(args: SessionArgs) -> Result<()> {
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let session_id = uuid::Uuid::new_v4().to_string();

    let mut config = if args.dryrun {
        EngineConfig::dryrun()
    } else {
        EngineConfig::default()
    };
    if args.text_model.is_some() {
        config.text_model = args.text_model.clone();
    }
    if args.image_model.is_some() {
        config.image_model = args.image_model.clone();
    }
    let service = build_service(&config)?;
    let events = EventWriter::new(&events_path, session_id.clone());
    let driver = SessionDriver::new(service, events, StdRng::from_entropy())?;
    info!(session_id = %session_id, events = %events_path.display(), "session started");

    let mut console = Console {
        driver,
        capture: TerminalCapture::default(),
        play: None,
    };

    println!("Becom.AI session started. Type /help for commands.");
    console.show();

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let intent = parse_intent(line.trim_end_matches(['\n', '\r']));
        if intent.action == "noop" {
            continue;
        }
        if !console.handle(&intent)? {
            break;
        }
    }

    console.driver.finish()?;
    Ok(())
}
