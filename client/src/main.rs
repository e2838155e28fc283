mod config;
mod console;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use tictactoe_common::games::tictactoe::{
    Difficulty, GameController, GameEvent, GameMode, GameRunner, GameUpdate, Mark,
};
use tictactoe_common::id_generator::generate_room_code;
use tictactoe_common::sync::{Inbox, SyncProtocol, TcpTransport, Transport};
use tictactoe_common::{RoomId, log, log_error, logger};

use config::{ClientConfig, ModeConfig, get_config_manager};
use console::{ConsoleCommand, help_text, parse_command, render_update};

#[derive(Parser)]
#[command(name = "tictactoe_client")]
struct Args {
    #[arg(long, value_enum)]
    mode: Option<ModeConfig>,

    /// easy, medium or hard
    #[arg(long)]
    difficulty: Option<Difficulty>,

    /// Mark played by the human in player-vs-computer mode.
    #[arg(long)]
    human_mark: Option<Mark>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long, conflicts_with = "create_room")]
    room: Option<String>,

    /// Generate a fresh room code to share with the other player.
    #[arg(long)]
    create_room: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    use_log_prefix: bool,
}

impl Args {
    fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(mode) = self.mode {
            config.game.mode = mode;
        }
        if let Some(difficulty) = self.difficulty {
            config.game.difficulty = difficulty;
        }
        if let Some(mark) = self.human_mark {
            config.game.human_mark = mark;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if self.port.is_some() {
            config.server.port = self.port;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Client".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let mut config = get_config_manager(args.config.clone()).get_config()?;
    args.apply_to(&mut config);

    let mode = match config.game.mode {
        ModeConfig::PlayerVsComputer => GameMode::PlayerVsComputer {
            human: config.game.human_mark,
            difficulty: config.game.difficulty,
        },
        ModeConfig::PlayerVsPlayer => GameMode::PlayerVsPlayer,
        ModeConfig::Online => GameMode::Online,
    };

    let controller = match config.seed {
        Some(seed) => GameController::with_seed(mode, seed),
        None => GameController::new(mode),
    };

    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let mut runner = GameRunner::new(controller, update_tx);

    if mode == GameMode::Online {
        let room = match (&args.room, args.create_room) {
            (Some(room), _) => RoomId::from(room.as_str()),
            (None, true) => {
                let room = generate_room_code();
                log!("Created room {}, share this code with your opponent", room);
                room
            }
            (None, false) => {
                return Err("online mode needs --room <CODE> or --create-room".into());
            }
        };

        let inbox = Arc::new(Inbox::new());
        let settings = config.online.settings();
        let address = config.server.address();
        let transport = TcpTransport::connect(&address, inbox.clone(), settings.handshake_timeout).await?;
        let transport: Box<dyn Transport> = Box::new(transport);
        let sync = SyncProtocol::join(room, transport, inbox)?;

        runner = runner.with_sync(sync, settings);
        println!("Waiting for the server to assign a mark...");
    }

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let runner_handle = tokio::spawn(runner.run(event_rx));

    println!("{}", help_text());

    let mut lines = spawn_stdin_reader();
    let mut local_mark = None;
    let mut input_closed = false;

    loop {
        tokio::select! {
            update = update_rx.recv() => {
                let Some(update) = update else {
                    break;
                };
                if let GameUpdate::MarkAssigned(mark) = update {
                    local_mark = Some(mark);
                }
                println!("{}", render_update(&update, local_mark));
                if update == GameUpdate::Closed {
                    break;
                }
            }
            line = lines.recv(), if !input_closed => {
                let event = match line {
                    Some(Ok(line)) => match parse_command(&line) {
                        Ok(ConsoleCommand::Event(event)) => event,
                        Ok(ConsoleCommand::Help) => {
                            println!("{}", help_text());
                            continue;
                        }
                        Ok(ConsoleCommand::Quit) => GameEvent::ReturnToMenu,
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    },
                    None => {
                        input_closed = true;
                        GameEvent::ReturnToMenu
                    }
                    Some(Err(e)) => {
                        log_error!("Failed to read input: {}", e);
                        GameEvent::ReturnToMenu
                    }
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        }
    }

    if let Err(e) = runner_handle.await {
        log_error!("Game runner failed: {}", e);
    }
    log!("Client shut down");

    Ok(())
}

/// Terminal input is read on a plain thread so a pending read never holds
/// up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });
    line_rx
}
