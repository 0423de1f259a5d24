use amp_protocol::{DeviceSettings, Effect, Param};
use amp_remote::actor::{self, UiCommand, COMMAND_CAP, EVENT_CAP};
use amp_remote::session::STATUS_NO_NETWORK;
use amp_remote::{
    logging, AmpConfig, ConnectionError, ExchangeError, Session, SessionEvent,
};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "amp_cli")]
struct Args {
    /// Amplifier address (overrides AMP_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Amplifier port (overrides AMP_PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Print session events as JSON lines.
    #[arg(long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read the settings currently on the amplifier.
    Fetch,
    /// Read the current settings, change the given values, and send them back.
    Apply(ApplyArgs),
    /// Interactive session (toggle, set, send, show, quit).
    Repl,
}

#[derive(clap::Args, Debug)]
struct ApplyArgs {
    #[arg(long, value_enum)]
    tremolo: Option<Switch>,
    #[arg(long, value_enum)]
    echo: Option<Switch>,
    #[arg(long, value_enum)]
    distortion: Option<Switch>,

    /// Tremolo rate, 1-10 cps.
    #[arg(long)]
    rate: Option<f64>,
    /// Tremolo depth, 0-100 %.
    #[arg(long)]
    depth: Option<f64>,
    /// Echo delay, 1-1000 ms.
    #[arg(long, allow_negative_numbers = true)]
    delay: Option<f64>,
    /// Echo feedback, 0-95 %.
    #[arg(long)]
    feedback: Option<f64>,
    /// Distortion gain, 0-10 %.
    #[arg(long)]
    gain: Option<f64>,
    /// Distortion mix, 0-100 %.
    #[arg(long)]
    mix: Option<f64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Switch {
    On,
    Off,
}

impl ApplyArgs {
    fn effects(&self) -> [(Effect, Option<Switch>); 3] {
        [
            (Effect::Tremolo, self.tremolo),
            (Effect::Echo, self.echo),
            (Effect::Distortion, self.distortion),
        ]
    }

    fn params(&self) -> [(Param, Option<f64>); 6] {
        [
            (Param::Rate, self.rate),
            (Param::Depth, self.depth),
            (Param::Delay, self.delay),
            (Param::Feedback, self.feedback),
            (Param::Gain, self.gain),
            (Param::Mix, self.mix),
        ]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();
    let args = Args::parse();

    let mut config = AmpConfig::from_env();
    if let Some(host) = args.host.as_deref() {
        config.host = host.trim().to_string();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    debug!(?config, "starting");

    let mut session = Session::new(config.clone());
    if !session.is_network_available() {
        return exit_without_network(&config).await;
    }

    match args.command {
        Command::Fetch => press_send(&mut session, &config, args.json).await,
        Command::Apply(edits) => {
            press_send(&mut session, &config, args.json).await?;

            for (effect, switch) in edits.effects() {
                let Some(switch) = switch else { continue };
                if session.settings().flags().is_enabled(effect) != (switch == Switch::On) {
                    session.on_effect_toggled(effect);
                }
            }
            for (param, value) in edits.params() {
                if let Some(value) = value {
                    session.on_parameter_changed(param, value);
                }
            }

            if !session.settings().is_dirty() {
                eprintln!("nothing to change");
                return Ok(());
            }
            press_send(&mut session, &config, args.json).await
        }
        Command::Repl => run_repl(session, &config, args.json).await,
    }
}

async fn press_send(session: &mut Session, config: &AmpConfig, json: bool) -> anyhow::Result<()> {
    let result = session.on_send_pressed().await;
    print_event(&SessionEvent::from_outcome(&result), json)?;
    match result {
        Ok(_) => Ok(()),
        Err(ExchangeError::Connection(ConnectionError::NetworkUnavailable)) => {
            exit_without_network(config).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn exit_without_network(config: &AmpConfig) -> anyhow::Result<()> {
    eprintln!("{STATUS_NO_NETWORK} (no network detected, exiting)");
    tokio::time::sleep(config.exit_grace).await;
    std::process::exit(1);
}

async fn run_repl(session: Session, config: &AmpConfig, json: bool) -> anyhow::Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAP);
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CAP);
    let actor = tokio::spawn(actor::run(session, cmd_rx, event_tx));

    let exit_grace = config.exit_grace;
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let Err(e) = print_event(&event, json) {
                eprintln!("{e}");
            }
            if matches!(event, SessionEvent::NetworkUnavailable { .. }) {
                tokio::time::sleep(exit_grace).await;
                std::process::exit(1);
            }
        }
    });

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Some(cmd)) => {
                let quit = cmd == UiCommand::Shutdown;
                if cmd_tx.send(cmd).await.is_err() || quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(msg) => eprintln!("{msg}"),
        }
    }

    drop(cmd_tx);
    actor.await?;
    printer.await?;
    Ok(())
}

fn parse_command(line: &str) -> Result<Option<UiCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    match verb.to_ascii_lowercase().as_str() {
        "toggle" => {
            let effect: Effect = words.next().ok_or("usage: toggle <effect>")?.parse()?;
            Ok(Some(UiCommand::ToggleEffect(effect)))
        }
        "set" => {
            let param: Param = words.next().ok_or("usage: set <param> <value>")?.parse()?;
            let raw = words.next().ok_or("usage: set <param> <value>")?;
            let value: f64 = raw
                .parse()
                .map_err(|_| format!("not a number: {raw}"))?;
            Ok(Some(UiCommand::SetParameter(param, value)))
        }
        "send" => Ok(Some(UiCommand::SendPressed)),
        "show" => Ok(Some(UiCommand::Snapshot)),
        "quit" | "exit" => Ok(Some(UiCommand::Shutdown)),
        "help" => {
            print_help();
            Ok(None)
        }
        other => Err(format!("unknown command: {other} (try help)")),
    }
}

fn print_help() {
    eprintln!("commands:");
    eprintln!("  toggle <tremolo|echo|distortion>");
    eprintln!("  set <rate|depth|delay|feedback|gain|mix> <value>");
    eprintln!("  send   (press again while busy to disconnect)");
    eprintln!("  show");
    eprintln!("  quit");
}

fn print_event(event: &SessionEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        SessionEvent::Settings {
            settings, dirty, ..
        } => {
            print_settings(settings);
            if *dirty {
                println!("  (unsent changes)");
            }
        }
        SessionEvent::ExchangeSucceeded { settings, notice } => {
            println!("{notice}");
            print_settings(settings);
        }
        SessionEvent::ExchangeFailed { reason, notice } => {
            eprintln!("{notice}: {reason}");
        }
        SessionEvent::NetworkUnavailable { notice } => {
            eprintln!("{notice}");
        }
        SessionEvent::Disconnected => {
            println!("disconnected");
        }
    }
    Ok(())
}

fn print_settings(settings: &DeviceSettings) {
    for effect in Effect::ALL {
        let mark = if settings.flags.is_enabled(effect) { "x" } else { " " };
        println!("  [{mark}] {effect}");
    }
    for (param, value) in settings.params.iter() {
        println!("      {}", param.label(value));
    }
}
