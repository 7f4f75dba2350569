use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use focuser_link::{available_port_names, FocuserLink};
use focuser_proto::{CoarseMultiplier, Direction, MicrostepDivisor};
use focuser_store::{ConfigStore, MotorConfig};

mod session;
use session::Session;

#[derive(Debug, Parser)]
#[command(name = "focuser", version, about = "Telescope focuser drive controller")]
struct Cli {
    /// Motor config record; created with defaults on first run.
    #[arg(long, default_value = "focuser.toml")]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List serial ports that may host the focuser drive.
    Ports,
    /// Validate the config record and the serial environment.
    Doctor {
        /// Also check that this port is present.
        #[arg(long)]
        port: Option<String>,
    },
    /// Show or change the persisted motor configuration.
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
    /// Issue relative moves and exit.
    Move {
        #[arg(long)]
        port: String,

        /// Travel direction.
        #[arg(long, value_enum)]
        dir: DirArg,

        /// Operator ticks to issue.
        #[arg(long, default_value_t = 1)]
        ticks: u32,

        /// One microstep per tick, ignoring the multiplier.
        #[arg(long)]
        fine: bool,

        /// Coarse multiplier: 1, 5 or 10.
        #[arg(long, default_value_t = 1)]
        multiplier: u16,
    },
    /// Drive the focuser interactively from the keyboard.
    Jog {
        #[arg(long)]
        port: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCmd {
    /// Print the persisted record and derived values.
    Show,
    /// Apply new motor constants and re-persist immediately.
    Set {
        #[arg(long)]
        steps_per_rev: Option<u32>,

        /// Microstep divisor: 1, 2, 4, 8, 16 or 32.
        #[arg(long)]
        divisor: Option<u16>,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum DirArg {
    /// Rack the drawtube outward.
    Out,
    /// Rack the drawtube inward.
    In,
}

impl From<DirArg> for Direction {
    fn from(dir: DirArg) -> Self {
        match dir {
            DirArg::Out => Self::Out,
            DirArg::In => Self::In,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let store = ConfigStore::new(&cli.config);

    match cli.cmd {
        Command::Ports => ports(),
        Command::Doctor { port } => doctor(&store, port.as_deref()),
        Command::Config { cmd } => config_cmd(&store, cmd),
        Command::Move {
            port,
            dir,
            ticks,
            fine,
            multiplier,
        } => one_shot_move(&store, &port, dir.into(), ticks, fine, multiplier).await,
        Command::Jog { port } => jog(&store, &port).await,
    }
}

fn ports() -> Result<()> {
    let names = available_port_names()?;
    if names.is_empty() {
        println!("no serial ports found");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn doctor(store: &ConfigStore, port: Option<&str>) -> Result<()> {
    info!("doctor: starting");

    let config = store.load().context("motor config")?;
    println!("config: {}", store.path().display());
    print_config(&config);

    let names = available_port_names()?;
    if names.is_empty() {
        println!("ports: none");
    } else {
        println!("ports: {}", names.join(", "));
    }
    if let Some(dev) = port {
        anyhow::ensure!(names.iter().any(|n| n == dev), "port {dev} not present");
        println!("port {dev}: present");
    }

    info!("doctor: OK");
    Ok(())
}

fn config_cmd(store: &ConfigStore, cmd: ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Show => {
            let config = store.load_or_reset()?;
            print_config(&config);
        }
        ConfigCmd::Set {
            steps_per_rev,
            divisor,
        } => {
            let mut config = store.load_or_reset()?;
            if let Some(steps) = steps_per_rev {
                anyhow::ensure!(steps > 0, "steps-per-rev must be positive");
                config.steps_per_revolution = steps;
            }
            if let Some(raw) = divisor {
                config.microstep_divisor = MicrostepDivisor::try_from(raw)?;
            }
            store.save(&config).context("persist motor config")?;
            info!(path = %store.path().display(), "motor config saved");
            print_config(&config);
        }
    }
    Ok(())
}

fn print_config(config: &MotorConfig) {
    println!("  steps/rev: {}", config.steps_per_revolution);
    println!(
        "  microstep divisor: {} ({})",
        config.microstep_divisor.code(),
        config.microstep_divisor
    );
    println!("  microsteps/rev: {}", config.microsteps_per_revolution());
    println!("  degrees/microstep: {:.5}", config.degrees_per_microstep());
}

async fn one_shot_move(
    store: &ConfigStore,
    dev: &str,
    direction: Direction,
    ticks: u32,
    fine: bool,
    multiplier: u16,
) -> Result<()> {
    let Some(multiplier) = CoarseMultiplier::from_value(multiplier) else {
        bail!("multiplier must be 1, 5 or 10");
    };

    let config = store.load_or_reset()?;
    let mut session = Session::new(config);
    session.set_multiplier(multiplier);
    session.set_fine(fine);

    let mut link = FocuserLink::open(dev)?;
    for _ in 0..ticks {
        let cmd = session.tick(direction);
        link.send_move(&cmd).await?;
    }
    info!(ticks, microsteps_per_tick = session.step_count(), "move complete");
    link.close();
    Ok(())
}

async fn jog(store: &ConfigStore, dev: &str) -> Result<()> {
    let config = store.load_or_reset()?;
    let mut session = Session::new(config);
    let mut link = FocuserLink::open(dev)?;

    println!("jogging {dev}: + out, - in, f fine, x multiplier, p position, r reload config, q quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "+" => {
                let cmd = session.tick(Direction::Out);
                link.send_move(&cmd).await?;
                print_position(&session);
            }
            "-" => {
                let cmd = session.tick(Direction::In);
                link.send_move(&cmd).await?;
                print_position(&session);
            }
            "f" => {
                session.set_fine(!session.fine());
                println!("fine: {}", if session.fine() { "on" } else { "off" });
            }
            "x" => {
                let multiplier = session.cycle_multiplier();
                println!(
                    "multiplier: x{} ({} microsteps/tick)",
                    multiplier.value(),
                    session.step_count()
                );
            }
            "p" => print_position(&session),
            "r" => {
                session.apply_config(store.load_or_reset()?);
                println!("config reloaded");
                print_config(session.config());
            }
            "q" => break,
            "" => {}
            other => println!("unknown input {other:?}"),
        }
    }
    link.close();
    Ok(())
}

fn print_position(session: &Session) {
    println!(
        "position: {} microsteps ({:.3} deg)",
        session.position(),
        session.angle_degrees()
    );
}
