//! Binary entrypoint for the idledice CLI.
//!
//! Commands:
//! - `init` - write a starter `idledice.toml` and create the data directory
//! - `status` - print balances, dice and prestige progress
//! - `roll [--count <n>]` - roll every owned die and save
//! - `buy <dice-id>` - buy one die at its current price
//! - `upgrade` - buy the next dice value upgrade
//! - `prestige` - ascend, trading this run's money for Dark Matter
//! - `run [--seconds <s>]` - idle-roll each tick (1s scaled by the idle cooldown) with autosave
//!
//! See the library crate docs for module-level details: `idledice::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::str::FromStr;
use std::time::Duration;

use idledice::config::{Config, DiceSpec};
use idledice::economy::{format_amount, format_currency, CurrencyKind, DiceTypeId, GameError};
use idledice::handle::GameHandle;
use idledice::storage::autosave::AutosaveScheduler;
use idledice::storage::LoadOutcome;

/// Idle tick period before the idle cooldown knob is applied.
const IDLE_TICK: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "idledice")]
#[command(about = "Progression and persistence engine for an idle dice game")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "idledice.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show balances and prestige progress
    Status,
    /// Roll owned dice manually
    Roll {
        /// Number of rolls
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Buy one die
    Buy {
        /// Dice type id from the catalog (e.g. basic, silver)
        id: String,
    },
    /// Buy the next dice value upgrade
    Upgrade,
    /// Reset this run for Dark Matter
    Prestige,
    /// Idle-roll in the foreground with autosave
    Run {
        /// Stop after this many seconds (runs until Ctrl-C when omitted)
        #[arg(short, long)]
        seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        let config = Config::default();
        tokio::fs::create_dir_all(&config.storage.data_dir).await?;
        info!("Configuration file created at {}", cli.config);
        println!("Wrote {} (saves go to {})", cli.config, config.storage.save_path().display());
        return Ok(());
    }

    let config = match Config::load(&cli.config).await {
        Ok(c) => c,
        Err(e) if !std::path::Path::new(&cli.config).exists() => {
            init_logging(&None, cli.verbose);
            warn!("{} (using built-in defaults)", e);
            Config::default()
        }
        Err(e) => return Err(e),
    };
    init_logging(&Some(config.clone()), cli.verbose);

    let (game, outcome) = GameHandle::bootstrap(&config)?;
    if let LoadOutcome::Quarantined { reason, moved_to } = &outcome {
        match moved_to {
            Some(path) => println!("Save was unusable ({}); moved to {}", reason, path.display()),
            None => println!("Save was unusable ({})", reason),
        }
    }

    match cli.command {
        Commands::Init => {}
        Commands::Status => {
            print_status(&game, &config);
            return Ok(());
        }
        Commands::Roll { count } => {
            for _ in 0..count.max(1) {
                let reward = game.roll_owned_dice(false);
                println!(
                    "Rolled {}{}",
                    format_currency(reward.money, CurrencyKind::Money),
                    if reward.jackpot { " (jackpot!)" } else { "" }
                );
            }
        }
        Commands::Buy { id } => {
            let id = DiceTypeId::from(id);
            match game.try_buy_dice_type(&id) {
                Ok(purchase) => println!(
                    "Bought {} for {} (now own {})",
                    purchase.id,
                    format_amount(purchase.price),
                    purchase.owned
                ),
                Err(e) => report(e),
            }
        }
        Commands::Upgrade => match game.try_buy_value_upgrade() {
            Ok(level) => println!("Dice value upgrade level {}", level),
            Err(e) => report(e),
        },
        Commands::Prestige => match game.try_prestige() {
            Ok(receipt) => println!(
                "Ascended to level {} and gained {}",
                receipt.new_level,
                format_currency(receipt.dark_matter_awarded, CurrencyKind::DarkMatter)
            ),
            Err(e) => report(e),
        },
        Commands::Run { seconds } => run(&game, &config, seconds).await,
    }

    game.save_now().await?;
    Ok(())
}

async fn run(game: &GameHandle, config: &Config, seconds: Option<u64>) {
    let autosave = AutosaveScheduler::new(config.autosave.clone()).spawn(game.clone());
    let deadline = seconds.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));
    info!("Idle loop started");

    loop {
        // Re-read every tick so cooldown upgrades take effect immediately.
        let period = game.with_engine(|e| e.modifiers().idle_cooldown(IDLE_TICK));
        tokio::select! {
            _ = tokio::time::sleep(period) => {
                game.roll_owned_dice(true);
                if deadline.map_or(false, |d| tokio::time::Instant::now() >= d) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, saving");
                break;
            }
        }
    }

    if let Some(task) = autosave {
        task.abort();
    }
    let status = game.status();
    println!(
        "Money {} (lifetime {})",
        format_amount(status.money),
        format_amount(status.lifetime_money)
    );
}

fn report(err: GameError) {
    println!("Not done: {}", err);
}

fn print_status(game: &GameHandle, config: &Config) {
    let status = game.status();
    println!("Idle Dice Status:");
    println!("  Save: {}", config.storage.save_path().display());
    println!(
        "  Money: {} (lifetime {})",
        format_amount(status.money),
        format_amount(status.lifetime_money)
    );
    println!("  Dark Matter: {}", format_amount(status.dark_matter));
    println!("  Time Shards: {}", format_amount(status.time_shards));
    println!("  Dice value upgrade: level {}", status.dice_value_upgrade_level);
    println!("  Dice:");
    for spec in &config.dice {
        let id = DiceTypeId::from(spec.id.as_str());
        let owned = status
            .owned_dice
            .iter()
            .find(|(owned_id, _)| *owned_id == id)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        println!("    {}", describe_die(game, spec, &id, owned));
    }
    println!(
        "  Prestige: level {} ({:?}), next at {} lifetime money, reward {}",
        status.prestige.level,
        status.phase,
        format_amount(status.required_lifetime_money),
        format_amount(status.potential_reward)
    );
}

fn describe_die(game: &GameHandle, spec: &DiceSpec, id: &DiceTypeId, owned: u32) -> String {
    let (unlocked, price) =
        game.with_engine(|e| (e.progression().is_dice_unlocked(id), e.current_price(id)));
    match price {
        Ok(_) if !unlocked => format!("{:<12} locked", spec.name),
        Ok(price) => format!(
            "{:<12} owned {:>4}  next {}",
            spec.name,
            owned,
            format_amount(price)
        ),
        Err(e) => format!("{:<12} {}", spec.name, e),
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|c| log::LevelFilter::from_str(&c.logging.level).ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    let file = config.as_ref().and_then(|c| c.logging.file.clone());
    let sink = file.and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| eprintln!("cannot open log file {}: {}", path, e))
            .ok()
    });

    match sink {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only when someone is watching
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
