mod config;
mod error;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use moonraker::{Axes, Move, Printer};
use tracing::{Level, error, info, warn};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "moonraker.toml";

#[derive(Parser)]
#[command(name = "moonctl")]
#[command(about = "Query and drive a Klipper printer through Moonraker", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./moonraker.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Controller address, overriding the config file
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the printer and its tools as JSON
    Info,
    /// Print the machine status (idle, paused or processing)
    Status,
    /// Print the current XYZ position
    Coords,
    /// Print the loaded tool index
    Tool,
    /// Print tool offsets as read from the controller
    Offsets {
        /// Only this tool
        #[arg(short, long)]
        tool: Option<usize>,
    },
    /// Load a tool and wait for the change to finish
    Load {
        /// Tool index
        index: usize,
    },
    /// Unload the current tool
    Unload,
    /// Move the toolhead
    Move {
        /// Distances are relative to the current position
        #[arg(short, long)]
        relative: bool,
        /// Rapid move (G0)
        #[arg(long)]
        rapid: bool,
        /// Feedrate in mm/min
        #[arg(short, long, default_value_t = moonraker::gcode::DEFAULT_MOVE_SPEED, value_parser = parse_speed)]
        speed: f64,
        #[command(flatten)]
        axes: AxisArgs,
    },
    /// Apply new offsets to a tool
    SetOffset {
        /// Tool index
        #[arg(short, long)]
        tool: usize,
        #[command(flatten)]
        axes: AxisArgs,
    },
    /// Run a raw g-code command
    Gcode {
        /// Command words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },
    /// Wait for queued moves to finish (M400)
    Flush,
}

#[derive(Args)]
struct AxisArgs {
    #[arg(short = 'x', allow_hyphen_values = true, value_parser = parse_finite)]
    x: Option<f64>,
    #[arg(short = 'y', allow_hyphen_values = true, value_parser = parse_finite)]
    y: Option<f64>,
    #[arg(short = 'z', allow_hyphen_values = true, value_parser = parse_finite)]
    z: Option<f64>,
}

fn parse_finite(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{s}: {e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{s} is not a finite number"))
    }
}

fn parse_speed(s: &str) -> std::result::Result<f64, String> {
    match parse_finite(s)? {
        speed if speed > 0.0 => Ok(speed),
        _ => Err("feedrate must be greater than zero".into()),
    }
}

impl From<&AxisArgs> for Axes {
    fn from(args: &AxisArgs) -> Self {
        Axes {
            x: args.x,
            y: args.y,
            z: args.z,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        let code = e.exit_code();
        if code == 2 {
            warn!("{e}");
        } else {
            error!("{e}");
        }
        eprintln!("Error: {e}");
        std::process::exit(code);
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?.with_url(cli.url.clone());
    config.validate()?;

    info!(url = config.printer.base_url(), "connecting");
    let printer = Printer::connect(&config.printer)?;

    match &cli.command {
        Commands::Info => {
            let snapshot = printer.snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Status => println!("{}", printer.status()?),
        Commands::Coords => {
            let pos = printer.coordinates()?;
            println!("X{:.3} Y{:.3} Z{:.3}", pos.x, pos.y, pos.z);
        }
        Commands::Tool => match printer.current_tool()? {
            Some(index) => println!("T{index}"),
            None => println!("none"),
        },
        Commands::Offsets { tool } => cmd_offsets(&printer, *tool)?,
        Commands::Load { index } => {
            require_tool(&printer, *index)?;
            printer.load_tool(*index)?;
            println!("T{index} loaded");
        }
        Commands::Unload => {
            printer.unload_tools()?;
            println!("tools unloaded");
        }
        Commands::Move {
            relative,
            rapid,
            speed,
            axes,
        } => {
            let mv = Move::to(axes.into()).rapid(*rapid).speed(*speed);
            if *relative {
                printer.move_relative(&mv)?;
            } else {
                printer.move_absolute(&mv)?;
            }
            let pos = printer.coordinates()?;
            println!("X{:.3} Y{:.3} Z{:.3}", pos.x, pos.y, pos.z);
        }
        Commands::SetOffset { tool, axes } => {
            printer.set_tool_offsets(*tool, axes.into())?;
            let offset = printer.tool_offset(*tool)?;
            println!(
                "T{tool} offset X{:.3} Y{:.3} Z{:.3}",
                offset.x, offset.y, offset.z
            );
        }
        Commands::Gcode { command } => {
            printer.gcode(&command.join(" "))?;
            println!("ok");
        }
        Commands::Flush => {
            printer.flush_movement_buffer()?;
            println!("ok");
        }
    }

    Ok(())
}

fn cmd_offsets(printer: &Printer, tool: Option<usize>) -> Result<()> {
    let indices: Vec<usize> = match tool {
        Some(index) => {
            require_tool(printer, index)?;
            vec![index]
        }
        None => printer.tools().iter().map(|t| t.index).collect(),
    };

    if indices.is_empty() {
        println!("No tools found.");
        return Ok(());
    }

    println!("{:<6}  {:>10}  {:>10}  {:>10}", "TOOL", "X", "Y", "Z");
    println!("{}", "-".repeat(42));
    for index in indices {
        let offset = printer.tool_offset(index)?;
        println!(
            "{:<6}  {:>10.3}  {:>10.3}  {:>10.3}",
            format!("T{index}"),
            offset.x,
            offset.y,
            offset.z
        );
    }
    Ok(())
}

fn require_tool(printer: &Printer, index: usize) -> Result<()> {
    match printer.tool(index) {
        Some(_) => Ok(()),
        None => Err(Error::UnknownTool {
            index,
            count: printer.tools().len(),
        }),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) if !path.exists() => Err(Error::ConfigNotFound { path: path.clone() }),
        Some(path) => Ok(Config::load(path)?),
        None if PathBuf::from(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}
