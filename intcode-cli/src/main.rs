//! Intcode CLI - Command line interface
//!
//! Runs a single tape or boots a network of machines on the same tape.
//! Configuration comes from an optional JSON file, overridden by flags.

use clap::{Args, Parser, Subcommand};
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

mod config;
mod logging;
mod platform;

use crate::config::{to_log_level, CliConfig, LogConfig};
use crate::logging::{init_with_file, LogFormat, TracingSink};
use crate::platform::{print_error_with_source, print_log_dump};
use intcode_api::{
    get_config, init_config, run_network, run_streaming, run_with_provider, AsciiOutput,
    IntcodeError, LineInput, LogLevel, NetworkMode, RunConfig,
};
use intcode_core::ascii;
use intcode_log::{debug, info, LogRingBuffer, Logger};

/// 故障时转储的日志条数
const DUMP_RECORDS: usize = 20;

#[derive(Parser)]
#[command(name = "intcode", about = "Intcode virtual machine", version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Log level: silent, error, warn, info, debug, trace
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single program
    Run(RunArgs),
    /// Boot a network of machines running the same program
    Network(NetworkArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Tape file (comma-separated integers)
    file: PathBuf,

    /// Comma-separated integer inputs, queued before anything else
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    input: Vec<i64>,

    /// Print outputs as ASCII text
    #[arg(long)]
    ascii: bool,

    /// A line of ASCII input (repeatable); implies --ascii
    #[arg(long, value_name = "LINE")]
    ascii_input: Vec<String>,

    /// Read further inputs from stdin when the queue runs dry
    #[arg(long)]
    interactive: bool,

    /// Wait for Enter after every output
    #[arg(long)]
    pause_on_output: bool,

    /// Narrate every executed instruction
    #[arg(long)]
    trace: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct NetworkArgs {
    /// Tape file (comma-separated integers)
    file: PathBuf,

    /// Number of machines
    #[arg(long)]
    size: Option<usize>,

    /// Address delivered to the host
    #[arg(long, allow_hyphen_values = true)]
    host_address: Option<i64>,

    /// Run the NAT until it delivers the same y twice in a row
    #[arg(long)]
    nat: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

/// 已安装的日志系统
struct Logging {
    logger: Arc<Logger>,
    ring: Option<Arc<LogRingBuffer>>,
}

fn main() {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => CliConfig::load(path).unwrap_or_else(|e| fail(&e)),
        None => CliConfig::default(),
    };

    let trace = matches!(&cli.command, Command::Run(args) if args.trace);
    let logging = setup_logging(&cli, &file_config, trace).unwrap_or_else(|e| fail(&e));

    // Initialize API config (global singleton for convenience)
    let run_config = build_run_config(&cli.command, &file_config, logging.logger.clone());
    if init_config(run_config).is_err() {
        fail("配置已被初始化");
    }

    match &cli.command {
        Command::Run(args) => handle_run(args, &logging),
        Command::Network(args) => handle_network(args, &logging),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1)
}

/// Install tracing and build the logger shared by every machine
fn setup_logging(cli: &Cli, file_config: &CliConfig, trace: bool) -> Result<Logging, String> {
    let mut settings = file_config.log.clone();
    if let Some(name) = &cli.log_level {
        settings.level =
            LogLevel::from_name(name).ok_or_else(|| format!("未知的日志级别 '{}'", name))?;
    }
    if trace {
        settings.machine = Some(LogLevel::Trace);
    }

    let format = match (cli.log_format, settings.format.as_deref()) {
        (Some(format), _) => format,
        (None, Some(name)) => {
            LogFormat::from_name(name).ok_or_else(|| format!("未知的日志格式 '{}'", name))?
        }
        (None, None) => LogFormat::Compact,
    };
    let file = cli.log_file.clone().or_else(|| settings.file.clone().map(PathBuf::from));

    let log_config = LogConfig::from(&settings);
    init_with_file(&log_config, format, file)?;

    let mut level = to_log_level(log_config.most_verbose());
    let ring = if settings.ring_buffer > 0 {
        // 环形缓冲区至少保留生命周期日志
        level = level.min(intcode_log::Level::Debug);
        Some(LogRingBuffer::new(settings.ring_buffer))
    } else {
        None
    };

    let logger = Logger::new(level).with_sink(TracingSink);
    if let Some(ring) = &ring {
        logger.add_sink(Arc::clone(ring));
    }

    Ok(Logging { logger, ring })
}

/// Merge the config file with command line overrides
fn build_run_config(command: &Command, file_config: &CliConfig, logger: Arc<Logger>) -> RunConfig {
    let mut config = RunConfig {
        show_steps: file_config.show_steps,
        machine: file_config.machine.clone(),
        network: file_config.network.clone(),
        logger,
    };

    match command {
        Command::Run(args) => {
            config.show_steps |= args.trace;
            config.machine.pause_on_output |= args.pause_on_output;
        }
        Command::Network(args) => {
            if let Some(size) = args.size {
                config.network.size = size;
            }
            if let Some(address) = args.host_address {
                config.network.host_address = address;
            }
            if args.nat {
                config.network.mode = NetworkMode::Nat;
            }
        }
    }

    config
}

fn read_source(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        fail(&format!("Cannot read tape file '{}': {}", path.display(), e))
    })
}

fn handle_run(args: &RunArgs, logging: &Logging) {
    let config = get_config();
    let source = read_source(&args.file);
    let ascii_mode = args.ascii || !args.ascii_input.is_empty();

    let mut inputs = args.input.clone();
    inputs.extend(args.ascii_input.iter().flat_map(|line| ascii::encode_line(line)));

    info!(config.logger, "running {}", args.file.display());
    if config.show_steps {
        eprintln!("[Intcode VM]");
        eprintln!("Tape: {}", args.file.display());
    }

    // 非终端时无从等待回车
    let pause = config.machine.pause_on_output && io::stdin().is_terminal();
    let mut printer = OutputPrinter::new(ascii_mode, args.json);
    let on_output = |value: i64| {
        printer.print(value);
        if pause {
            wait_for_enter();
        }
    };

    let result = if args.interactive {
        let reader = BufReader::new(io::stdin());
        let provider = if ascii_mode {
            LineInput::ascii(reader, io::stderr())
        } else {
            LineInput::new(reader, io::stderr())
        };
        run_with_provider(&source, &inputs, provider, config, on_output)
    } else {
        run_streaming(&source, &inputs, config, on_output)
    };
    printer.finish();

    match result {
        Ok(output) => {
            debug!(
                config.logger,
                "consumed {} inputs, halted at {}", output.inputs_consumed, output.halt.pointer
            );
            if args.json {
                let json = if ascii_mode {
                    let decoded = ascii::decode(&output.outputs);
                    serde_json::to_string_pretty(&AsciiOutput {
                        text: decoded.text,
                        non_ascii: decoded.non_ascii,
                        halt: output.halt,
                    })
                } else {
                    serde_json::to_string_pretty(&output)
                };
                match json {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail(&e.to_string()),
                }
            } else if config.show_steps {
                eprintln!("✅ Halted ({})", output.halt.reason);
            }
        }
        Err(e) => report_failure(&e, &source, args.json, logging),
    }
}

fn handle_network(args: &NetworkArgs, logging: &Logging) {
    let config = get_config();
    let source = read_source(&args.file);

    match run_network(&source, config) {
        Ok(summary) => {
            if args.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail(&e.to_string()),
                }
            } else {
                println!("{}", summary.packet());
                if config.network.mode == NetworkMode::Nat {
                    println!("NAT deliveries: {}", summary.nat_deliveries);
                }
                println!("{}", summary.y);
            }
        }
        Err(e) => report_failure(&e, &source, args.json, logging),
    }
}

fn report_failure(e: &IntcodeError, source: &str, json: bool, logging: &Logging) -> ! {
    if json {
        println!("{}", e.to_report().to_json());
    } else {
        print_error_with_source(e, source);
        if e.pointer().is_some() {
            if let Some(ring) = &logging.ring {
                print_log_dump(ring, DUMP_RECORDS);
            }
        }
    }
    process::exit(1)
}

fn wait_for_enter() {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "[paused] press Enter to resume");
    let _ = stderr.flush();
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
}

/// 流式打印输出值
struct OutputPrinter {
    ascii: bool,
    quiet: bool,
    /// ASCII 模式下当前行尚未换行
    line_open: bool,
}

impl OutputPrinter {
    fn new(ascii: bool, quiet: bool) -> Self {
        Self {
            ascii,
            quiet,
            line_open: false,
        }
    }

    fn print(&mut self, value: i64) {
        if self.quiet {
            return;
        }
        let mut out = io::stdout().lock();
        if !self.ascii {
            let _ = writeln!(out, "{}", value);
            return;
        }

        let decoded = ascii::decode(&[value]);
        if let Some(answer) = decoded.answer() {
            if self.line_open {
                let _ = writeln!(out);
            }
            let _ = writeln!(out, "{}", answer);
            self.line_open = false;
        } else {
            let _ = write!(out, "{}", decoded.text);
            self.line_open = !decoded.text.ends_with('\n');
        }
        let _ = out.flush();
    }

    fn finish(&mut self) {
        if self.line_open && !self.quiet {
            println!();
            self.line_open = false;
        }
    }
}
