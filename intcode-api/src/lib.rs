//! Intcode API - Execution orchestration layer
//!
//! Provides unified execution interface, including:
//! - Execution flow orchestration (single machine, ASCII programs, networks)
//! - Configuration abstraction (RunConfig)
//! - Unified error handling (IntcodeError)
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `run(source, inputs, &config)` API.

use intcode_log::{debug, info, warn};

use intcode_core::{ascii, HaltReason, InputProvider, Machine, Network, Program, Suspension};

// Re-export config
pub mod config;
pub use config::{config as get_config, init as init_config, is_initialized, RunConfig};

// Re-export config types from intcode_config
pub use intcode_config::{LogLevel, MachineConfig, NetworkConfig, NetworkMode, Target};

// Re-export error and types
pub mod error;
pub mod types;
pub use error::{ErrorReport, IntcodeError};
pub use types::{AsciiOutput, ExecuteOutput, HaltSummary, NetworkSummary};

// Re-export core types
pub use intcode_config;
pub use intcode_core;
pub use intcode_core::{LineInput, MachineError, NetworkError, Packet, ScriptedInput, TapeError};

/// Parse and run a program with explicit configuration
///
/// This is the recommended API for library users.
///
/// # Example
/// ```
/// use intcode_api::{run, RunConfig};
///
/// let output = run("3,9,8,9,10,9,4,9,99,-1,8", &[8], &RunConfig::default()).unwrap();
/// assert_eq!(output.outputs, vec![1]);
/// ```
pub fn run(
    source: &str,
    inputs: &[i64],
    config: &RunConfig,
) -> Result<ExecuteOutput, IntcodeError> {
    let program = parse(source, config)?;
    execute(program, inputs, config)
}

/// Parse a tape with explicit configuration
pub fn parse(source: &str, config: &RunConfig) -> Result<Program, IntcodeError> {
    let program: Program = source.parse()?;
    debug!(config.logger, "parsed tape: cells={}", program.len());
    Ok(program)
}

/// Execute an already parsed program
pub fn execute(
    program: Program,
    inputs: &[i64],
    config: &RunConfig,
) -> Result<ExecuteOutput, IntcodeError> {
    let machine = build_machine(program, inputs, config);
    drive(machine, config, |_| {})
}

/// Run with preset inputs, handing every output to `on_output` as it is produced
pub fn run_streaming<F>(
    source: &str,
    inputs: &[i64],
    config: &RunConfig,
    on_output: F,
) -> Result<ExecuteOutput, IntcodeError>
where
    F: FnMut(i64),
{
    let program = parse(source, config)?;
    drive(build_machine(program, inputs, config), config, on_output)
}

/// Run with an input provider consulted when the preset inputs run out
///
/// `on_output` is called for every output value as soon as it is produced.
pub fn run_with_provider<P, F>(
    source: &str,
    inputs: &[i64],
    provider: P,
    config: &RunConfig,
    on_output: F,
) -> Result<ExecuteOutput, IntcodeError>
where
    P: InputProvider + 'static,
    F: FnMut(i64),
{
    let program = parse(source, config)?;
    let machine = build_machine(program, inputs, config).with_provider(provider);
    drive(machine, config, on_output)
}

/// Run an ASCII program
///
/// Every line of `input` is fed to the program terminated by a newline.
pub fn run_ascii(
    source: &str,
    input: &str,
    config: &RunConfig,
) -> Result<AsciiOutput, IntcodeError> {
    let inputs: Vec<i64> = input.lines().flat_map(ascii::encode_line).collect();
    let output = run(source, &inputs, config)?;
    let decoded = ascii::decode(&output.outputs);

    debug!(
        config.logger,
        "ascii output: chars={}, non_ascii={}",
        decoded.text.len(),
        decoded.non_ascii.len(),
    );

    Ok(AsciiOutput {
        text: decoded.text,
        non_ascii: decoded.non_ascii,
        halt: output.halt,
    })
}

/// Boot a network of machines on the same program and run it to a result
pub fn run_network(source: &str, config: &RunConfig) -> Result<NetworkSummary, IntcodeError> {
    let program = parse(source, config)?;
    let network_config = config.network_config();

    info!(
        config.logger,
        "Starting network: size={}, mode={:?}",
        network_config.size,
        network_config.mode,
    );

    let outcome = Network::new(program, network_config)
        .with_logger(config.logger.clone())
        .run()?;

    info!(config.logger, "Network completed: {}", outcome.packet);
    Ok(NetworkSummary::from(outcome))
}

fn build_machine(program: Program, inputs: &[i64], config: &RunConfig) -> Machine {
    Machine::with_config(program, inputs.iter().copied(), config.machine_config())
        .with_logger(config.logger.clone())
}

/// Drive a machine cooperatively until it halts
///
/// A machine left waiting for input with nothing queued cannot make progress
/// on this thread, so it is reported as `InputExhausted`.
fn drive<F>(
    mut machine: Machine,
    config: &RunConfig,
    mut on_output: F,
) -> Result<ExecuteOutput, IntcodeError>
where
    F: FnMut(i64),
{
    info!(config.logger, "Starting execution: {}", machine.label());

    loop {
        match machine.advance() {
            Suspension::Output(value) => on_output(value),
            Suspension::AwaitingInput => {
                let pointer = machine.pointer();
                warn!(config.logger, "{} ran out of input at {}", machine.label(), pointer);
                machine.halt();
                let _ = machine.advance();
                return Err(IntcodeError::InputExhausted { pointer });
            }
            Suspension::Halted(HaltReason::Fault(error)) => return Err(error.into()),
            Suspension::Halted(_) => break,
        }
    }

    let report = machine.halt_report().ok_or(MachineError::AlreadyHalted)?;
    info!(
        config.logger,
        "Execution completed: outputs={}, reason={}",
        report.outputs,
        report.reason.as_str(),
    );

    Ok(ExecuteOutput {
        outputs: machine.outputs().to_vec(),
        halt: HaltSummary::from(&report),
        inputs_consumed: machine.consumed(),
    })
}

// ==================== Global config API ====================

/// Parse and run a program (uses global config)
pub fn run_global(source: &str, inputs: &[i64]) -> Result<ExecuteOutput, IntcodeError> {
    run(source, inputs, get_config())
}

/// Quick run with default config (auto-initializes if needed)
pub fn quick_run(source: &str, inputs: &[i64]) -> Result<ExecuteOutput, IntcodeError> {
    if !is_initialized() {
        // 另一个线程抢先初始化时沿用它的配置
        let _ = init_config(RunConfig::default());
    }
    run_global(source, inputs)
}
