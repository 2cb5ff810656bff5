//! Line-oriented playback console.
//!
//! Reads commands from stdin while the spooler plays:
//!
//! | command            | effect                                     |
//! |--------------------|--------------------------------------------|
//! | `run`, `r`         | start or resume playback                   |
//! | `pause`, `p`       | stop after the in-flight step              |
//! | `reset`, `0`       | stop and restore the initial scene         |
//! | `step`, `n`        | apply the next step (only while paused)    |
//! | `seek N`, `s N`    | jump to step `N` (rounded, clamped)        |
//! | `faster [by]`, `+` | increase speed by `by` or the configured step |
//! | `slower [by]`, `-` | decrease speed by `by` or the configured step |
//! | `speed N`          | set the speed factor                       |
//! | `status`, `?`      | print the spooler status as JSON           |
//! | `quit`, `q`        | pause and exit                             |
//!
//! When stdin closes, the console waits for an active run to finish.
//! Ctrl-C pauses playback and exits.

use std::str::FromStr;

use tickreel_core::{RunState, Spooler};
use tickreel_scene::Scene;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::error::{CommandError, PlayerError};

/// A parsed console command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    /// Start or resume playback.
    Run,
    /// Pause playback.
    Pause,
    /// Reset to the initial state.
    Reset,
    /// Advance one step.
    Step,
    /// Seek to a step.
    Seek(f64),
    /// Increase speed, optionally by an explicit delta.
    Faster(Option<f64>),
    /// Decrease speed, optionally by an explicit delta.
    Slower(Option<f64>),
    /// Set the speed factor.
    Speed(f64),
    /// Print the status.
    Status,
    /// Exit the console.
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(CommandError::Empty)?;
        let argument = words.next();

        match command.to_ascii_lowercase().as_str() {
            "run" | "r" | "play" => Ok(Self::Run),
            "pause" | "p" => Ok(Self::Pause),
            "reset" | "0" => Ok(Self::Reset),
            "step" | "n" => Ok(Self::Step),
            "seek" | "s" => required(argument, "seek").map(Self::Seek),
            "faster" | "+" => optional(argument).map(Self::Faster),
            "slower" | "-" => optional(argument).map(Self::Slower),
            "speed" => required(argument, "speed").map(Self::Speed),
            "status" | "?" => Ok(Self::Status),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            _ => Err(CommandError::Unknown {
                command: command.to_owned(),
            }),
        }
    }
}

fn number(value: &str) -> Result<f64, CommandError> {
    value
        .parse()
        .map_err(|source| CommandError::InvalidNumber {
            value: value.to_owned(),
            source,
        })
}

fn required(argument: Option<&str>, command: &'static str) -> Result<f64, CommandError> {
    argument
        .ok_or(CommandError::MissingArgument { command })
        .and_then(number)
}

fn optional(argument: Option<&str>) -> Result<Option<f64>, CommandError> {
    argument.map(number).transpose()
}

/// Whether the console keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop the console.
    Quit,
}

/// Print the spooler status as one JSON line on stdout.
///
/// # Errors
///
/// Returns [`PlayerError::Json`] if the status cannot be serialized.
pub fn print_status<S>(spooler: &Spooler<S>) -> Result<(), PlayerError>
where
    S: Scene + Send + 'static,
{
    println!("{}", serde_json::to_string(&spooler.status())?);
    Ok(())
}

/// Execute one command against the spooler.
///
/// Playback failures are logged and leave the console running.
///
/// # Errors
///
/// Returns [`PlayerError::Json`] if printing the status fails.
pub async fn execute<S>(spooler: &Spooler<S>, command: ConsoleCommand) -> Result<Flow, PlayerError>
where
    S: Scene + Send + 'static,
{
    let outcome = match command {
        ConsoleCommand::Run => {
            drop(spooler.run());
            Ok(())
        }
        ConsoleCommand::Pause => {
            spooler.pause().await;
            Ok(())
        }
        ConsoleCommand::Reset => {
            spooler.reset().await;
            Ok(())
        }
        ConsoleCommand::Step => spooler
            .advance_one_step()
            .map(|step| info!(step, "Stepped")),
        ConsoleCommand::Seek(target) => spooler
            .skip_to(target)
            .await
            .map(|step| info!(step, "Seeked")),
        ConsoleCommand::Faster(by) => spooler
            .increase_speed(by.unwrap_or_else(|| spooler.speed_step()))
            .map(|speed| info!(speed, "Speed increased")),
        ConsoleCommand::Slower(by) => spooler
            .decrease_speed(by.unwrap_or_else(|| spooler.speed_step()))
            .map(|speed| info!(speed, "Speed decreased")),
        ConsoleCommand::Speed(value) => spooler
            .set_speed_factor(value)
            .map(|speed| info!(speed, "Speed set")),
        ConsoleCommand::Status => {
            print_status(spooler)?;
            Ok(())
        }
        ConsoleCommand::Quit => {
            spooler.pause().await;
            return Ok(Flow::Quit);
        }
    };

    if let Err(e) = outcome {
        warn!(error = %e, ?command, "Command failed");
    }
    Ok(Flow::Continue)
}

/// Wait for an active run, if any, to finish.
async fn finish<S>(spooler: &Spooler<S>)
where
    S: Scene + Send + 'static,
{
    if spooler.run_state() == RunState::Idle {
        return;
    }
    info!("Input closed, waiting for playback to finish");
    if let Err(e) = spooler.run().await {
        warn!(error = %e, "Playback stopped with an error");
    }
}

/// Read and execute commands from stdin until quit, EOF, or Ctrl-C.
///
/// # Errors
///
/// Returns [`PlayerError::Io`] if stdin or the signal handler fails.
pub async fn drive<S>(spooler: &Spooler<S>) -> Result<(), PlayerError>
where
    S: Scene + Send + 'static,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    finish(spooler).await;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(command) => {
                        if execute(spooler, command).await? == Flow::Quit {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Ignoring console input"),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Interrupted, pausing playback");
                spooler.pause().await;
                break;
            }
        }
    }

    Ok(())
}
