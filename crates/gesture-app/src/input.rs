//! Line-oriented input source.
//!
//! Each line is one command:
//!
//! ```text
//! 253 up                                   # key event
//! {"scancode":253,"transition":"down"}     # key event as JSON
//! prox 5.0                                 # proximity sample
//! torch 0 on|off|unavailable               # torch status callback
//! sleep 500                                # pause reading
//! ```
//!
//! Blank lines and `#` comments are skipped.

use std::time::Duration;

use gesture_core::{GestureError, GestureEvent, KeyTransition, Result, Scancode};
use gesture_dispatch::DispatchHandle;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::platform::SimulatedProximitySensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorchStatus {
    On,
    Off,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputCommand {
    Key(GestureEvent),
    Proximity(f32),
    Torch {
        camera_id: String,
        status: TorchStatus,
    },
    Sleep(Duration),
}

/// Parse one input line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<InputCommand>> {
    let line = match line.split_once('#') {
        Some((before, _)) if !line.trim_start().starts_with('{') => before,
        _ => line,
    }
    .trim();
    if line.is_empty() {
        return Ok(None);
    }

    if line.starts_with('{') {
        let event: GestureEvent = serde_json::from_str(line)?;
        return Ok(Some(InputCommand::Key(event)));
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let command = match tokens.as_slice() {
        ["prox", value] => InputCommand::Proximity(
            value
                .parse()
                .map_err(|_| invalid(format!("bad proximity value '{}'", value)))?,
        ),
        ["torch", camera_id, status] => InputCommand::Torch {
            camera_id: camera_id.to_string(),
            status: match *status {
                "on" => TorchStatus::On,
                "off" => TorchStatus::Off,
                "unavailable" => TorchStatus::Unavailable,
                other => return Err(invalid(format!("bad torch status '{}'", other))),
            },
        },
        ["sleep", ms] => InputCommand::Sleep(Duration::from_millis(
            ms.parse()
                .map_err(|_| invalid(format!("bad sleep duration '{}'", ms)))?,
        )),
        [code, transition] => {
            let scancode: u32 = code
                .parse()
                .map_err(|_| invalid(format!("bad scancode '{}'", code)))?;
            let transition: KeyTransition = transition.parse()?;
            InputCommand::Key(GestureEvent::new(Scancode(scancode), transition))
        }
        _ => return Err(invalid(format!("unrecognised line '{}'", line))),
    };
    Ok(Some(command))
}

fn invalid(msg: String) -> GestureError {
    GestureError::InvalidInput(msg)
}

/// Counters reported when the input stream ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputStats {
    pub handled: usize,
    pub not_handled: usize,
    pub invalid: usize,
}

/// Feed every line of `reader` to the dispatcher until EOF.
pub async fn pump<R>(
    reader: R,
    handle: &DispatchHandle,
    sensor: &SimulatedProximitySensor,
) -> Result<InputStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = InputStats::default();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping input line");
                stats.invalid += 1;
                continue;
            }
        };

        match command {
            InputCommand::Key(event) => {
                let handled = handle.submit(event);
                debug!(scancode = %event.scancode, transition = %event.transition, handled, "Key event");
                if handled {
                    stats.handled += 1;
                } else {
                    stats.not_handled += 1;
                }
            }
            InputCommand::Proximity(value) => {
                let delivered = sensor.emit(value);
                debug!(value, delivered, "Proximity sample");
            }
            InputCommand::Torch { camera_id, status } => match status {
                TorchStatus::On => handle.torch_changed(camera_id, true),
                TorchStatus::Off => handle.torch_changed(camera_id, false),
                TorchStatus::Unavailable => handle.torch_unavailable(camera_id),
            },
            InputCommand::Sleep(duration) => tokio::time::sleep(duration).await,
        }
    }

    Ok(stats)
}
