use std::{cell::Cell, collections::VecDeque, convert::Infallible, rc::Rc};

use anyhow::{Context, bail};
use unfold_core::input::{InputProvider, RawInput};

/// One line of an input script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum ScriptCommand {
    Input(RawInput),
    Tick(u64),
    Answer {
        at_ms: u64,
        key: String,
        text: String,
    },
    Finish(u64),
}

impl ScriptCommand {
    pub(super) fn at_ms(&self) -> u64 {
        match self {
            Self::Input(event) => event.at_ms,
            Self::Tick(at_ms) | Self::Finish(at_ms) => *at_ms,
            Self::Answer { at_ms, .. } => *at_ms,
        }
    }
}

/// Parses `wheel <ms> <delta>`, `key <ms> forward|backward`, `tick <ms>`,
/// `answer <ms> <key> <text...>` and `finish <ms>` lines. Commands come back
/// sorted by time; lines with equal times keep their order.
pub(super) fn parse_script(text: &str) -> anyhow::Result<Vec<ScriptCommand>> {
    let mut commands = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let command = parse_line(line).with_context(|| format!("script line {}", index + 1))?;
        commands.push(command);
    }

    commands.sort_by_key(ScriptCommand::at_ms);
    Ok(commands)
}

fn parse_line(line: &str) -> anyhow::Result<ScriptCommand> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let at_ms: u64 = parts
        .next()
        .context("missing timestamp")?
        .parse()
        .context("timestamp must be milliseconds")?;

    let command = match verb {
        "wheel" => {
            let delta: i32 = parts
                .next()
                .context("missing wheel delta")?
                .parse()
                .context("wheel delta must be an integer")?;
            ScriptCommand::Input(RawInput::wheel(at_ms, delta))
        }
        "key" => match parts.next() {
            Some("forward") => ScriptCommand::Input(RawInput::key_forward(at_ms)),
            Some("backward") => ScriptCommand::Input(RawInput::key_backward(at_ms)),
            other => bail!("unknown key {:?}", other.unwrap_or("")),
        },
        "tick" => ScriptCommand::Tick(at_ms),
        "answer" => {
            let key = parts.next().context("missing question key")?;
            let text = parts.collect::<Vec<_>>().join(" ");
            ScriptCommand::Answer {
                at_ms,
                key: key.to_string(),
                text,
            }
        }
        "finish" => ScriptCommand::Finish(at_ms),
        other => bail!("unknown command {other:?}"),
    };

    Ok(command)
}

/// Replays scripted raw events once the shared clock reaches them.
pub(super) struct ScriptInput {
    pending: VecDeque<RawInput>,
    clock: Rc<Cell<u64>>,
}

impl ScriptInput {
    /// Separates raw input events from the commands the driver applies itself.
    pub(super) fn split(
        commands: Vec<ScriptCommand>,
        clock: Rc<Cell<u64>>,
    ) -> (Self, Vec<ScriptCommand>) {
        let mut pending = VecDeque::new();
        let mut actions = Vec::new();
        for command in commands {
            match command {
                ScriptCommand::Input(event) => pending.push_back(event),
                other => actions.push(other),
            }
        }

        (Self { pending, clock }, actions)
    }

    pub(super) fn last_at_ms(&self) -> Option<u64> {
        self.pending.back().map(|event| event.at_ms)
    }
}

impl InputProvider for ScriptInput {
    type Error = Infallible;

    fn poll_event(&mut self) -> Result<Option<RawInput>, Self::Error> {
        let now_ms = self.clock.get();
        if self
            .pending
            .front()
            .is_some_and(|event| event.at_ms <= now_ms)
        {
            return Ok(self.pending.pop_front());
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command_and_sorts_by_time() {
        let script = "\
# warm-up
key 400 forward
wheel 100 -35
tick 900
answer 600 question1 Because   the oil ran out.
finish 1200
";
        let commands = parse_script(script).expect("script parses");

        assert_eq!(
            commands,
            [
                ScriptCommand::Input(RawInput::wheel(100, -35)),
                ScriptCommand::Input(RawInput::key_forward(400)),
                ScriptCommand::Answer {
                    at_ms: 600,
                    key: String::from("question1"),
                    text: String::from("Because the oil ran out."),
                },
                ScriptCommand::Tick(900),
                ScriptCommand::Finish(1_200),
            ]
        );
    }

    #[test]
    fn errors_name_the_line() {
        let err = parse_script("key 0 forward\nkey 10 sideways").expect_err("bad key");
        assert!(format!("{err:#}").contains("script line 2"));

        assert!(parse_script("wheel soon 3").is_err());
        assert!(parse_script("jump 10").is_err());
        assert!(parse_script("answer 10").is_err());
    }

    #[test]
    fn script_input_waits_for_the_clock() {
        let clock = Rc::new(Cell::new(0));
        let commands = vec![
            ScriptCommand::Input(RawInput::key_forward(50)),
            ScriptCommand::Finish(80),
            ScriptCommand::Input(RawInput::key_backward(100)),
        ];
        let (mut input, actions) = ScriptInput::split(commands, Rc::clone(&clock));

        assert_eq!(actions, [ScriptCommand::Finish(80)]);
        assert_eq!(input.last_at_ms(), Some(100));
        assert_eq!(input.poll_event(), Ok(None));

        clock.set(100);
        assert_eq!(input.poll_event(), Ok(Some(RawInput::key_forward(50))));
        assert_eq!(input.poll_event(), Ok(Some(RawInput::key_backward(100))));
        assert_eq!(input.poll_event(), Ok(None));
    }
}
