use islet_shared::inventory::ResourceKind;

use crate::input::InputFlags;

pub const DEFAULT_MOVE_TICKS: u32 = 10;
const MAX_MOVE_TICKS: u32 = 6_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Noop,
    Stop,
    Help,
    Status,
    Save,
    Hold { flags: InputFlags, ticks: u32 },
    Halt,
    Jump,
    Mine,
    Place,
    ToggleBuild,
    Select(ResourceKind),
    Look { degrees: f32 },
    Teleport { x: f32, y: f32, z: f32 },
    InvalidUsage(String),
    Unknown(String),
}

pub const HELP: &str = "Commands: w/s/a/d [ticks], run [ticks], swim [ticks], dive [ticks], halt, jump, \
mine, place, build, select <1|2|wood|stone>, look <degrees>, tp <x> <y> <z>, save, status, help, stop";

fn hold(flags: InputFlags, rest: &str, usage: &str) -> Command {
    if rest.is_empty() {
        return Command::Hold {
            flags,
            ticks: DEFAULT_MOVE_TICKS,
        };
    }
    match rest.parse::<u32>() {
        Ok(ticks) if (1..=MAX_MOVE_TICKS).contains(&ticks) => Command::Hold { flags, ticks },
        _ => Command::InvalidUsage(format!(
            "Usage: {usage} [ticks], where ticks is between 1 and {MAX_MOVE_TICKS}"
        )),
    }
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Noop;
    }

    let input = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if input.is_empty() {
        return Command::Noop;
    }

    let mut head_tail = input.splitn(2, char::is_whitespace);
    let command = head_tail.next().unwrap_or_default().to_ascii_lowercase();
    let rest = head_tail.next().unwrap_or("").trim();

    match command.as_str() {
        "stop" | "quit" => Command::Stop,
        "help" => Command::Help,
        "status" => Command::Status,
        "save" => Command::Save,
        "w" => hold(InputFlags::FORWARD, rest, "/w"),
        "s" => hold(InputFlags::BACKWARD, rest, "/s"),
        "a" => hold(InputFlags::TURN_LEFT, rest, "/a"),
        "d" => hold(InputFlags::TURN_RIGHT, rest, "/d"),
        "run" => hold(InputFlags::FORWARD | InputFlags::SPRINT, rest, "/run"),
        "swim" => hold(InputFlags::FORWARD | InputFlags::JUMP, rest, "/swim"),
        "dive" => hold(InputFlags::DIVE, rest, "/dive"),
        "halt" => Command::Halt,
        "jump" => Command::Jump,
        "mine" => Command::Mine,
        "place" => Command::Place,
        "build" => Command::ToggleBuild,
        "select" => match ResourceKind::parse(rest) {
            Some(kind) if !rest.is_empty() => Command::Select(kind),
            _ => Command::InvalidUsage("Usage: /select <1|2|wood|stone>".to_string()),
        },
        "look" => match rest.parse::<f32>() {
            Ok(degrees) if (-90.0..=90.0).contains(&degrees) => Command::Look { degrees },
            _ => Command::InvalidUsage(
                "Usage: /look <degrees>, where degrees is between -90 and 90".to_string(),
            ),
        },
        "tp" => {
            let mut args = rest.split_whitespace();
            match (args.next(), args.next(), args.next(), args.next()) {
                (Some(x), Some(y), Some(z), None) => {
                    match (x.parse::<f32>(), y.parse::<f32>(), z.parse::<f32>()) {
                        (Ok(x), Ok(y), Ok(z)) if x.is_finite() && y.is_finite() && z.is_finite() => {
                            Command::Teleport { x, y, z }
                        }
                        _ => Command::InvalidUsage("Usage: /tp <x> <y> <z>".to_string()),
                    }
                }
                _ => Command::InvalidUsage("Usage: /tp <x> <y> <z>".to_string()),
            }
        }
        _ => Command::Unknown(input.to_string()),
    }
}
