//! Line commands for `nw run`

use crate::app::{AppEvent, Rating};
use crate::host::HostEvent;

/// Help shown by `help` and on unknown input
pub const HELP: &str = "\
Commands:
  open              click the launcher
  close             click the close button
  backdrop          click the overlay backdrop
  panel             click inside the panel
  ready             document finished loading
  rate N            select N stars (1-5)
  hover X W         pointer at X on a rating bar W wide
  focus N           keyboard focus on star N
  leave             pointer left the rating bar
  type TEXT         set the feedback text
  submit            submit the feedback form
  status            show host and app state
  help              show this help
  quit              stop the session";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Host(HostEvent),
    App(AppEvent),
    Status,
    Help,
    Quit,
}

fn parse_rating(arg: Option<&str>) -> Result<Rating, String> {
    let raw = arg.ok_or("expected a rating")?;
    let value: u8 = raw.parse().map_err(|_| format!("not a number: {raw}"))?;
    Rating::new(value).map_err(|e| e.to_string())
}

fn parse_number(arg: Option<&str>, what: &str) -> Result<f64, String> {
    let raw = arg.ok_or_else(|| format!("expected {what}"))?;
    raw.parse().map_err(|_| format!("not a number: {raw}"))
}

/// Parse one input line
pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim_start();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let mut args = rest.split_whitespace();

    let command = match word {
        "open" => ReplCommand::Host(HostEvent::LauncherClicked),
        "close" => ReplCommand::Host(HostEvent::CloseClicked),
        "backdrop" => ReplCommand::Host(HostEvent::OverlayClicked { on_backdrop: true }),
        "panel" => ReplCommand::Host(HostEvent::OverlayClicked { on_backdrop: false }),
        "ready" => ReplCommand::Host(HostEvent::DocumentReady),
        "rate" => ReplCommand::App(AppEvent::ScoreSelected(parse_rating(args.next())?)),
        "hover" => {
            let x = parse_number(args.next(), "an x position")?;
            let width = parse_number(args.next(), "a width")?;
            ReplCommand::App(AppEvent::Hover { x, width })
        }
        "focus" => ReplCommand::App(AppEvent::Focus(parse_rating(args.next())?)),
        "leave" => ReplCommand::App(AppEvent::PointerLeft),
        // Text is kept verbatim after the first space
        "type" => ReplCommand::App(AppEvent::FeedbackChanged(rest.to_string())),
        "submit" => ReplCommand::App(AppEvent::SubmitClicked),
        "status" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        "" => return Err("empty command".to_string()),
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_commands() {
        assert_eq!(parse_command("open"), Ok(ReplCommand::Host(HostEvent::LauncherClicked)));
        assert_eq!(
            parse_command("  backdrop "),
            Ok(ReplCommand::Host(HostEvent::OverlayClicked { on_backdrop: true }))
        );
        assert_eq!(parse_command("quit"), Ok(ReplCommand::Quit));
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(
            parse_command("rate 4"),
            Ok(ReplCommand::App(AppEvent::ScoreSelected(Rating::new(4).unwrap())))
        );
        assert!(parse_command("rate 0").is_err());
        assert!(parse_command("rate five").is_err());
        assert!(parse_command("rate").is_err());
    }

    #[test]
    fn test_parse_hover() {
        assert_eq!(
            parse_command("hover 30 200"),
            Ok(ReplCommand::App(AppEvent::Hover { x: 30.0, width: 200.0 }))
        );
        assert!(parse_command("hover 30").is_err());
    }

    #[test]
    fn test_parse_type_keeps_text() {
        assert_eq!(
            parse_command("type too  slow"),
            Ok(ReplCommand::App(AppEvent::FeedbackChanged("too  slow".to_string())))
        );
        assert_eq!(
            parse_command("  type slow \t"),
            Ok(ReplCommand::App(AppEvent::FeedbackChanged("slow \t".to_string())))
        );
        assert_eq!(parse_command("type"), Ok(ReplCommand::App(AppEvent::FeedbackChanged(String::new()))));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse_command("dance"), Err("unknown command: dance".to_string()));
        assert!(parse_command("").is_err());
        assert!(parse_command("   ").is_err());
    }
}
