//! Pure parsing of slash-command and rendered-template invocations. No I/O.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSlashCommand {
    pub name: String,
    pub args: String,
}

/// Split leading `/name` from the remainder of a raw command string.
pub fn parse_slash_command(raw: &str) -> Option<ParsedSlashCommand> {
    let trimmed = raw.trim_start();
    let rest = trimmed.strip_prefix('/')?;
    let (name, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim_start()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return None;
    }
    Some(ParsedSlashCommand {
        name: name.to_lowercase(),
        args: args.to_string(),
    })
}

/// Recognize a rendered template invocation of the form
/// `<python> ".../autopilot_command.py" <subcommand> <args>` and map it to
/// the canonical `autopilot-<subcommand>` identifier.
pub fn parse_autopilot_template_command(raw: &str) -> Option<ParsedSlashCommand> {
    let marker = "autopilot_command.py";
    let idx = raw.find(marker)?;
    let after_script = &raw[idx + marker.len()..];
    let after_script = after_script.trim_start().trim_start_matches('"').trim_start();
    let (subcommand, args) = match after_script.find(char::is_whitespace) {
        Some(i) => (&after_script[..i], after_script[i..].trim_start()),
        None => (after_script, ""),
    };
    if subcommand.is_empty() {
        return None;
    }
    Some(ParsedSlashCommand {
        name: format!("autopilot-{}", subcommand.to_lowercase()),
        args: args.to_string(),
    })
}

/// Fold legacy aliases onto the canonical `autopilot-<action>` identifier.
pub fn canonical_autopilot_command_name(name: &str) -> String {
    match name {
        "ralph-loop" => "autopilot-go".to_string(),
        "cancel-ralph" => "autopilot-stop".to_string(),
        "ralph-status" => "autopilot-status".to_string(),
        "ralph-pause" => "autopilot-pause".to_string(),
        "ralph-resume" => "autopilot-resume".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutopilotAction {
    Start,
    Stop,
    None,
}

/// Classify a canonicalized command name (plus its first positional
/// argument, for the bare `/autopilot` spelling) into a loop transition.
pub fn resolve_autopilot_action(name: &str, args: &str) -> AutopilotAction {
    let canonical = canonical_autopilot_command_name(name);
    match canonical.as_str() {
        "autopilot-go" | "autopilot-resume" => AutopilotAction::Start,
        "autopilot-stop" | "autopilot-pause" => AutopilotAction::Stop,
        "autopilot" => {
            let subcommand = args.split_whitespace().next().unwrap_or("");
            match subcommand {
                "go" | "resume" => AutopilotAction::Start,
                "stop" | "pause" => AutopilotAction::Stop,
                _ => AutopilotAction::None,
            }
        }
        _ => AutopilotAction::None,
    }
}

/// `--goal "<quoted>"` or `--goal <bareword>`; first occurrence wins.
pub fn parse_goal(args: &str) -> Option<String> {
    parse_flag(args, "--goal")
}

pub fn parse_completion_mode(args: &str) -> String {
    parse_flag(args, "--completion-mode").unwrap_or_else(|| "promise".to_string())
}

pub fn parse_completion_promise(args: &str, default_promise: &str) -> String {
    parse_flag(args, "--completion-promise").unwrap_or_else(|| default_promise.to_string())
}

pub fn parse_max_iterations(args: &str, default_max: u64) -> u64 {
    parse_flag(args, "--max-iterations")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default_max)
}

/// `--done-criteria "a;b;c"` -> `[a, b, c]`, trimmed, empty segments removed.
pub fn parse_done_criteria(args: &str) -> Vec<String> {
    match parse_flag(args, "--done-criteria") {
        Some(raw) => raw
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

fn parse_flag(args: &str, flag: &str) -> Option<String> {
    let idx = args.find(flag)?;
    let rest = args[idx + flag.len()..].trim_start();
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"')?;
        return Some(quoted[..end].to_string());
    }
    let value = rest.split_whitespace().next()?;
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_slash_command() {
        let parsed = parse_slash_command("/Autopilot go --goal x").unwrap();
        assert_eq!(parsed.name, "autopilot");
        assert_eq!(parsed.args, "go --goal x");
    }

    #[test]
    fn non_slash_input_is_none() {
        assert!(parse_slash_command("plain text").is_none());
    }

    #[test]
    fn parses_autopilot_template_invocation() {
        let raw = r#"python3 ".../autopilot_command.py" go --goal "x""#;
        let parsed = parse_autopilot_template_command(raw).unwrap();
        assert_eq!(parsed.name, "autopilot-go");
        assert_eq!(parsed.args, r#"--goal "x""#);
    }

    #[test]
    fn canonicalizes_legacy_aliases() {
        assert_eq!(canonical_autopilot_command_name("ralph-loop"), "autopilot-go");
        assert_eq!(canonical_autopilot_command_name("cancel-ralph"), "autopilot-stop");
        assert_eq!(canonical_autopilot_command_name("autopilot-go"), "autopilot-go");
    }

    #[test]
    fn resolves_start_and_stop_actions() {
        assert_eq!(resolve_autopilot_action("autopilot-go", ""), AutopilotAction::Start);
        assert_eq!(resolve_autopilot_action("autopilot-stop", ""), AutopilotAction::Stop);
        assert_eq!(resolve_autopilot_action("autopilot", "go --goal x"), AutopilotAction::Start);
        assert_eq!(resolve_autopilot_action("autopilot", "status"), AutopilotAction::None);
    }

    #[test]
    fn parses_flags_from_scenario_one() {
        let args = r#"--goal "process a five-item checklist" --done-criteria "2x + 1;5x -2;x^2 + 1;-2x + 6;3x + 5" --completion-mode promise --json"#;
        assert_eq!(parse_goal(args), Some("process a five-item checklist".to_string()));
        assert_eq!(parse_completion_mode(args), "promise");
        assert_eq!(
            parse_done_criteria(args),
            vec!["2x + 1", "5x -2", "x^2 + 1", "-2x + 6", "3x + 5"]
        );
    }

    #[test]
    fn max_iterations_preserves_zero() {
        assert_eq!(parse_max_iterations("--max-iterations 0", 10), 0);
        assert_eq!(parse_max_iterations("", 10), 10);
    }
}
