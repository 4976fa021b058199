use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, MULTI_ARG_COMMANDS, NO_ARG_COMMANDS, NUMBER_COMMANDS, SINGLE_PATH_COMMANDS,
    TEXT_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            command_args: BTreeMap::new(),
        }
    }

    fn invalid(raw: &str, command: &str, reason: String) -> Self {
        let mut intent = Self::new("invalid", raw);
        intent
            .command_args
            .insert("command".to_string(), Value::String(command.to_string()));
        intent
            .command_args
            .insert("reason".to_string(), Value::String(reason));
        intent
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.command_args.get(key).and_then(Value::as_str)
    }

    pub fn arg_u64(&self, key: &str) -> Option<u64> {
        self.command_args.get(key).and_then(Value::as_u64)
    }

    pub fn arg_list(&self, key: &str) -> Vec<String> {
        self.command_args
            .get(key)
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn split_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    split_args(arg).join(" ")
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, NUMBER_COMMANDS) {
                return match arg.parse::<u64>() {
                    Ok(number) => {
                        let mut intent = Intent::new(action, text);
                        intent
                            .command_args
                            .insert("number".to_string(), Value::from(number));
                        intent
                    }
                    Err(_) => Intent::invalid(
                        text,
                        &command,
                        format!("/{command} expects a whole number"),
                    ),
                };
            }

            if let Some(action) = find_action(&command, TEXT_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent.prompt = Some(arg.to_string());
                return intent;
            }

            if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
                let path = parse_single_path_arg(arg);
                if path.is_empty() {
                    return Intent::invalid(text, &command, format!("/{command} requires a path"));
                }
                let mut intent = Intent::new(action, text);
                intent
                    .command_args
                    .insert("path".to_string(), Value::String(path));
                return intent;
            }

            if let Some(action) = find_action(&command, MULTI_ARG_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent.command_args.insert(
                    "ids".to_string(),
                    Value::Array(
                        split_args(&arg.replace(',', " "))
                            .into_iter()
                            .map(Value::String)
                            .collect(),
                    ),
                );
                return intent;
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            let mut intent = Intent::new("unknown", text);
            intent
                .command_args
                .insert("command".to_string(), Value::String(command));
            intent
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return intent;
        }
    }

    let mut intent = Intent::new("text", text);
    intent.prompt = Some(raw_trimmed.to_string());
    intent
}
