#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const NUMBER_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "age",
        action: "set_age",
    },
    CommandSpec {
        command: "pick",
        action: "pick_career",
    },
    CommandSpec {
        command: "choose",
        action: "choose",
    },
];

pub(crate) const TEXT_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "dream",
    action: "dream",
}];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "draw",
        action: "attach_drawing",
    },
    CommandSpec {
        command: "export",
        action: "export",
    },
];

pub(crate) const MULTI_ARG_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "answer",
    action: "answer",
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "play",
        action: "play",
    },
    CommandSpec {
        command: "plan",
        action: "request_plan",
    },
    CommandSpec {
        command: "back",
        action: "back_to_map",
    },
    CommandSpec {
        command: "restart",
        action: "start_over",
    },
    CommandSpec {
        command: "show",
        action: "show",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/age",
    "/draw",
    "/dream",
    "/pick",
    "/choose",
    "/play",
    "/answer",
    "/plan",
    "/back",
    "/restart",
    "/show",
    "/export",
    "/help",
    "/quit",
];
