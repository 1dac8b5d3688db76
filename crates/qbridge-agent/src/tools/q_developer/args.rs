//! Translation of a [`QDeveloperRequest`] into the `q` argument vector.

use qbridge_terminal::CommandSpec;

use super::request::QDeveloperRequest;

pub const CHAT_SUBCOMMAND: &str = "chat";
pub const NO_INTERACTIVE_FLAG: &str = "--no-interactive";

/// Arguments after the program path, in the order the CLI expects.
///
/// `chat --no-interactive` always leads and the prompt is always last.
/// A prompt starting with `-` is preceded by `--` so it cannot be read as a flag.
pub fn build_arguments(req: &QDeveloperRequest) -> Vec<String> {
    let mut args = vec![CHAT_SUBCOMMAND.to_string(), NO_INTERACTIVE_FLAG.to_string()];

    if req.resume {
        args.push("--resume".to_string());
    }
    if let Some(agent) = req.agent() {
        args.push("--agent".to_string());
        args.push(agent.to_string());
    }
    if let Some(model) = req.model() {
        args.push("--model".to_string());
        args.push(model.to_string());
    }
    if req.yolo_mode {
        args.push("--trust-all-tools".to_string());
    }
    if let Some(tools) = req.trust_tools() {
        args.push("--trust-tools".to_string());
        args.push(tools.to_string());
    }
    if req.verbose {
        args.push("--verbose".to_string());
    }

    if req.prompt.starts_with('-') {
        args.push("--".to_string());
    }
    args.push(req.prompt.clone());
    args
}

pub fn build_command(program: &str, req: &QDeveloperRequest) -> CommandSpec {
    CommandSpec::new(program).args(build_arguments(req))
}
