/*
 * This module generates the callback invocations through which results
 * travel back to the scripting side. There is no structured return channel:
 * a response is a single generated statement such as
 *
 *   files._createFileSuccess(JSON.parse('{"name":"a.txt",...}'))
 *
 * which the host evaluates inside the scripting environment. Payloads are
 * embedded as single-quoted string literals, so the text is escaped first.
 * The escaping covers backslash, single quote, newline and carriage return.
 * It does not cover the U+2028/U+2029 line and paragraph separators, which
 * a complete JS string-literal escaper would also rewrite; payloads
 * containing those code points will break the generated statement.
 */
use crate::bridge::types::HostCommand;

/*
 * Escapes text for embedding in a single-quoted script string literal.
 * Backslash is rewritten first so the later replacements cannot double up.
 */
pub fn escape_script_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

// How a result value rides inside the generated invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackPayload {
    // Callback takes no arguments.
    None,
    // A single scalar string, passed as a raw string literal.
    Text(String),
    // Serialized JSON, reconstructed on the script side via JSON.parse.
    Json(String),
}

/*
 * Builds the statement invoking `<channel>.<callback>` with the payload.
 * Callback names are the per-operation contract of the channel (e.g.
 * `_createFileSuccess`); this function does not interpret them.
 */
pub fn callback_invocation(channel: &str, callback: &str, payload: &CallbackPayload) -> String {
    match payload {
        CallbackPayload::None => format!("{channel}.{callback}()"),
        CallbackPayload::Text(text) => {
            format!("{channel}.{callback}('{}')", escape_script_literal(text))
        }
        CallbackPayload::Json(json) => {
            format!(
                "{channel}.{callback}(JSON.parse('{}'))",
                escape_script_literal(json)
            )
        }
    }
}

/// The invocation wrapped as the host command that evaluates it.
pub fn emit(channel: &str, callback: &str, payload: CallbackPayload) -> HostCommand {
    let source = callback_invocation(channel, callback, &payload);
    log::trace!("ResponseEmitter: {source}");
    HostCommand::EvaluateScript { source }
}
