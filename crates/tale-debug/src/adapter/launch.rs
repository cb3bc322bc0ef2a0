//! Launch argument helpers.
//! - launch_program_path: trace or story path for the bridge
//! - launch_stop_on_entry: stop-on-entry flag

use crate::protocol::LaunchArguments;

pub(super) fn launch_program_path(args: &LaunchArguments) -> Option<String> {
    args.additional
        .get("program")
        .and_then(|value| value.as_str())
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.to_string())
}

pub(super) fn launch_stop_on_entry(args: &LaunchArguments) -> bool {
    args.additional
        .get("stopOnEntry")
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}
