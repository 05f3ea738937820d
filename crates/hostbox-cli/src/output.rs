//! Terminal styling and message helpers shared by the commands.

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const RESET: &str = "\x1b[0m";

/// Prints an error and its causes to stderr.
pub fn report_error(err: &anyhow::Error) {
    eprintln!("  {RED}{BOLD}error:{RESET} {err}");
    for cause in err.chain().skip(1) {
        eprintln!("    {DIM}caused by: {cause}{RESET}");
    }
}

/// Renders an argument vector as a copy-pasteable shell command.
#[must_use]
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|a| quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@+%".contains(c));
    if safe {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
