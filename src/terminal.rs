//! Launching a terminal emulator from the node context menu.

use std::io;
use std::process::Command;

/// Terminal emulators tried on Linux, most preferred first.
const LINUX_TERMINALS: &[&str] = &[
    "konsole",
    "gnome-terminal",
    "xfce4-terminal",
    "alacritty",
    "kitty",
    "terminator",
    "xterm",
];

/// Commands to try for the given `std::env::consts::OS` value.
pub fn candidates(os: &str) -> Vec<Vec<&'static str>> {
    match os {
        "windows" => vec![vec!["cmd.exe", "/c", "start", "cmd.exe"]],
        "macos" => vec![vec!["open", "-a", "Terminal"]],
        "linux" => LINUX_TERMINALS.iter().map(|t| vec![*t]).collect(),
        "freebsd" | "openbsd" | "netbsd" => vec![vec!["xterm"]],
        _ => Vec::new(),
    }
}

/// Runs `spawn` on each candidate until one starts.
///
/// Missing programs are skipped; any other failure stops the search.
pub fn launch_first<F>(candidates: &[Vec<&str>], mut spawn: F) -> io::Result<String>
where
    F: FnMut(&str, &[&str]) -> io::Result<()>,
{
    for argv in candidates {
        let Some((program, args)) = argv.split_first() else {
            continue;
        };
        match spawn(*program, args) {
            Ok(()) => return Ok((*program).to_string()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("{program} not installed, trying next terminal");
            }
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        "no supported terminal emulator found",
    ))
}

/// Opens a terminal window for the current platform, detached from the editor.
pub fn open_terminal() -> io::Result<()> {
    let commands = candidates(std::env::consts::OS);
    let program = launch_first(&commands, |program, args| {
        Command::new(program).args(args).spawn().map(|_| ())
    })?;
    log::info!("opened terminal {program}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_prefers_konsole_and_ends_with_xterm() {
        let list = candidates("linux");
        assert_eq!(list.first(), Some(&vec!["konsole"]));
        assert_eq!(list.last(), Some(&vec!["xterm"]));
        assert!(candidates("plan9").is_empty());
    }

    #[test]
    fn skips_missing_programs() {
        let mut tried = Vec::new();
        let launched = launch_first(&candidates("linux"), |program, _| {
            tried.push(program.to_string());
            if program == "alacritty" {
                Ok(())
            } else {
                Err(io::Error::from(io::ErrorKind::NotFound))
            }
        })
        .unwrap();

        assert_eq!(launched, "alacritty");
        assert_eq!(tried, vec!["konsole", "gnome-terminal", "xfce4-terminal", "alacritty"]);
    }

    #[test]
    fn other_errors_stop_the_search() {
        let err = launch_first(&candidates("linux"), |_, _| {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn nothing_installed_is_not_found() {
        let err = launch_first(&candidates("freebsd"), |_, _| {
            Err(io::Error::from(io::ErrorKind::NotFound))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
