//! Per-subsystem verb dispatch: `apx <subsystem> <verb> [args...]`.
//!
//! Package verbs are translated through the stack's package manager and
//! executed inside the container; lifecycle verbs (run, enter, start,
//! stop, export, unexport) go straight to the adapter.

use anyhow::{Result, bail};

use crate::config::Config;
use crate::error::Error;
use crate::output::Output;
use crate::runtime::{ExportOutcome, OutputMode};
use crate::subsystem::{SubSystem, find_subsystem};

pub fn run(argv: Vec<String>, config: &Config, rootful: bool) -> Result<()> {
    let Some((name, rest)) = argv.split_first() else {
        bail!("no subsystem given");
    };
    let Some((verb, args)) = rest.split_first() else {
        bail!("no command given for subsystem '{name}'\n\nUsage: apx {name} <verb> [args...]");
    };

    let runtime = super::runtime(config)?;
    let stacks = config.stacks();
    let subsystem = find_subsystem(&runtime, &stacks, name, rootful)?;

    match verb.as_str() {
        "enter" => {
            // Ctrl-C belongs to the container session, not to us.
            let _ = ctrlc::set_handler(|| {});
            subsystem.enter(&runtime, rootful)?;
            Ok(())
        }
        "run" => {
            let command = strip_separator(args);
            if command.is_empty() {
                bail!("nothing to run; usage: apx {name} run [--] <command...>");
            }
            subsystem.exec(&runtime, command, OutputMode::Passthrough, rootful)?;
            Ok(())
        }
        "start" => {
            subsystem.start(&runtime, rootful)?;
            Output::success(format!("Subsystem '{name}' started."));
            Ok(())
        }
        "stop" => {
            subsystem.stop(&runtime, rootful)?;
            Output::success(format!("Subsystem '{name}' stopped."));
            Ok(())
        }
        "export" => {
            let (app, bin) = parse_export_flags(args)?;
            report_export(subsystem.export(&runtime, app, bin, rootful)?);
            Ok(())
        }
        "unexport" => {
            let (app, bin) = parse_export_flags(args)?;
            report_export(subsystem.unexport(&runtime, app, bin, rootful)?);
            Ok(())
        }
        verb => run_pkg_verb(&subsystem, &runtime, config, verb, args, rootful),
    }
}

fn run_pkg_verb(
    subsystem: &SubSystem,
    runtime: &crate::runtime::ContainerRuntime,
    config: &Config,
    verb: &str,
    args: &[String],
    rootful: bool,
) -> Result<()> {
    let pkg_manager = config
        .pkg_managers()
        .resolve(&subsystem.stack.pkg_manager)?;
    let command = pkg_manager.synthesize(verb, args)?;
    Output::running(command.join(" "));
    subsystem.exec(runtime, &command, OutputMode::Passthrough, rootful)?;
    Ok(())
}

/// Drop a leading `--` so `apx dev run -- make -j` works.
fn strip_separator(args: &[String]) -> &[String] {
    match args.first() {
        Some(first) if first == "--" => &args[1..],
        _ => args,
    }
}

/// Parse `--app <name>` / `--bin <name>` out of the raw verb arguments.
fn parse_export_flags(args: &[String]) -> Result<(Option<String>, Option<String>)> {
    let mut app = None;
    let mut bin = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--app" => match iter.next() {
                Some(value) => app = Some(value.clone()),
                None => bail!("--app requires a value"),
            },
            "--bin" => match iter.next() {
                Some(value) => bin = Some(value.clone()),
                None => bail!("--bin requires a value"),
            },
            other => bail!("unexpected argument '{other}'; expected --app or --bin"),
        }
    }
    if app.is_none() && bin.is_none() {
        return Err(Error::AmbiguousExportTarget.into());
    }
    Ok((app, bin))
}

fn report_export(outcome: ExportOutcome) {
    match outcome {
        ExportOutcome::Completed => Output::success("Export updated."),
        ExportOutcome::Skipped(reason) => {
            Output::warning(format!("Export skipped: {reason}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn separator_is_stripped_once() {
        let args = strings(&["--", "make", "-j"]);
        assert_eq!(strip_separator(&args), &args[1..]);
        let args = strings(&["make"]);
        assert_eq!(strip_separator(&args), &args[..]);
    }

    #[test]
    fn export_flags_parse_app() {
        let (app, bin) = parse_export_flags(&strings(&["--app", "gimp"])).unwrap();
        assert_eq!(app.as_deref(), Some("gimp"));
        assert!(bin.is_none());
    }

    #[test]
    fn export_flags_require_a_target() {
        let err = parse_export_flags(&[]).unwrap_err();
        assert!(
            err.downcast_ref::<Error>()
                .is_some_and(|e| matches!(e, Error::AmbiguousExportTarget))
        );
    }

    #[test]
    fn export_flags_reject_stray_arguments() {
        assert!(parse_export_flags(&strings(&["gimp"])).is_err());
        assert!(parse_export_flags(&strings(&["--app"])).is_err());
    }
}
