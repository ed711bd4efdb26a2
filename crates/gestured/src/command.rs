//! Command-line surface: one subcommand per service operation.

use std::path::PathBuf;

/// Where a request body is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyArgs {
    pub data_root: PathBuf,
    pub input: InputSource,
    pub model: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeArgs {
    pub data_root: PathBuf,
    pub input: InputSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataArgs {
    pub data_root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Classify(ClassifyArgs),
    Merge(MergeArgs),
    Wipe(DataArgs),
    Labels(DataArgs),
}

pub const USAGE: &str = "\
usage: gestured <command> --data <root> [options]

commands:
  classify   recognize a gesture from a landmark payload
  merge      merge labeled samples into the gesture store
  wipe       reset the gesture store to empty
  labels     list known gesture labels

options:
  --data <root>    data root directory (required)
  --input <file>   read the request body from a file instead of stdin
                   (classify, merge)
  --model <path>   classifier artifact path override (classify)
";

struct FlagValues {
    data_root: PathBuf,
    input: Option<PathBuf>,
    model: Option<PathBuf>,
}

fn parse_flags<I>(
    mut it: I,
    command: &str,
    allow_input: bool,
    allow_model: bool,
) -> Result<FlagValues, String>
where
    I: Iterator<Item = String>,
{
    let mut data_root: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;
    let mut model: Option<PathBuf> = None;

    while let Some(a) = it.next() {
        match a.as_str() {
            "--data" => {
                let v = it.next().ok_or("missing value for --data")?;
                if data_root.replace(PathBuf::from(v)).is_some() {
                    return Err("multiple values provided for --data".to_string());
                }
            }
            "--input" if allow_input => {
                let v = it.next().ok_or("missing value for --input")?;
                if input.replace(PathBuf::from(v)).is_some() {
                    return Err("multiple values provided for --input".to_string());
                }
            }
            "--model" if allow_model => {
                let v = it.next().ok_or("missing value for --model")?;
                if model.replace(PathBuf::from(v)).is_some() {
                    return Err("multiple values provided for --model".to_string());
                }
            }
            _ => {
                if a.starts_with("--") {
                    return Err(format!("flag {} is not valid for {}", a, command));
                }
                return Err(format!("unexpected arg {}", a));
            }
        }
    }

    let data_root = data_root.ok_or_else(|| format!("{} requires --data <root>", command))?;
    Ok(FlagValues {
        data_root,
        input,
        model,
    })
}

/// Parse a full argument list (without the program name).
pub fn parse_command<I>(mut it: I) -> Result<Command, String>
where
    I: Iterator<Item = String>,
{
    let command = it.next().ok_or("missing command")?;
    match command.as_str() {
        "classify" => {
            let values = parse_flags(it, "classify", true, true)?;
            Ok(Command::Classify(ClassifyArgs {
                data_root: values.data_root,
                input: values.input.map_or(InputSource::Stdin, InputSource::File),
                model: values.model,
            }))
        }
        "merge" => {
            let values = parse_flags(it, "merge", true, false)?;
            Ok(Command::Merge(MergeArgs {
                data_root: values.data_root,
                input: values.input.map_or(InputSource::Stdin, InputSource::File),
            }))
        }
        "wipe" => {
            let values = parse_flags(it, "wipe", false, false)?;
            Ok(Command::Wipe(DataArgs {
                data_root: values.data_root,
            }))
        }
        "labels" => {
            let values = parse_flags(it, "labels", false, false)?;
            Ok(Command::Labels(DataArgs {
                data_root: values.data_root,
            }))
        }
        other => Err(format!("unknown command: {}", other)),
    }
}
