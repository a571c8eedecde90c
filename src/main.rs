extern crate namecopy;

use namecopy::copy::{copy_images, CopyOptions};
use namecopy::mapping::MappingError;
use namecopy::{normalize, telemetry, NameMapping};
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use tracing::debug;

#[derive(StructOpt, Debug)]
#[structopt(name = "namecopy")]
/// Copies images with accented names to ASCII-safe filenames.
struct Opt {
    #[structopt(subcommand)]
    command: Option<Command>,

    #[structopt(
        long,
        default_value = "client/public/images/references",
        parse(from_os_str)
    )]
    /// The folder holding the images. Targets are written next to their sources.
    base_dir: PathBuf,

    #[structopt(long, parse(from_os_str))]
    /// A YAML map of source filenames to target filenames. The built-in table is used if not
    /// specified.
    mapping: Option<PathBuf>,

    #[structopt(short = "v", parse(from_occurrences))]
    /// Verbosity of log output.
    verbose: usize,

    /// Prints out actions instead of doing them.
    #[structopt(long)]
    dry_run: bool,
}

#[derive(StructOpt, Debug)]
#[structopt(rename_all = "kebab-case")]
enum Command {
    /// Print the ASCII filename for each name.
    Normalize { names: Vec<String> },

    /// Show the mapping that would be used.
    Show,
}

fn load_mapping(path: Option<&Path>) -> Result<NameMapping, MappingError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading mapping");
            NameMapping::load(path)
        }
        None => Ok(NameMapping::builtin()),
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    match opt.command {
        None => {
            let options = CopyOptions {
                dry_run: opt.dry_run,
            };
            let mapping = load_mapping(opt.mapping.as_deref())?;
            copy_images(&opt.base_dir, &mapping, options, &mut stdout)?;
        }
        Some(Command::Normalize { names }) => {
            for name in names {
                writeln!(stdout, "{}", normalize(&name))?;
            }
        }
        Some(Command::Show) => {
            let mapping = load_mapping(opt.mapping.as_deref())?;
            serde_yaml::to_writer(&mut stdout, &mapping)?;
        }
    }

    Ok(())
}

fn main() {
    let opt = Opt::from_args();

    if let Err(e) = telemetry::init(telemetry::level_for(opt.verbose)) {
        eprintln!("{}", e);
    }

    if let Err(e) = run(opt) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
