//! Command-line interface to this crate's functionality

use clap::{self, crate_authors, crate_version, Arg, ArgAction, Command};

pub const FORMATS: [&str; 4] = ["text", "json", "json-pretty", "yaml"];

const ABOUT: &str = "
aboot inspects and verifies aboot secure-boot images.

Use -h for short descriptions and --help for more details
";

pub fn app() -> Command {
    // clap wants 'static strings, the long version is built at runtime
    lazy_static::lazy_static! {
        static ref LONG_VERSION: String = long_version(None);
    }

    let image = Arg::new("IMAGE")
        .help("aboot image, optionally wrapped in ELF")
        .required(true);

    Command::new("aboot")
        .author(crate_authors!())
        .version(crate_version!())
        .long_version(LONG_VERSION.as_str())
        .about(ABOUT)
        .subcommand_required(true)
        .arg_required_else_help(true)

        .arg(Arg::new("v")
             .short('v')
             .long("verbose")
             .action(ArgAction::Count)
             .global(true)
             .help("Sets the level of verbosity (use multiple times to increase: -v = INFO, -vv = DEBUG, -vvv = TRACE)"))

        .arg(Arg::new("CONFIG")
             .short('c')
             .long("config")
             .value_name("CONFIG")
             .global(true)
             .help("TOML configuration file"))

        .subcommand(Command::new("header")
            .version(crate_version!())
            .long_version(LONG_VERSION.as_str())
            .visible_alias("h")
            .about("print the image header")
            .arg(image.clone())
        )

        .subcommand(Command::new("dump")
            .version(crate_version!())
            .long_version(LONG_VERSION.as_str())
            .about("extract signature and certificates")
            .arg(image.clone())
            .arg(Arg::new("OUTPUT")
                 .short('o')
                 .long("output")
                 .value_name("DIR")
                 .default_value(".")
                 .help("Directory to write signature and certificates to"))
        )

        .subcommand(Command::new("verify")
            .version(crate_version!())
            .long_version(LONG_VERSION.as_str())
            .visible_alias("v")
            .about("check the image hash against its signature")
            .arg(image)
            .arg(Arg::new("FORMAT")
                 .long("format")
                 .default_value("text")
                 .value_parser(FORMATS)
                 .help("Format to output the verification report"))
        )
}

/// Return the "long" format of aboot's version string.
///
/// If a revision hash is given, then it is used. If one isn't given, then
/// the ABOOT_BUILD_GIT_HASH env var is inspected for it. If that isn't set,
/// then a revision hash is not included in the version string returned.
pub fn long_version(revision_hash: Option<&str>) -> String {
    let hash = match revision_hash.or(option_env!("ABOOT_BUILD_GIT_HASH")) {
        None => String::new(),
        Some(githash) => format!(" (rev {})", githash),
    };
    format!("{}{}", crate_version!(), hash,)
}
