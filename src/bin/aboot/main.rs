//! Binary implementing the CLI in `cli.rs`

use core::convert::TryFrom;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use log::{debug, info};

use aboot::config::Config;
use aboot::image::{Filetype, Image};
use aboot::util::to_hex_string;
use aboot::{Report, Verifier};

mod cli;
mod logger;

/// Exit status for an image whose hash does not match its signature
const MISMATCH: i32 = 1;
/// Exit status for anything that kept the image from being checked
const FAILURE: i32 = 2;

fn main() {
    let args = cli::app().get_matches();
    match try_main(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(MISMATCH),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(FAILURE);
        }
    }
}

fn read_image(filename: &str) -> anyhow::Result<Vec<u8>> {
    let image = fs::read(filename).with_context(|| format!("Failed to read image {}", filename))?;
    info!("aboot image {}, len={}", filename, image.len());
    Ok(image)
}

/// Returns false only if an image was verified and its hashes differ.
fn try_main(args: clap::ArgMatches) -> anyhow::Result<bool> {

    logger::Logger::init().map_err(|err| anyhow::anyhow!("{}", err))?;

    match args.get_count("v") {
        0 => log::set_max_level(log::LevelFilter::Warn),
        1 => log::set_max_level(log::LevelFilter::Info),
        2 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    };

    let config = match args.get_one::<String>("CONFIG") {
        Some(config_filename) => Config::try_from(config_filename.as_str())?,
        None => Config::default(),
    };
    debug!("config: {:?}", &config);
    let verifier = Verifier::from_config(&config);

    if let Some(command) = args.subcommand_matches("header") {
        let filename = command.get_one::<String>("IMAGE").unwrap();
        let file = read_image(filename)?;
        println!("aboot image {}, len={}", filename, file.len());
        let image = Image::parse(&file, config.elf_header_size)?;
        if image.filetype() == Filetype::Elf {
            println!("\nELF file format found!\n");
        }
        println!("{}\n", image.header());
        println!("SigOffset:         0x{:08x}", image.header().signature_offset());
        println!("CertOffset:        0x{:08x}", image.header().certificate_offset());
        return Ok(true);
    }

    if let Some(command) = args.subcommand_matches("dump") {
        let filename = command.get_one::<String>("IMAGE").unwrap();
        let output = Path::new(command.get_one::<String>("OUTPUT").unwrap());
        let file = read_image(filename)?;
        println!("aboot image {}, len={}", filename, file.len());
        let inspection = verifier.inspect(&file)?;

        fs::create_dir_all(output)
            .with_context(|| format!("Failed to create output directory {}", output.display()))?;

        let signature_path = output.join(&config.output.signature_filename);
        fs::write(&signature_path, &inspection.signature)?;
        println!("SigOffset:         0x{:08x}", inspection.signature_offset());
        println!("signature: {}, size: {:4}", signature_path.display(), inspection.signature.len());

        println!("Dumping all certificates...");
        for (i, certificate) in inspection.certificates.iter().enumerate() {
            let path = output.join(config.output.certificate_filename(i + 1));
            fs::write(&path, certificate.der())?;
            println!("cert {}: {}, size: {:4}", i + 1, path.display(), certificate.len);
        }
        println!("Total cert size         : {:4}", inspection.certificates_size());
        return Ok(true);
    }

    if let Some(command) = args.subcommand_matches("verify") {
        let filename = command.get_one::<String>("IMAGE").unwrap();
        let file = read_image(filename)?;
        let report = verifier.verify(&file)?;
        info!("{} certificate(s), leaf key {} bits", report.certificates.len(),
            report.certificates.first().map(|leaf| leaf.key_bits).unwrap_or_default());

        match command.get_one::<String>("FORMAT").map(String::as_str) {
            Some("json") => println!("{}", serde_json::to_string(&report)?),
            Some("json-pretty") => println!("{}", serde_json::to_string_pretty(&report)?),
            Some("yaml") => println!("{}", serde_yaml::to_string(&report)?),
            _ => {
                println!("aboot image {}, len={}", filename, file.len());
                print_report(&report);
            }
        }
        return Ok(report.matches);
    }

    Ok(true)
}

fn print_report(report: &Report) {
    let verification = &report.verification;
    if report.elf {
        println!("\nELF file format found!\n");
    }
    println!("{}\n", report.header);
    for (i, certificate) in report.certificates.iter().enumerate() {
        println!("cert {}: offset 0x{:x}, size: {:4}, RSA-{}", i + 1, certificate.offset, certificate.len, certificate.key_bits);
    }
    println!("hash algorithm: {}", verification.algorithm);
    println!("Expected: {} ({})", to_hex_string(&verification.expected), verification.expected.len());
    println!("My hash:  {} ({})", to_hex_string(&verification.computed), verification.computed.len());
    if report.matches {
        println!("Hashes match");
    } else {
        println!("Hashes don't match");
    }
}
