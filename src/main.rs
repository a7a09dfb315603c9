use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use cache_sim::Error;
use cache_sim::geometry::{GeometryParams, KIB};
use cache_sim::simulation::Simulation;
use cache_sim::trace::AddressTrace;
use clap::Parser;

/// Replays a trace of hexadecimal 32-bit addresses against a set-associative
/// cache with true LRU replacement and reports the hit rate.
#[derive(Parser, Debug)]
#[command(name = "cache-sim", version)]
struct Args {
    /// Total cache size in KiB, power of two (default 32)
    #[arg(short, long, value_name = "KIB", value_parser = power_of_two)]
    size: Option<u32>,

    /// Number of banks (ways) per set, power of two (default 8)
    #[arg(short, long, value_name = "N", value_parser = power_of_two)]
    banks: Option<u32>,

    /// Line size in bytes, power of two (default 64)
    #[arg(short, long, value_name = "BYTES", value_parser = power_of_two)]
    line_size: Option<u32>,

    /// Number of cache levels, informational only (default 1)
    #[arg(long, value_name = "N")]
    levels: Option<u32>,

    /// Print every access with its outcome
    #[arg(long)]
    trace: bool,

    /// Print the valid lines of the final cache state
    #[arg(long)]
    dump: bool,

    /// Trace file, read from stdin when omitted
    file: Option<PathBuf>,
}

/// Rejects geometry values in the units they were typed in, before any
/// conversion to bytes.
fn power_of_two(value: &str) -> Result<u32, String> {
    let value: u32 = value.parse().map_err(|e| format!("{e}"))?;
    if value.is_power_of_two() {
        Ok(value)
    } else {
        Err(format!("{value} is not a power of two"))
    }
}

impl Args {
    fn geometry_params(&self) -> GeometryParams {
        GeometryParams {
            size: self.size.map(|kib| (kib as usize).saturating_mul(KIB)),
            associativity: self.banks.map(|banks| banks as usize),
            line_size: self.line_size.map(|line_size| line_size as usize),
            levels: self.levels.map(|levels| levels as usize),
        }
    }

    fn read_trace(&self) -> Result<String, Error> {
        match &self.file {
            Some(file) => Ok(std::fs::read_to_string(file)?),
            None => {
                let mut data = String::new();
                std::io::stdin().read_to_string(&mut data)?;
                Ok(data)
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut simulation = Simulation::new(args.geometry_params())?;
    println!("{}\n", simulation.geometry());

    let file_data = args.read_trace()?;
    let trace = AddressTrace::try_from(file_data.as_str())?;
    log::info!("replaying {} addresses", trace.len());

    let stats = if args.trace {
        let stats = simulation.run_with(trace, |event| println!("{event}"));
        println!();
        stats
    } else {
        simulation.run(trace)
    };

    println!("Final Access:\n{}\n", simulation.format_last_access());
    if args.dump {
        println!("Final Cache Lines:\n{}\n", simulation.format_lines());
    }
    println!("{stats}");

    Ok(())
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn size_is_given_in_kib() {
        let args = Args::try_parse_from(["cache-sim", "-s", "64", "-b", "4", "-l", "32"]).unwrap();
        let params = args.geometry_params();

        assert_eq!(params.size, Some(64 * KIB));
        assert_eq!(params.associativity, Some(4));
        assert_eq!(params.line_size, Some(32));
        assert_eq!(params.levels, None);
    }

    #[test]
    fn rejects_non_power_of_two_as_typed() {
        let error = Args::try_parse_from(["cache-sim", "-s", "3"]).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("3 is not a power of two"));
        assert!(!message.contains("3072"));

        assert!(Args::try_parse_from(["cache-sim", "--banks", "6"]).is_err());
        assert!(Args::try_parse_from(["cache-sim", "--line-size", "0"]).is_err());
        assert!(Args::try_parse_from(["cache-sim", "-l", "sixty"]).is_err());
    }

    #[test]
    fn file_is_optional() {
        let args = Args::try_parse_from(["cache-sim", "--trace", "trace.txt"]).unwrap();
        assert!(args.trace);
        assert_eq!(args.file, Some(PathBuf::from("trace.txt")));

        let args = Args::try_parse_from(["cache-sim"]).unwrap();
        assert_eq!(args.file, None);
        assert_eq!(args.geometry_params(), GeometryParams::default());
    }
}
