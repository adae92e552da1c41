//! moss CLI — place and route a synthesised netlist onto a GreenPAK-class
//! part and emit the configuration bitstream.
//!
//! The synthesis flow writes the netlist as JSON; moss deserialises it,
//! runs the PAR core, prints the diagnostics and reports, and (on
//! success) writes the bitstream as hex. Any error-severity diagnostic
//! makes the process exit non-zero.

#![warn(missing_docs)]

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use moss_common::Interner;
use moss_device::{Device, Part};
use moss_diagnostics::{render, DiagnosticSink, Severity};
use moss_netlist::Netlist;
use moss_par::{place_and_route, EngineConfig};

/// moss — a place-and-route toolchain for GreenPAK-class parts.
#[derive(Parser, Debug)]
#[command(name = "moss", version, about = "moss PAR toolchain")]
struct Cli {
    /// Input netlist (JSON produced by the synthesis flow).
    netlist: PathBuf,

    /// Output bitstream file (hex). Omit to skip bitstream emission.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target part number.
    #[arg(short, long, default_value = "SLG46620")]
    part: String,

    /// Random seed for the placement search (fixed default for
    /// reproducible builds).
    #[arg(long)]
    seed: Option<u64>,

    /// Placement iteration budget.
    #[arg(long)]
    iterations: Option<u32>,

    /// Suppress the utilisation and placement reports.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    process::exit(run(Cli::parse()));
}

fn run(cli: Cli) -> i32 {
    let Some(part) = Part::from_name(&cli.part) else {
        eprintln!("ERROR: unknown part \"{}\"", cli.part);
        return 1;
    };

    let text = match fs::read_to_string(&cli.netlist) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("ERROR: cannot read {}: {err}", cli.netlist.display());
            return 1;
        }
    };
    let mut netlist: Netlist = match serde_json::from_str(&text) {
        Ok(netlist) => netlist,
        Err(err) => {
            eprintln!("ERROR: cannot parse {}: {err}", cli.netlist.display());
            return 1;
        }
    };
    netlist.rebuild_indices();
    let Some(module) = netlist.top_module() else {
        eprintln!("ERROR: netlist has no module named \"{}\"", netlist.top);
        return 1;
    };

    let defaults = EngineConfig::default();
    let config = EngineConfig {
        seed: cli.seed.unwrap_or(defaults.seed),
        max_iterations: cli.iterations.unwrap_or(defaults.max_iterations),
    };

    let mut device = Device::new(part);
    let interner = Interner::new();
    let sink = DiagnosticSink::new();

    let outcome = match place_and_route(module, &mut device, &config, &interner, &sink) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("INTERNAL ERROR: {err}");
            return 2;
        }
    };

    // Errors to stderr, everything else to stdout.
    for diag in sink.take_all() {
        let line = render(&diag);
        if diag.severity == Severity::Error {
            eprint!("{line}");
        } else {
            print!("{line}");
        }
    }

    if !cli.quiet {
        print!("{}", outcome.utilization_report);
        print!("{}", outcome.placement_report);
    }

    if !outcome.success {
        eprintln!("PAR failed");
        return 1;
    }

    if let Some(output) = &cli.output {
        let image = match moss_bitstream::emit(&device) {
            Ok(image) => image,
            Err(err) => {
                eprintln!("INTERNAL ERROR: {err}");
                return 2;
            }
        };
        if let Err(err) = fs::write(output, image.to_hex()) {
            eprintln!("ERROR: cannot write {}: {err}", output.display());
            return 1;
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["moss", "design.json"]).unwrap();
        assert_eq!(cli.part, "SLG46620");
        assert!(cli.output.is_none());
        assert!(cli.seed.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn all_flags() {
        let cli = Cli::try_parse_from([
            "moss",
            "design.json",
            "--part",
            "SLG46140",
            "--seed",
            "7",
            "--iterations",
            "500",
            "--output",
            "out.hex",
            "--quiet",
        ])
        .unwrap();
        assert_eq!(cli.part, "SLG46140");
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.iterations, Some(500));
        assert_eq!(cli.output.as_deref(), Some(std::path::Path::new("out.hex")));
        assert!(cli.quiet);
    }

    #[test]
    fn missing_netlist_is_an_error() {
        assert!(Cli::try_parse_from(["moss"]).is_err());
    }

    #[test]
    fn run_rejects_unknown_part() {
        let cli = Cli::try_parse_from(["moss", "design.json", "--part", "SLG9999"]).unwrap();
        assert_eq!(run(cli), 1);
    }

    #[test]
    fn run_solves_a_netlist_file() {
        use moss_netlist::{Cell, CellType, Module, Netlist};

        let mut m = Module::new("top");
        let n = m.add_net(Some("x"));
        m.add_cell(
            Cell::new("ib", CellType::Ibuf)
                .with_loc("P2")
                .output("OUT", n),
        );
        m.add_cell(Cell::new("ob", CellType::Obuf).with_loc("P3").input("IN", n));
        let netlist = Netlist::single(m);

        let dir = tempfile::tempdir().unwrap();
        let netlist_path = dir.path().join("passthrough.json");
        let output_path = dir.path().join("passthrough.hex");
        fs::write(&netlist_path, serde_json::to_string(&netlist).unwrap()).unwrap();

        let cli = Cli::try_parse_from([
            "moss",
            netlist_path.to_str().unwrap(),
            "--output",
            output_path.to_str().unwrap(),
            "--quiet",
        ])
        .unwrap();
        assert_eq!(run(cli), 0);

        let hex = fs::read_to_string(&output_path).unwrap();
        assert!(hex.lines().count() > 0);
        assert!(hex.contains(|c: char| c.is_ascii_hexdigit() && c != '0'));
    }
}
