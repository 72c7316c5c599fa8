use clap::Parser;
use env_logger::{Builder, Env};
use log::error;
use pcap_stream::*;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

/// Print the contents of a pcap file
#[derive(Debug, Parser)]
#[command(name = "pcapdump", version)]
struct Args {
    /// Print headers and payload of every record, not only a summary
    #[arg(short, long)]
    verbose: bool,

    /// Capture file to read
    file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter = if args.verbose { "info" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(filter)).init();

    match dump(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {}", args.file.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn dump(args: &Args) -> Result<(), Box<dyn Error>> {
    let file = BufReader::new(File::open(&args.file)?);
    let mut reader = PcapReader::new(file)?;

    let header = reader.header().clone();
    let order = reader.byte_order();
    if args.verbose {
        println!("Header");
        println!("Magic 0x{:08x} ({:?}-endian)", header.magic_number, order);
        println!("Version {}.{}", header.version_major, header.version_minor);
        println!("ThisZone {}", header.thiszone);
        println!("SigFigs {}", header.sigfigs);
        println!("SnapLen {}", header.snaplen);
        println!("LinkType {}", header.network);
    }

    let mut num_records = 0;
    let mut num_truncated = 0;
    for packet in reader.packets() {
        let (record, data) = packet?;
        num_records += 1;
        if record.is_truncated() {
            num_truncated += 1;
        }
        if args.verbose {
            println!();
            println!("Record {}", num_records);
            println!("\tTimestamp {}.{:06}", record.ts_sec, record.ts_usec);
            println!("\tCapLen {}", record.caplen);
            println!("\tLen {}", record.origlen);
            print_payload(&data);
        }
    }

    println!("{}: {} records, {} truncated", args.file.display(), num_records, num_truncated);
    Ok(())
}

fn print_payload(data: &[u8]) {
    for (i, line) in data.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{:02x}", b)).collect();
        println!("\t{:04x}  {}", i * 16, hex.join(" "));
    }
}
