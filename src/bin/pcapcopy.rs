use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info};
use pcap_stream::*;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

/// Copy a pcap file record by record
#[derive(Debug, Parser)]
#[command(name = "pcapcopy", version)]
struct Args {
    /// Print the file header and every record header
    #[arg(short, long)]
    verbose: bool,

    /// Capture file to read
    input: PathBuf,

    /// Capture file to create
    output: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter = if args.verbose { "info" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(filter)).init();

    match copy(&args) {
        Ok(count) => {
            info!("{} records copied", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{} -> {}: {}", args.input.display(), args.output.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn copy(args: &Args) -> Result<usize, Box<dyn Error>> {
    let input = BufReader::new(File::open(&args.input)?);
    let mut reader = PcapReader::new(input)?;
    if args.verbose {
        print_header(reader.header());
    }

    let output = BufWriter::new(File::create(&args.output)?);
    let mut writer = PcapWriter::new(output);
    writer.write_header(reader.header())?;

    let mut count = 0;
    loop {
        let record = match reader.next() {
            Ok(record) => record,
            Err(PcapError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if args.verbose {
            print_record(&record);
        }
        writer.write_record_header(&record)?;
        io::copy(&mut reader, &mut writer)?;
        count += 1;
    }
    writer.close()?;
    Ok(count)
}

fn print_header(header: &PcapHeader) {
    println!("Header");
    println!("Magic 0x{:08x}", header.magic_number);
    println!("VersionMajor {}", header.version_major);
    println!("VersionMinor {}", header.version_minor);
    println!("ThisZone {}", header.thiszone);
    println!("SigFigs {}", header.sigfigs);
    println!("SnapLen {}", header.snaplen);
    println!("LinkType {}", header.network);
}

fn print_record(record: &RecordHeader) {
    println!();
    println!("RecordHeader");
    println!("TsSec {}", record.ts_sec);
    println!("TsUsec {}", record.ts_usec);
    println!("CapLen {}", record.caplen);
    println!("Len {}", record.origlen);
}
