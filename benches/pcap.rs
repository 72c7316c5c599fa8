use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use pcap_stream::*;
use std::time::Duration;

fn build_capture(num_packets: usize) -> Vec<u8> {
    let frame = [0x5au8; 1514];
    let mut writer = PcapWriter::new(Vec::new());
    writer.write_header(&PcapHeader::new()).unwrap();
    for i in 0..num_packets {
        let len = 64 + (i * 97) % (frame.len() - 64);
        writer
            .write_packet(Duration::from_micros(i as u64), &frame[..len])
            .unwrap();
    }
    writer.close().unwrap();
    writer.into_inner()
}

fn bench_read(c: &mut Criterion) {
    let bytes = build_capture(10_000);
    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("payload", |b| {
        b.iter(|| {
            let mut reader = PcapReader::new(&bytes[..]).unwrap();
            let mut buf = [0u8; 2048];
            let mut total = 0;
            while reader.next().is_ok() {
                while let Ok(n) = reader.read_payload(&mut buf) {
                    if n == 0 {
                        break;
                    }
                    total += n;
                }
            }
            total
        })
    });
    group.bench_function("skip", |b| {
        b.iter(|| {
            let mut reader = PcapReader::new(&bytes[..]).unwrap();
            let mut count = 0;
            while reader.next().is_ok() {
                count += 1;
            }
            count
        })
    });
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    c.bench_function("write 10k packets", |b| b.iter(|| build_capture(10_000)));
}

criterion_group!(benches, bench_read, bench_write);
criterion_main!(benches);
