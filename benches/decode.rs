use criterion::{black_box, criterion_group, criterion_main, Criterion};
use usbsniff::decoder::{payload, Decoder, Target};
use usbsniff::urb::{CaptureEvent, EventType, Timestamp};

fn bulk_event(data: &[u8], usec: i32) -> CaptureEvent<'_> {
    CaptureEvent {
        id: 0xffff_8880_1234_5600,
        event_type: EventType::Completion,
        transfer_type: 3,
        endpoint: 0x81,
        device_address: 4,
        bus: 1,
        setup: None,
        data_len: data.len() as u32,
        data,
        timestamp: Timestamp::new(1_700_000_000, usec),
    }
}

pub fn decode_record(c: &mut Criterion) {
    let data = vec![0xa5u8; 64];
    c.bench_function("decode_bulk_64", |b| {
        let mut decoder = Decoder::new(Target::new(1, 4));
        let mut usec = 0;
        b.iter(|| {
            usec = (usec + 125) % 1_000_000;
            let out = decoder.process(&bulk_event(&data, usec));
            black_box(out.map(|o| o.to_string()));
        });
    });
}

pub fn hex_max_payload(c: &mut Criterion) {
    let data = vec![0x5au8; payload::MAX_PAYLOAD_SIZE];
    c.bench_function("to_hex_4096", |b| {
        b.iter(|| {
            black_box(payload::to_hex(&data));
        });
    });
}

criterion_group!(single_benches, decode_record, hex_max_payload);
criterion_main!(single_benches);
